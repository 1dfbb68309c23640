// Keymode Chord Specs
// Parses chord strings like "D-U1-A-L", "S-(28)" or "C-S-O-Slash"

use std::fmt;
use std::str::FromStr;

use crate::modifier::{Modifier, ModifierSet};
use crate::Key;

/// Which key edge a binding reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Edge {
    /// No marker: fires on key-down, the matching key-up is swallowed
    #[default]
    Press,
    /// `D-`: fires on key-down only
    Down,
    /// `U-`: fires on key-up only
    Up,
}

/// The input side of a binding: edge, one-shot marker, modifiers and key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChordSpec {
    pub edge: Edge,
    /// `O-`: fires on release when no other key was pressed while held
    pub one_shot: bool,
    pub modifiers: ModifierSet,
    pub key: Key,
}

impl ChordSpec {
    pub fn new(modifiers: ModifierSet, key: Key) -> Self {
        Self {
            edge: Edge::Press,
            one_shot: false,
            modifiers,
            key,
        }
    }

    pub fn with_edge(mut self, edge: Edge) -> Self {
        self.edge = edge;
        self
    }

    pub fn one_shot(mut self) -> Self {
        self.one_shot = true;
        self
    }
}

impl FromStr for ChordSpec {
    type Err = ChordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_chord(s)
    }
}

impl fmt::Display for ChordSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.edge {
            Edge::Press => {}
            Edge::Down => write!(f, "D-")?,
            Edge::Up => write!(f, "U-")?,
        }
        if self.one_shot {
            write!(f, "O-")?;
        }
        write!(f, "{}{}", self.modifiers, self.key)
    }
}

/// The output side of a binding: a modifier-qualified key to inject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputChord {
    pub modifiers: ModifierSet,
    pub key: Key,
}

impl OutputChord {
    pub fn new(modifiers: ModifierSet, key: Key) -> Self {
        Self { modifiers, key }
    }

    pub fn key(key: Key) -> Self {
        Self::new(ModifierSet::EMPTY, key)
    }
}

impl FromStr for OutputChord {
    type Err = ChordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_output_chord(s)
    }
}

impl fmt::Display for OutputChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.modifiers, self.key)
    }
}

/// Errors that can occur during chord parsing
#[derive(Debug, Clone, PartialEq)]
pub enum ChordParseError {
    /// Empty input string
    EmptyInput,
    /// Input ends with hyphen (e.g., "C-")
    TrailingHyphen,
    /// Key name not recognized
    UnknownKey(String),
    /// Modifier alias not recognized
    UnknownModifier(String),
    /// Raw code in parentheses is not a number in 0..=255
    InvalidRawCode(String),
    /// More than one edge marker, or the same marker twice
    ConflictingEdge(String),
    /// Edge or one-shot marker on an output chord
    EdgeInOutput(String),
}

impl fmt::Display for ChordParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChordParseError::EmptyInput => write!(f, "chord string cannot be empty"),
            ChordParseError::TrailingHyphen => write!(f, "chord string cannot end with hyphen"),
            ChordParseError::UnknownKey(name) => write!(f, "unknown key name: '{}'", name),
            ChordParseError::UnknownModifier(name) => write!(f, "unknown modifier: '{}'", name),
            ChordParseError::InvalidRawCode(code) => write!(f, "invalid raw key code: '{}'", code),
            ChordParseError::ConflictingEdge(chord) => {
                write!(f, "conflicting edge markers in '{}'", chord)
            }
            ChordParseError::EdgeInOutput(chord) => {
                write!(f, "edge markers are not allowed in output chord '{}'", chord)
            }
        }
    }
}

impl std::error::Error for ChordParseError {}

/// Parse a chord spec like `"D-U1-A-L"` into edge, modifiers and key
///
/// Prefix tokens are edge markers (`D`, `U`, `O`) or modifier aliases and may
/// come in any order; the last token is always the key.
///
/// # Examples
/// ```
/// use keymode_core::chord::{parse_chord, Edge};
/// use keymode_core::Key;
/// let chord = parse_chord("D-U1-A-L").unwrap();
/// assert_eq!(chord.edge, Edge::Down);
/// assert_eq!(chord.modifiers.len(), 2);
/// assert_eq!(chord.key, Key::letter('l').unwrap());
/// ```
pub fn parse_chord(exp: &str) -> Result<ChordSpec, ChordParseError> {
    let (prefix, key) = split_chord(exp)?;

    let mut chord = ChordSpec::new(ModifierSet::new(), key);
    let mut edge_seen = false;

    for token in prefix {
        match token.to_ascii_uppercase().as_str() {
            "D" | "U" => {
                if edge_seen {
                    return Err(ChordParseError::ConflictingEdge(exp.trim().to_string()));
                }
                edge_seen = true;
                chord.edge = if token.eq_ignore_ascii_case("D") {
                    Edge::Down
                } else {
                    Edge::Up
                };
            }
            "O" => {
                if chord.one_shot {
                    return Err(ChordParseError::ConflictingEdge(exp.trim().to_string()));
                }
                chord.one_shot = true;
            }
            _ => {
                let modifier = Modifier::from_alias(token)
                    .ok_or_else(|| ChordParseError::UnknownModifier(token.to_string()))?;
                // Duplicates collapse
                chord.modifiers.insert(modifier);
            }
        }
    }

    Ok(chord)
}

/// Parse an output chord like `"C-S-Tab"`; edge markers are rejected
pub fn parse_output_chord(exp: &str) -> Result<OutputChord, ChordParseError> {
    let (prefix, key) = split_chord(exp)?;

    let mut modifiers = ModifierSet::new();
    for token in prefix {
        if matches!(token.to_ascii_uppercase().as_str(), "D" | "U" | "O") {
            return Err(ChordParseError::EdgeInOutput(exp.trim().to_string()));
        }
        let modifier = Modifier::from_alias(token)
            .ok_or_else(|| ChordParseError::UnknownModifier(token.to_string()))?;
        modifiers.insert(modifier);
    }

    Ok(OutputChord::new(modifiers, key))
}

fn split_chord(exp: &str) -> Result<(Vec<&str>, Key), ChordParseError> {
    let trimmed = exp.trim();
    if trimmed.is_empty() {
        return Err(ChordParseError::EmptyInput);
    }
    if trimmed.ends_with('-') {
        return Err(ChordParseError::TrailingHyphen);
    }

    let mut parts: Vec<&str> = trimmed.split('-').map(str::trim).collect();
    // split on a non-empty string always yields at least one part
    let key_str = parts.pop().unwrap_or_default();
    let key = parse_key(key_str)?;

    if let Some(empty) = parts.iter().find(|p| p.is_empty()) {
        return Err(ChordParseError::UnknownModifier((*empty).to_string()));
    }

    Ok((parts, key))
}

/// Parse a key name or a raw `(NN)` code
pub fn parse_key(token: &str) -> Result<Key, ChordParseError> {
    if let Some(inner) = token.strip_prefix('(') {
        let digits = inner
            .strip_suffix(')')
            .ok_or_else(|| ChordParseError::InvalidRawCode(token.to_string()))?;
        return digits
            .trim()
            .parse::<u8>()
            .map(Key::from)
            .map_err(|_| ChordParseError::InvalidRawCode(token.to_string()));
    }

    crate::key::key_from_name(token).ok_or_else(|| ChordParseError::UnknownKey(token.to_string()))
}

/// Enumerate every combination of `modifiers` as chord prefixes.
///
/// The first modifier toggles fastest, and each prefix lists its modifiers
/// from last to first, so `[Shift, Ctrl, Alt, Win]` yields the familiar
/// `"", "S-", "C-", "C-S-", "A-", "A-S-", ... "W-A-C-S-"` sequence.
pub fn modifier_prefixes(modifiers: &[Modifier]) -> Vec<String> {
    let count = modifiers.len();
    let mut prefixes = Vec::with_capacity(1 << count);

    for mask in 0..(1usize << count) {
        let mut prefix = String::new();
        for (i, modifier) in modifiers.iter().enumerate().rev() {
            if mask & (1 << i) != 0 {
                prefix.push_str(modifier.primary_alias());
                prefix.push('-');
            }
        }
        prefixes.push(prefix);
    }

    prefixes
}

/// The sixteen standard-modifier prefixes used for "any modifier" bindings
pub fn standard_prefixes() -> Vec<String> {
    modifier_prefixes(&[Modifier::Shift, Modifier::Ctrl, Modifier::Alt, Modifier::Win])
}
