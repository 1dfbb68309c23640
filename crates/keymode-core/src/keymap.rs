// Keymode Keymap Tables
// WindowKeymap, Binding and Activation

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::chord::{parse_chord, parse_output_chord, ChordParseError, ChordSpec, OutputChord};
use crate::host::{HostCommand, HostCtx};
use crate::window::{WindowCondition, WindowInfo};

/// Callback run when a binding fires
pub type Callback = Arc<dyn Fn(&mut HostCtx<'_>) + Send + Sync>;

/// When a keymap table takes part in resolution
#[derive(Clone, Default)]
pub enum Activation {
    #[default]
    Always,
    When(Arc<dyn Fn(&WindowInfo) -> bool + Send + Sync>),
}

impl Activation {
    pub fn when<F>(predicate: F) -> Self
    where
        F: Fn(&WindowInfo) -> bool + Send + Sync + 'static,
    {
        Activation::When(Arc::new(predicate))
    }

    /// Active while the foreground window matches `condition`
    pub fn window(condition: WindowCondition) -> Self {
        Activation::when(move |window| window.matches_condition(&condition))
    }

    pub fn is_active(&self, window: &WindowInfo) -> bool {
        match self {
            Activation::Always => true,
            Activation::When(predicate) => predicate(window),
        }
    }
}

impl fmt::Debug for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activation::Always => write!(f, "Always"),
            Activation::When(_) => write!(f, "When(<predicate>)"),
        }
    }
}

/// What a chord does when it fires
#[derive(Clone)]
pub enum Binding {
    /// Inject one chord
    Chord(OutputChord),
    /// Inject several chords in order
    Sequence(SmallVec<[OutputChord; 4]>),
    /// Run a host command
    Command(HostCommand),
    Callback(Callback),
}

impl Binding {
    /// Parse an output chord binding such as `"C-S-Tab"`
    pub fn chord(exp: &str) -> Result<Self, ChordParseError> {
        parse_output_chord(exp).map(Binding::Chord)
    }

    /// Parse a sequence of output chords
    pub fn sequence(exps: &[&str]) -> Result<Self, ChordParseError> {
        exps.iter()
            .map(|exp| parse_output_chord(exp))
            .collect::<Result<SmallVec<_>, _>>()
            .map(Binding::Sequence)
    }

    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&mut HostCtx<'_>) + Send + Sync + 'static,
    {
        Binding::Callback(Arc::new(f))
    }
}

impl From<OutputChord> for Binding {
    fn from(chord: OutputChord) -> Self {
        Binding::Chord(chord)
    }
}

impl From<HostCommand> for Binding {
    fn from(command: HostCommand) -> Self {
        Binding::Command(command)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Chord(chord) => write!(f, "Chord({})", chord),
            Binding::Sequence(chords) => {
                let names: Vec<String> = chords.iter().map(|c| c.to_string()).collect();
                write!(f, "Sequence({})", names.join(", "))
            }
            Binding::Command(command) => write!(f, "Command({})", command),
            Binding::Callback(_) => write!(f, "Callback"),
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Chord(chord) => write!(f, "{}", chord),
            Binding::Sequence(chords) => {
                for (i, chord) in chords.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", chord)?;
                }
                Ok(())
            }
            Binding::Command(command) => write!(f, "<{}>", command),
            Binding::Callback(_) => write!(f, "<callback>"),
        }
    }
}

/// A named keymap table with its activation predicate
///
/// Insertion order is kept so listings show bindings as they were defined.
/// Binding the same chord twice replaces the earlier entry.
#[derive(Debug, Clone)]
pub struct WindowKeymap {
    name: String,
    activation: Activation,
    mappings: IndexMap<ChordSpec, Binding>,
}

impl WindowKeymap {
    /// Create a table that is always active
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_activation(name, Activation::Always)
    }

    pub fn with_activation(name: impl Into<String>, activation: Activation) -> Self {
        Self {
            name: name.into(),
            activation,
            mappings: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn activation(&self) -> &Activation {
        &self.activation
    }

    pub fn is_active(&self, window: &WindowInfo) -> bool {
        self.activation.is_active(window)
    }

    pub fn insert(&mut self, chord: ChordSpec, binding: Binding) {
        self.mappings.insert(chord, binding);
    }

    /// Bind a chord spec string
    pub fn bind(&mut self, spec: &str, binding: impl Into<Binding>) -> Result<(), ChordParseError> {
        let chord = parse_chord(spec)?;
        self.insert(chord, binding.into());
        Ok(())
    }

    /// Bind a chord spec string to an output chord string
    pub fn remap(&mut self, spec: &str, output: &str) -> Result<(), ChordParseError> {
        let chord = parse_chord(spec)?;
        self.insert(chord, Binding::chord(output)?);
        Ok(())
    }

    pub fn get(&self, chord: &ChordSpec) -> Option<&Binding> {
        self.mappings.get(chord)
    }

    pub fn contains(&self, chord: &ChordSpec) -> bool {
        self.mappings.contains_key(chord)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ChordSpec, &Binding)> {
        self.mappings.iter()
    }
}
