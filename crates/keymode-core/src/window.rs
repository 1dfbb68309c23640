// Keymode Window Context
//
// Foreground window description, window conditions for conditional keymaps,
// and the provider trait a host implements to report the foreground window.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use regex::Regex;

/// Error type for window context operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WindowError {
    #[error("No foreground window")]
    NoForeground,
}

/// Minimal identification of the foreground window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowInfo {
    /// Executable name (e.g., "notepad.exe")
    pub exe_name: Option<String>,

    /// Window class name (e.g., "Edit")
    pub class_name: Option<String>,

    /// Window title (e.g., "*scratch* - GNU Emacs")
    pub title: Option<String>,
}

impl WindowInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_details(
        exe_name: Option<String>,
        class_name: Option<String>,
        title: Option<String>,
    ) -> Self {
        Self {
            exe_name,
            class_name,
            title,
        }
    }

    /// Window known only by its title
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn matches_condition(&self, condition: &WindowCondition) -> bool {
        match condition {
            WindowCondition::ExeEquals(exe) => self
                .exe_name
                .as_ref()
                .map_or(false, |e| e.eq_ignore_ascii_case(exe)),
            WindowCondition::ClassEquals(class) => {
                self.class_name.as_ref().map_or(false, |c| c == class)
            }
            WindowCondition::TitleMatches(pattern) => self
                .title
                .as_ref()
                .map_or(false, |t| pattern.is_match(t)),
        }
    }
}

/// Condition for matching windows
///
/// Textual forms:
/// - `exe_name == "notepad.exe"` - exact match, ASCII case-insensitive
/// - `class_name == "Edit"` - exact match
/// - `title =~ "Emacs"` - regular expression search on the title
#[derive(Debug, Clone)]
pub enum WindowCondition {
    ExeEquals(String),
    ClassEquals(String),
    TitleMatches(Regex),
}

impl PartialEq for WindowCondition {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (WindowCondition::ExeEquals(a), WindowCondition::ExeEquals(b)) => a == b,
            (WindowCondition::ClassEquals(a), WindowCondition::ClassEquals(b)) => a == b,
            (WindowCondition::TitleMatches(a), WindowCondition::TitleMatches(b)) => {
                a.as_str() == b.as_str()
            }
            _ => false,
        }
    }
}

/// Error parsing a window condition string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionParseError {
    Empty,
    /// Missing operator (== or =~)
    MissingOperator,
    InvalidField(String),
    /// Operator not supported for the field
    InvalidOperator(String),
    UnquotedValue(String),
    InvalidPattern(String),
}

impl fmt::Display for ConditionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionParseError::Empty => write!(f, "Empty condition string"),
            ConditionParseError::MissingOperator => write!(f, "Missing operator (== or =~)"),
            ConditionParseError::InvalidField(field) => write!(f, "Invalid field: {}", field),
            ConditionParseError::InvalidOperator(op) => write!(f, "Invalid operator: {}", op),
            ConditionParseError::UnquotedValue(val) => write!(f, "Value must be quoted: {}", val),
            ConditionParseError::InvalidPattern(msg) => write!(f, "Invalid pattern: {}", msg),
        }
    }
}

impl std::error::Error for ConditionParseError {}

impl WindowCondition {
    /// Condition matching titles against a regular expression
    pub fn title(pattern: &str) -> Result<Self, ConditionParseError> {
        Regex::new(pattern)
            .map(WindowCondition::TitleMatches)
            .map_err(|e| ConditionParseError::InvalidPattern(e.to_string()))
    }

    /// Parse a condition string into a WindowCondition
    ///
    /// # Examples
    /// ```
    /// use keymode_core::window::{WindowCondition, WindowInfo};
    ///
    /// let condition = WindowCondition::parse("title =~ 'Emacs'").unwrap();
    /// let info = WindowInfo::titled("*scratch* - GNU Emacs");
    /// assert!(info.matches_condition(&condition));
    /// ```
    pub fn parse(condition: &str) -> Result<Self, ConditionParseError> {
        let trimmed = condition.trim();

        if trimmed.is_empty() {
            return Err(ConditionParseError::Empty);
        }

        let (field, op, value) = if let Some(pos) = trimmed.find("==") {
            (trimmed[..pos].trim(), "==", trimmed[pos + 2..].trim())
        } else if let Some(pos) = trimmed.find("=~") {
            (trimmed[..pos].trim(), "=~", trimmed[pos + 2..].trim())
        } else {
            return Err(ConditionParseError::MissingOperator);
        };

        if !matches!(field, "exe_name" | "class_name" | "title") {
            return Err(ConditionParseError::InvalidField(field.to_string()));
        }

        let quoted = value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')));
        if !quoted {
            return Err(ConditionParseError::UnquotedValue(value.to_string()));
        }
        let value = &value[1..value.len() - 1];

        match (field, op) {
            ("exe_name", "==") => Ok(WindowCondition::ExeEquals(value.to_string())),
            ("class_name", "==") => Ok(WindowCondition::ClassEquals(value.to_string())),
            ("title", "=~") => WindowCondition::title(value),
            (_, op) => Err(ConditionParseError::InvalidOperator(op.to_string())),
        }
    }
}

/// Trait for foreground window providers
///
/// Implemented by the host; the keymap engine consults it whenever
/// activation predicates are re-evaluated.
pub trait WindowProvider: Send + Sync {
    /// Get the current foreground window
    fn foreground_window(&self) -> Result<WindowInfo, WindowError>;
}

/// Provider that reports whatever window it was last told about.
///
/// Useful for replaying events without a window system.
#[derive(Debug, Clone, Default)]
pub struct FixedWindow {
    window: Arc<RwLock<Option<WindowInfo>>>,
}

impl FixedWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, window: WindowInfo) {
        *self.window.write() = Some(window);
    }

    pub fn clear(&self) {
        *self.window.write() = None;
    }
}

impl WindowProvider for FixedWindow {
    fn foreground_window(&self) -> Result<WindowInfo, WindowError> {
        self.window.read().clone().ok_or(WindowError::NoForeground)
    }
}
