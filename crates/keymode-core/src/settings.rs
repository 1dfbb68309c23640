// Keymode Settings Module
// User-configurable settings loaded from TOML

#![cfg(feature = "settings")]

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::chord::parse_key;
use crate::clipboard::ClipboardHistoryConfig;
use crate::macro_typer::PacedTyper;
use crate::mode::Mode;
use crate::modifier::Modifier;
use crate::movement::MovementConfig;
use crate::window::WindowCondition;
use crate::Key;

/// Settings for keymode
///
/// Loaded from a TOML file (default: ~/.config/keymode/settings.toml).
/// Every section and key is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Mode selected at startup
    initial_mode: Mode,

    /// Key acting as User1 (muhenkan by default)
    user1: Key,

    /// Key acting as User2
    user2: Key,

    movement: MovementConfig,

    /// Bind the movement pad in test mode
    movement_enabled: bool,

    clipboard: ClipboardHistoryConfig,

    /// Fixed phrases as (label, text)
    phrases: Vec<(String, String)>,

    /// Title regex activating the Emacs-like table
    emacs_title_pattern: Option<String>,

    /// Window condition activating the Emacs-like table
    emacs_condition: Option<String>,

    macro_text: String,
    macro_delay: Duration,

    /// Path to the settings file (for reload)
    source_path: Option<PathBuf>,
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid setting value: {0}")]
    InvalidValue(String),
}

/// TOML representation for deserializing settings
#[derive(Debug, Clone, serde::Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SettingsToml {
    #[serde(default)]
    mode: Option<ModeSettings>,

    #[serde(default)]
    modifiers: Option<ModifierSettings>,

    #[serde(default)]
    movement: Option<MovementSettings>,

    #[serde(default)]
    clipboard: Option<ClipboardSettings>,

    #[serde(default)]
    emacs: Option<EmacsSettings>,

    #[serde(default, rename = "macro")]
    macro_: Option<MacroSettings>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct ModeSettings {
    #[serde(default)]
    initial: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct ModifierSettings {
    #[serde(default)]
    user1: Option<String>,
    #[serde(default)]
    user2: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct MovementSettings {
    #[serde(default)]
    enabled: Option<bool>,
    #[serde(default)]
    walk_speed: Option<i32>,
    #[serde(default)]
    dash_speed: Option<i32>,
    #[serde(default)]
    sneak_speed: Option<i32>,
    #[serde(default)]
    tick_interval_ms: Option<f64>,
    #[serde(default)]
    idle_timeout_ticks: Option<u32>,
    #[serde(default)]
    verbose: Option<bool>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct ClipboardSettings {
    #[serde(flatten)]
    history: ClipboardHistoryConfig,
    #[serde(default)]
    phrases: Vec<PhraseSettings>,
}

#[derive(Debug, Clone, serde::Deserialize)]
struct PhraseSettings {
    label: String,
    text: String,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct EmacsSettings {
    #[serde(default)]
    title_pattern: Option<String>,
    #[serde(default)]
    condition: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize, Default)]
struct MacroSettings {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    delay_ms: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl Settings {
    /// Create settings with every default
    pub fn new() -> Self {
        Self {
            initial_mode: Mode::Limited,
            user1: Key::NON_CONVERT,
            user2: Key::SLASH,
            movement: MovementConfig::default(),
            movement_enabled: true,
            clipboard: ClipboardHistoryConfig::default(),
            phrases: default_phrases(),
            emacs_title_pattern: None,
            emacs_condition: None,
            macro_text: "abcde".to_string(),
            macro_delay: Duration::from_millis(500),
            source_path: None,
        }
    }

    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(&path)?;
        let mut settings = Self::from_toml(&content)?;
        settings.source_path = Some(path.as_ref().to_path_buf());
        Ok(settings)
    }

    /// Load settings from TOML string
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let toml_settings: SettingsToml =
            toml::from_str(content).map_err(|e| SettingsError::TomlParse(e.to_string()))?;

        let mut settings = Self::new();

        if let Some(mode) = toml_settings.mode {
            if let Some(initial) = mode.initial {
                settings.initial_mode = Mode::from_str(initial.trim()).map_err(|_| {
                    SettingsError::InvalidValue(format!("Unknown mode '{}'", initial))
                })?;
            }
        }

        if let Some(modifiers) = toml_settings.modifiers {
            if let Some(user1) = modifiers.user1 {
                settings.user1 = parse_modifier_key("user1", &user1)?;
            }
            if let Some(user2) = modifiers.user2 {
                settings.user2 = parse_modifier_key("user2", &user2)?;
            }
            if settings.user1 == settings.user2 {
                return Err(SettingsError::InvalidValue(format!(
                    "user1 and user2 are both {}",
                    settings.user1
                )));
            }
        }

        if let Some(movement) = toml_settings.movement {
            settings.apply_movement(movement)?;
        }

        if let Some(clipboard) = toml_settings.clipboard {
            settings.clipboard = clipboard.history;
            if !clipboard.phrases.is_empty() {
                settings.phrases = clipboard
                    .phrases
                    .into_iter()
                    .map(|p| (p.label, p.text))
                    .collect();
            }
        }

        if let Some(emacs) = toml_settings.emacs {
            if let Some(pattern) = emacs.title_pattern {
                WindowCondition::title(&pattern).map_err(|e| {
                    SettingsError::InvalidValue(format!("emacs.title_pattern: {}", e))
                })?;
                settings.emacs_title_pattern = Some(pattern);
            }
            if let Some(condition) = emacs.condition {
                if settings.emacs_title_pattern.is_some() {
                    return Err(SettingsError::InvalidValue(
                        "emacs.condition and emacs.title_pattern are exclusive".to_string(),
                    ));
                }
                WindowCondition::parse(&condition).map_err(|e| {
                    SettingsError::InvalidValue(format!("emacs.condition: {}", e))
                })?;
                settings.emacs_condition = Some(condition);
            }
        }

        if let Some(macro_) = toml_settings.macro_ {
            if let Some(text) = macro_.text {
                PacedTyper::from_text(&text, Duration::ZERO)
                    .map_err(|e| SettingsError::InvalidValue(format!("macro.text: {}", e)))?;
                settings.macro_text = text;
            }
            if let Some(delay) = macro_.delay_ms {
                settings.macro_delay = Duration::from_millis(delay);
            }
        }

        Ok(settings)
    }

    fn apply_movement(&mut self, movement: MovementSettings) -> Result<(), SettingsError> {
        let config = &mut self.movement;
        if let Some(enabled) = movement.enabled {
            self.movement_enabled = enabled;
        }
        for (name, value, slot) in [
            ("walk_speed", movement.walk_speed, &mut config.walk_speed),
            ("dash_speed", movement.dash_speed, &mut config.dash_speed),
            ("sneak_speed", movement.sneak_speed, &mut config.sneak_speed),
        ] {
            if let Some(speed) = value {
                if speed < 0 {
                    return Err(SettingsError::InvalidValue(format!(
                        "movement.{} must not be negative",
                        name
                    )));
                }
                *slot = speed;
            }
        }
        if let Some(ms) = movement.tick_interval_ms {
            if !(ms.is_finite() && ms > 0.0) {
                return Err(SettingsError::InvalidValue(
                    "movement.tick_interval_ms must be positive".to_string(),
                ));
            }
            config.tick_interval = Duration::from_nanos((ms * 1_000_000.0).round() as u64);
        }
        if let Some(ticks) = movement.idle_timeout_ticks {
            if ticks == 0 {
                return Err(SettingsError::InvalidValue(
                    "movement.idle_timeout_ticks must be at least 1".to_string(),
                ));
            }
            config.idle_timeout_ticks = ticks;
        }
        if let Some(verbose) = movement.verbose {
            config.verbose = verbose;
        }
        Ok(())
    }

    /// Get the default settings path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("keymode").join("settings.toml"))
    }

    /// Load from default location (~/.config/keymode/settings.toml)
    pub fn load_default() -> Result<Self, SettingsError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::from_file(path);
            }
        }
        // Return default settings if file doesn't exist
        Ok(Self::new())
    }

    /// Reload settings from the original file
    pub fn reload(&mut self) -> Result<(), SettingsError> {
        if let Some(ref path) = self.source_path {
            let new_settings = Self::from_file(path)?;
            *self = new_settings;
            Ok(())
        } else {
            Err(SettingsError::InvalidValue("No source path set".to_string()))
        }
    }

    pub fn initial_mode(&self) -> Mode {
        self.initial_mode
    }

    pub fn user1_key(&self) -> Key {
        self.user1
    }

    pub fn user2_key(&self) -> Key {
        self.user2
    }

    pub fn movement(&self) -> &MovementConfig {
        &self.movement
    }

    pub fn movement_enabled(&self) -> bool {
        self.movement_enabled
    }

    pub fn clipboard(&self) -> &ClipboardHistoryConfig {
        &self.clipboard
    }

    pub fn phrases(&self) -> &[(String, String)] {
        &self.phrases
    }

    pub fn emacs_title_pattern(&self) -> Option<&str> {
        self.emacs_title_pattern.as_deref()
    }

    pub fn emacs_condition(&self) -> Option<&str> {
        self.emacs_condition.as_deref()
    }

    pub fn macro_text(&self) -> &str {
        &self.macro_text
    }

    pub fn macro_delay(&self) -> Duration {
        self.macro_delay
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }
}

/// A user modifier key; physical modifiers cannot be reassigned
fn parse_modifier_key(name: &str, value: &str) -> Result<Key, SettingsError> {
    let key = parse_key(value.trim())
        .map_err(|e| SettingsError::InvalidValue(format!("modifiers.{}: {}", name, e)))?;
    if Modifier::from_key(key).is_some() {
        return Err(SettingsError::InvalidValue(format!(
            "modifiers.{}: {} is already a modifier",
            name, key
        )));
    }
    Ok(key)
}

fn default_phrases() -> Vec<(String, String)> {
    [
        ("name@server.net", "name@server.net"),
        ("Address", "San Francisco, CA 94128"),
        ("Phone number", "03-4567-8901"),
    ]
    .iter()
    .map(|(label, text)| (label.to_string(), text.to_string()))
    .collect()
}

/// Create default settings content for a new installation
pub fn default_settings_content() -> &'static str {
    r#"# Keymode Settings
# Place this file at: ~/.config/keymode/settings.toml

[mode]
# Mode at startup: "limited", "cursor", "celeste" or "test"
initial = "limited"

[modifiers]
# Keys acting as user modifiers; key names or raw codes like "(29)"
user1 = "(29)"
user2 = "Slash"

[movement]
# Pointer movement pad (test mode only)
enabled = true
walk_speed = 8
dash_speed = 24
sneak_speed = 2
tick_interval_ms = 16.667
idle_timeout_ticks = 30
verbose = false

[clipboard]
enable_hook = true
max_items = 1000
quota = 10485760
quote_mark = "> "

# [[clipboard.phrases]]
# label = "Address"
# text = "San Francisco, CA 94128"

[emacs]
# Regex on the window title enabling the Emacs-like keymap
# title_pattern = "(?i)notepad"
# Or a window condition instead of the title pattern:
# exe_name == "...", class_name == "..." or title =~ "..."
# condition = "exe_name == 'notepad.exe'"

[macro]
text = "abcde"
delay_ms = 500
"#
}
