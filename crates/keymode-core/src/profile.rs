// Keymode Default Profile
// The keymap tables of the four modes plus the global and Emacs-like tables

use std::sync::Arc;
use std::time::Duration;

use crate::chord::{standard_prefixes, ChordParseError};
use crate::clipboard::{default_listers, ClipboardHistoryConfig, ClipboardLister};
use crate::engine::{BindingResolver, EngineError, KeymapId};
use crate::host::{HostCommand, MonitorEdge};
use crate::keymap::{Activation, Binding, WindowKeymap};
use crate::macro_typer::{MacroError, PacedTyper};
use crate::mode::{Mode, ModeContext};
use crate::modifier::Modifier;
use crate::movement::{movement_bindings, MovementController, PadLayout};
use crate::window::{ConditionParseError, WindowCondition};
use crate::Key;

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("bad chord in profile: {0}")]
    Chord(#[from] ChordParseError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("bad macro: {0}")]
    Macro(#[from] MacroError),

    #[error("bad window condition: {0}")]
    Condition(#[from] ConditionParseError),
}

/// Home-row keys and what they stand for in limited and cursor mode
const NAVIGATION: [(&str, &str); 10] = [
    ("i", "Up"),
    ("j", "Left"),
    ("k", "Down"),
    ("l", "Right"),
    ("u", "PageUp"),
    ("h", "Home"),
    ("o", "PageDown"),
    ("Semicolon", "End"),
    ("n", "Enter"),
    ("m", "Tab"),
];

/// Number row keys standing for F1..F12
const FUNCTION_ROW: [&str; 12] = [
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "0", "Minus", "Plus",
];

/// Shortcuts shared by limited and cursor mode
const TYPING_SHORTCUTS: [(&str, &str); 5] = [
    ("A-z", "A-Tab"),
    ("A-S-z", "A-S-Tab"),
    ("RC-j", "Enter"),
    ("RC-h", "Back"),
    ("RC-d", "Delete"),
];

/// Knobs of the default profile
#[derive(Debug, Clone)]
pub struct ProfileConfig {
    pub user1: Key,
    pub user2: Key,
    /// Title regex for the Emacs-like table
    pub emacs_title_pattern: Option<String>,
    /// Window condition such as `exe_name == "notepad.exe"`; wins over the
    /// title pattern. With neither set the Emacs-like table is left out
    pub emacs_condition: Option<String>,
    pub macro_text: String,
    pub macro_delay: Duration,
    pub pad_layout: PadLayout,
    pub clipboard: ClipboardHistoryConfig,
    pub phrases: Vec<(String, String)>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            user1: Key::NON_CONVERT,
            user2: Key::SLASH,
            emacs_title_pattern: None,
            emacs_condition: None,
            macro_text: "abcde".to_string(),
            macro_delay: Duration::from_millis(500),
            pad_layout: PadLayout::default(),
            clipboard: ClipboardHistoryConfig::default(),
            phrases: Vec::new(),
        }
    }
}

#[cfg(feature = "settings")]
impl From<&crate::settings::Settings> for ProfileConfig {
    fn from(settings: &crate::settings::Settings) -> Self {
        Self {
            user1: settings.user1_key(),
            user2: settings.user2_key(),
            emacs_title_pattern: settings.emacs_title_pattern().map(str::to_string),
            emacs_condition: settings.emacs_condition().map(str::to_string),
            macro_text: settings.macro_text().to_string(),
            macro_delay: settings.macro_delay(),
            pad_layout: PadLayout::default(),
            clipboard: settings.clipboard().clone(),
            phrases: settings.phrases().to_vec(),
        }
    }
}

impl ProfileConfig {
    /// Condition activating the Emacs-like table, if one is configured
    pub fn emacs_window(&self) -> Result<Option<WindowCondition>, ConditionParseError> {
        match (&self.emacs_condition, &self.emacs_title_pattern) {
            (Some(condition), _) => WindowCondition::parse(condition).map(Some),
            (None, Some(pattern)) => WindowCondition::title(pattern).map(Some),
            (None, None) => Ok(None),
        }
    }
}

/// Ids of the installed tables and the clipboard extensions
#[derive(Debug, Clone)]
pub struct Profile {
    pub global: KeymapId,
    pub limited: KeymapId,
    pub cursor: KeymapId,
    pub celeste: KeymapId,
    pub test: KeymapId,
    pub emacs: Option<KeymapId>,
    pub clipboard: ClipboardHistoryConfig,
    pub listers: Vec<ClipboardLister>,
}

/// Callback that switches mode, optionally sets the IME, and recomputes
fn switch_mode(mode: &ModeContext, target: Mode, ime: Option<bool>) -> Binding {
    let mode = mode.clone();
    Binding::callback(move |ctx| {
        mode.set(target);
        ctx.update_keymap();
        if let Some(open) = ime {
            ctx.ime().set_ime_status(open);
        }
    })
}

/// Table active in every mode: mode switches and the one-shot slash
pub fn global_keymap(mode: &ModeContext) -> Result<WindowKeymap, ChordParseError> {
    let mut keymap = WindowKeymap::new("global");

    keymap.bind("U1-c", switch_mode(mode, Mode::Cursor, None))?;
    keymap.bind("U1-q", switch_mode(mode, Mode::Celeste, None))?;
    keymap.bind("U1-t", switch_mode(mode, Mode::Test, None))?;
    // muhenkan + henkan / hiragana
    keymap.bind("U1-(28)", switch_mode(mode, Mode::Limited, Some(false)))?;
    keymap.bind("U1-(242)", switch_mode(mode, Mode::Limited, Some(true)))?;
    // shift + katakana / henkan
    keymap.bind("S-(241)", switch_mode(mode, Mode::Limited, Some(true)))?;
    keymap.bind("S-(28)", switch_mode(mode, Mode::Limited, Some(false)))?;

    // Slash doubles as User2, a lone tap still types it
    for any in standard_prefixes() {
        keymap.remap(&format!("{}O-Slash", any), &format!("{}Slash", any))?;
    }

    Ok(keymap)
}

fn typing_shortcuts(keymap: &mut WindowKeymap) -> Result<(), ChordParseError> {
    for (input, output) in TYPING_SHORTCUTS {
        keymap.remap(input, output)?;
    }
    Ok(())
}

/// Everyday typing: navigation only under User1
pub fn limited_keymap(mode: &ModeContext) -> Result<WindowKeymap, ChordParseError> {
    let mut keymap = WindowKeymap::with_activation("limited", mode.predicate(Mode::Limited));
    typing_shortcuts(&mut keymap)?;

    for any in standard_prefixes() {
        for (key, target) in NAVIGATION {
            keymap.remap(&format!("{}U1-{}", any, key), &format!("{}{}", any, target))?;
        }
        for (i, key) in FUNCTION_ROW.iter().enumerate() {
            keymap.remap(&format!("{}U1-{}", any, key), &format!("{}F{}", any, i + 1))?;
        }
    }

    Ok(keymap)
}

/// Vim-like cursor mode: navigation on the bare home row
pub fn cursor_keymap(mode: &ModeContext) -> Result<WindowKeymap, ChordParseError> {
    let mut keymap = WindowKeymap::with_activation("cursor", mode.predicate(Mode::Cursor));
    typing_shortcuts(&mut keymap)?;

    keymap.remap("x", "Delete")?;
    keymap.remap("S-x", "Back")?;
    keymap.remap("w", "C-Tab")?;
    keymap.remap("q", "C-S-Tab")?;
    keymap.remap("O-f", "LButton")?;
    keymap.remap("O-g", "RButton")?;

    for any in standard_prefixes() {
        for (key, target) in NAVIGATION {
            keymap.remap(&format!("{}{}", any, key), &format!("{}{}", any, target))?;
        }
    }

    Ok(keymap)
}

/// Game mode: nothing remapped so nothing gets mistyped
pub fn celeste_keymap(mode: &ModeContext) -> WindowKeymap {
    WindowKeymap::with_activation("celeste", mode.predicate(Mode::Celeste))
}

/// Experimental bindings
pub fn test_keymap(
    mode: &ModeContext,
    config: &ProfileConfig,
    movement: Option<Arc<MovementController>>,
) -> Result<WindowKeymap, ProfileError> {
    let mut keymap = WindowKeymap::with_activation("test", mode.predicate(Mode::Test));

    let typer = PacedTyper::from_text(&config.macro_text, config.macro_delay)?;
    keymap.bind(
        "U1-q",
        Binding::callback(move |ctx| {
            typer.type_deferred(ctx.scheduler().as_ref(), Arc::clone(ctx.input()));
        }),
    )?;

    for (modifiers, step) in [("U1-", 10), ("U1-S-", 1)] {
        for (key, dx, dy) in [("Left", -1, 0), ("Right", 1, 0), ("Up", 0, -1), ("Down", 0, 1)] {
            let (dx, dy) = (dx * step, dy * step);
            keymap.bind(
                &format!("{}{}", modifiers, key),
                Binding::callback(move |ctx| ctx.mover().move_window(dx, dy)),
            )?;
        }
    }

    for (key, edge) in [
        ("Left", MonitorEdge::Left),
        ("Right", MonitorEdge::Right),
        ("Up", MonitorEdge::Top),
        ("Down", MonitorEdge::Bottom),
    ] {
        keymap.bind(
            &format!("U1-C-{}", key),
            Binding::callback(move |ctx| ctx.mover().move_to_monitor_edge(edge)),
        )?;
    }

    keymap.bind("C-S-Z", HostCommand::ClipboardList)?;
    keymap.bind("C-S-X", HostCommand::ClipboardRotate)?;
    keymap.bind("C-S-A-X", HostCommand::ClipboardRemove)?;

    keymap.bind("U1-0", HostCommand::RecordToggle)?;
    keymap.bind("U1-1", HostCommand::RecordStart)?;
    keymap.bind("U1-2", HostCommand::RecordStop)?;
    keymap.bind("U1-3", HostCommand::RecordPlay)?;
    keymap.bind("U1-4", HostCommand::RecordClear)?;

    if let Some(controller) = movement {
        movement_bindings(&mut keymap, &config.pad_layout, controller)?;
    }

    Ok(keymap)
}

/// Emacs-ish editing for windows matching `condition`
pub fn emacs_keymap(condition: WindowCondition) -> Result<WindowKeymap, ProfileError> {
    let mut keymap = WindowKeymap::with_activation("emacs", Activation::window(condition));

    for (input, output) in [
        ("C-P", "Up"),
        ("C-N", "Down"),
        ("C-F", "Right"),
        ("C-B", "Left"),
        ("C-A", "Home"),
        ("C-E", "End"),
        ("A-F", "C-Right"),
        ("A-B", "C-Left"),
        ("C-V", "PageDown"),
        ("A-V", "PageUp"),
        ("A-Comma", "C-Home"),
        ("A-Period", "C-End"),
        ("C-S", "C-F"),
        ("A-X", "C-G"),
        ("C-W", "C-X"),
        ("A-W", "C-C"),
        ("C-Y", "C-V"),
        ("C-D", "Delete"),
        ("C-H", "Back"),
    ] {
        keymap.remap(input, output)?;
    }
    // Kill to end of line
    keymap.bind("C-K", Binding::sequence(&["S-End", "C-X"])?)?;

    Ok(keymap)
}

/// Register the whole profile and compute the initially active tables.
///
/// Tables are registered global first, so mode tables override it and the
/// Emacs-like table overrides everything.
pub fn install<R: BindingResolver>(
    resolver: &mut R,
    mode: &ModeContext,
    config: &ProfileConfig,
    movement: Option<Arc<MovementController>>,
) -> Result<Profile, ProfileError> {
    resolver.define_modifier(config.user1, Modifier::User1)?;
    resolver.define_modifier(config.user2, Modifier::User2)?;

    let global = resolver.define_window_keymap(global_keymap(mode)?);
    let limited = resolver.define_window_keymap(limited_keymap(mode)?);
    let cursor = resolver.define_window_keymap(cursor_keymap(mode)?);
    let celeste = resolver.define_window_keymap(celeste_keymap(mode));
    let test = resolver.define_window_keymap(test_keymap(mode, config, movement)?);
    let emacs = match config.emacs_window()? {
        Some(condition) => Some(resolver.define_window_keymap(emacs_keymap(condition)?)),
        None => None,
    };

    resolver.update_keymap();
    log::info!("profile installed in {} mode", mode.current());

    Ok(Profile {
        global,
        limited,
        cursor,
        celeste,
        test,
        emacs,
        clipboard: config.clipboard.clone(),
        listers: default_listers(&config.phrases),
    })
}
