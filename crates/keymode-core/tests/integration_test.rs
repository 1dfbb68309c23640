// Keymode Integration Tests
//
// These tests install the default profile into the reference engine and
// drive it with raw key events through a recording host.
//
// Run with: cargo test --test integration_test

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use keymode_core::chord::OutputChord;
use keymode_core::engine::EngineError;
use keymode_core::host::{CommandRunner, ImeControl, InputSink, Scheduler, Task, WindowMover};
use keymode_core::window::{ConditionParseError, FixedWindow};
use keymode_core::{
    install, BindingResolver, Dispatch, Host, HostCommand, Key, KeymapEngine, Mode, ModeContext,
    MonitorEdge, Profile, ProfileConfig, ProfileError, WindowInfo,
};

// =========================================================================
// Test Helpers
// =========================================================================

/// Host that records every request; deferred calls run at once
#[derive(Default)]
struct Recorder {
    log: Mutex<Vec<String>>,
}

impl Recorder {
    fn push(&self, entry: String) {
        self.log.lock().push(entry);
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.log.lock())
    }
}

impl InputSink for Recorder {
    fn send_chord(&self, chord: &OutputChord) {
        self.push(format!("send {}", chord));
    }
}

impl ImeControl for Recorder {
    fn set_ime_status(&self, open: bool) {
        self.push(format!("ime {}", open));
    }
}

impl Scheduler for Recorder {
    fn delayed_call(&self, task: Task, _delay: Duration) {
        task();
    }
}

impl WindowMover for Recorder {
    fn move_window(&self, dx: i32, dy: i32) {
        self.push(format!("move {} {}", dx, dy));
    }
    fn move_to_monitor_edge(&self, edge: MonitorEdge) {
        self.push(format!("edge {}", edge));
    }
}

impl CommandRunner for Recorder {
    fn run_command(&self, command: HostCommand) {
        self.push(format!("command {}", command));
    }
}

struct Rig {
    engine: KeymapEngine,
    rec: Arc<Recorder>,
    window: FixedWindow,
    mode: ModeContext,
    profile: Profile,
}

impl Rig {
    fn new(config: ProfileConfig) -> Self {
        let rec = Arc::new(Recorder::default());
        let window = FixedWindow::new();
        let host = Host {
            input: rec.clone(),
            ime: rec.clone(),
            scheduler: rec.clone(),
            windows: Arc::new(window.clone()),
            mover: rec.clone(),
            commands: rec.clone(),
        };
        let mode = ModeContext::new();
        let mut engine = KeymapEngine::new(host);
        let profile = install(&mut engine, &mode, &config, None).unwrap();
        Self {
            engine,
            rec,
            window,
            mode,
            profile,
        }
    }

    fn quick_macro() -> ProfileConfig {
        ProfileConfig {
            macro_delay: Duration::ZERO,
            ..ProfileConfig::default()
        }
    }

    /// Type a chord and return what the host was asked to do
    fn press(&mut self, spec: &str) -> Vec<String> {
        self.engine.type_chord(spec).unwrap();
        self.rec.take()
    }

    fn active_names(&self) -> Vec<String> {
        self.engine
            .active_keymaps()
            .iter()
            .filter_map(|id| self.engine.keymap(*id))
            .map(|k| k.name().to_string())
            .collect()
    }
}

// =========================================================================
// Installation
// =========================================================================

#[test]
fn test_install_registers_tables_in_order() {
    let rig = Rig::new(ProfileConfig::default());
    let p = &rig.profile;
    assert!(p.global < p.limited && p.limited < p.cursor);
    assert!(p.cursor < p.celeste && p.celeste < p.test);
    assert!(p.emacs.is_none());
    assert_eq!(rig.engine.keymaps().count(), 5);
    assert_eq!(rig.active_names(), vec!["global", "limited"]);
    assert_eq!(rig.engine.user_modifier_key(keymode_core::Modifier::User1), Some(Key::NON_CONVERT));
    assert_eq!(rig.engine.user_modifier_key(keymode_core::Modifier::User2), Some(Key::SLASH));
}

#[test]
fn test_install_rejects_physical_modifier_as_user_key() {
    let rec = Arc::new(Recorder::default());
    let host = Host {
        input: rec.clone(),
        ime: rec.clone(),
        scheduler: rec.clone(),
        windows: Arc::new(FixedWindow::new()),
        mover: rec.clone(),
        commands: rec.clone(),
    };
    let mut engine = KeymapEngine::new(host);
    let config = ProfileConfig {
        user1: Key::LSHIFT,
        ..ProfileConfig::default()
    };
    let err = install(&mut engine, &ModeContext::new(), &config, None).unwrap_err();
    assert!(matches!(
        err,
        ProfileError::Engine(EngineError::ModifierKey(Key::LSHIFT))
    ));
}

#[test]
fn test_install_builds_clipboard_listers() {
    let config = ProfileConfig {
        phrases: vec![("Address".to_string(), "San Francisco".to_string())],
        ..ProfileConfig::default()
    };
    let rig = Rig::new(config);
    assert_eq!(rig.profile.listers.len(), 3);
    assert_eq!(rig.profile.listers[0].items.len(), 1);
    assert_eq!(rig.profile.clipboard.max_items, 1000);
}

// =========================================================================
// Limited mode
// =========================================================================

#[test]
fn test_limited_navigation_under_user1() {
    let mut rig = Rig::new(ProfileConfig::default());
    assert_eq!(rig.press("U1-j"), vec!["send Left"]);
    assert_eq!(rig.press("U1-Semicolon"), vec!["send End"]);
    assert_eq!(rig.press("C-S-U1-i"), vec!["send C-S-Up"]);
    assert_eq!(rig.press("U1-n"), vec!["send Enter"]);
    assert_eq!(rig.press("A-U1-1"), vec!["send A-F1"]);
    assert_eq!(rig.press("U1-Plus"), vec!["send F12"]);
}

#[test]
fn test_limited_leaves_plain_keys_alone() {
    let mut rig = Rig::new(ProfileConfig::default());
    let outcome = rig.engine.type_chord("j").unwrap();
    assert_eq!(outcome, vec![Dispatch::PassThrough, Dispatch::PassThrough]);
    assert!(rig.rec.take().is_empty());
}

#[test]
fn test_limited_shortcuts() {
    let mut rig = Rig::new(ProfileConfig::default());
    assert_eq!(rig.press("A-z"), vec!["send A-Tab"]);
    assert_eq!(rig.press("A-S-z"), vec!["send A-S-Tab"]);
    assert_eq!(rig.press("RC-h"), vec!["send Back"]);
    // Left ctrl is not the right ctrl
    assert!(rig.press("LC-h").is_empty());
}

// =========================================================================
// Mode switching
// =========================================================================

#[test]
fn test_switch_to_cursor_and_back() {
    let mut rig = Rig::new(ProfileConfig::default());

    assert!(rig.press("U1-c").is_empty());
    assert_eq!(rig.mode.current(), Mode::Cursor);
    assert_eq!(rig.active_names(), vec!["global", "cursor"]);

    assert_eq!(rig.press("j"), vec!["send Left"]);
    assert_eq!(rig.press("S-x"), vec!["send Back"]);
    assert_eq!(rig.press("w"), vec!["send C-Tab"]);
    // Limited's user-modifier navigation is gone
    assert!(rig.press("U1-j").is_empty());

    assert_eq!(rig.press("U1-(28)"), vec!["ime false"]);
    assert_eq!(rig.mode.current(), Mode::Limited);
    assert!(rig.press("j").is_empty());
}

#[test]
fn test_switch_to_limited_sets_ime() {
    let mut rig = Rig::new(ProfileConfig::default());
    rig.press("U1-t");
    assert_eq!(rig.mode.current(), Mode::Test);

    assert_eq!(rig.press("U1-(242)"), vec!["ime true"]);
    assert_eq!(rig.mode.current(), Mode::Limited);

    rig.press("U1-q");
    assert_eq!(rig.mode.current(), Mode::Celeste);
    assert_eq!(rig.press("S-(241)"), vec!["ime true"]);
    assert_eq!(rig.mode.current(), Mode::Limited);

    assert_eq!(rig.press("S-(28)"), vec!["ime false"]);
    assert_eq!(rig.mode.current(), Mode::Limited);
}

#[test]
fn test_mode_flag_without_update_keeps_old_tables() {
    let mut rig = Rig::new(ProfileConfig::default());

    rig.mode.set_cursor();
    assert!(rig.press("x").is_empty());
    assert_eq!(rig.press("U1-j"), vec!["send Left"]);

    rig.engine.update_keymap();
    assert_eq!(rig.press("x"), vec!["send Delete"]);
}

#[test]
fn test_celeste_passes_everything_through() {
    let mut rig = Rig::new(ProfileConfig::default());
    rig.press("U1-q");
    assert_eq!(rig.active_names(), vec!["global", "celeste"]);

    for spec in ["j", "x", "A-z", "RC-j", "S-w"] {
        assert!(rig.press(spec).is_empty(), "{} was remapped", spec);
    }

    // The global table still answers
    rig.press("U1-c");
    assert_eq!(rig.mode.current(), Mode::Cursor);
}

// =========================================================================
// One-shot slash
// =========================================================================

#[test]
fn test_slash_alone_types_slash() {
    let mut rig = Rig::new(ProfileConfig::default());
    let outcome = rig.engine.type_chord("Slash").unwrap();
    assert_eq!(outcome, vec![Dispatch::Suppressed, Dispatch::Fired]);
    assert_eq!(rig.rec.take(), vec!["send Slash"]);

    assert_eq!(rig.press("C-S-Slash"), vec!["send C-S-Slash"]);
}

#[test]
fn test_slash_as_modifier_does_not_type_slash() {
    let mut rig = Rig::new(ProfileConfig::default());
    // Nothing is bound to U2-x, so x passes and no slash is typed
    let outcome = rig.engine.type_chord("U2-x").unwrap();
    assert_eq!(
        outcome,
        vec![
            Dispatch::Suppressed,
            Dispatch::PassThrough,
            Dispatch::PassThrough,
            Dispatch::Suppressed
        ]
    );
    assert!(rig.rec.take().is_empty());
}

// =========================================================================
// Test mode
// =========================================================================

#[test]
fn test_test_mode_window_moves() {
    let mut rig = Rig::new(ProfileConfig::default());
    rig.press("U1-t");

    assert_eq!(rig.press("U1-Left"), vec!["move -10 0"]);
    assert_eq!(rig.press("U1-Down"), vec!["move 0 10"]);
    assert_eq!(rig.press("U1-S-Up"), vec!["move 0 -1"]);
    assert_eq!(rig.press("U1-S-Right"), vec!["move 1 0"]);
    assert_eq!(rig.press("U1-C-Left"), vec!["edge left"]);
    assert_eq!(rig.press("U1-C-Up"), vec!["edge top"]);
    assert_eq!(rig.press("U1-C-Right"), vec!["edge right"]);
    assert_eq!(rig.press("U1-C-Down"), vec!["edge bottom"]);
}

#[test]
fn test_test_mode_host_commands() {
    let mut rig = Rig::new(ProfileConfig::default());
    rig.press("U1-t");

    assert_eq!(rig.press("C-S-z"), vec!["command clipboard_list"]);
    assert_eq!(rig.press("C-S-x"), vec!["command clipboard_rotate"]);
    assert_eq!(rig.press("C-S-A-x"), vec!["command clipboard_remove"]);
    assert_eq!(rig.press("U1-0"), vec!["command record_toggle"]);
    assert_eq!(rig.press("U1-4"), vec!["command record_clear"]);
}

#[test]
fn test_test_mode_macro_overrides_global_switch() {
    let mut rig = Rig::new(Rig::quick_macro());
    rig.press("U1-t");

    assert_eq!(
        rig.press("U1-q"),
        vec!["send A", "send B", "send C", "send D", "send E"]
    );
    assert_eq!(rig.mode.current(), Mode::Test);
}

// =========================================================================
// Emacs-like table
// =========================================================================

#[test]
fn test_emacs_table_follows_window_title() {
    let config = ProfileConfig {
        emacs_title_pattern: Some("(?i)notepad".to_string()),
        ..ProfileConfig::default()
    };
    let mut rig = Rig::new(config);
    assert!(rig.profile.emacs.is_some());
    assert!(rig.press("C-p").is_empty());

    rig.window.set(WindowInfo::titled("Untitled - Notepad"));
    rig.engine.update_keymap();
    assert_eq!(rig.active_names(), vec!["global", "limited", "emacs"]);
    assert_eq!(rig.press("C-p"), vec!["send Up"]);
    assert_eq!(rig.press("A-Period"), vec!["send C-End"]);
    assert_eq!(rig.press("C-k"), vec!["send S-End", "send C-X"]);
    // Mode tables still apply underneath
    assert_eq!(rig.press("U1-l"), vec!["send Right"]);

    rig.window.set(WindowInfo::titled("Terminal"));
    rig.engine.update_keymap();
    assert!(rig.press("C-p").is_empty());
}

#[test]
fn test_emacs_table_follows_exe_condition() {
    let config = ProfileConfig {
        emacs_title_pattern: Some("(?i)notepad".to_string()),
        emacs_condition: Some("exe_name == 'emacs.exe'".to_string()),
        ..ProfileConfig::default()
    };
    let mut rig = Rig::new(config);

    // The condition replaces the title pattern
    rig.window.set(WindowInfo::titled("Untitled - Notepad"));
    rig.engine.update_keymap();
    assert!(rig.press("C-p").is_empty());

    rig.window.set(WindowInfo::with_details(
        Some("Emacs.EXE".to_string()),
        None,
        Some("*scratch*".to_string()),
    ));
    rig.engine.update_keymap();
    assert_eq!(rig.active_names(), vec!["global", "limited", "emacs"]);
    assert_eq!(rig.press("C-n"), vec!["send Down"]);
}

#[test]
fn test_bad_emacs_pattern_fails_install() {
    let rec = Arc::new(Recorder::default());
    let host = Host {
        input: rec.clone(),
        ime: rec.clone(),
        scheduler: rec.clone(),
        windows: Arc::new(FixedWindow::new()),
        mover: rec.clone(),
        commands: rec.clone(),
    };
    let mut engine = KeymapEngine::new(host);
    let config = ProfileConfig {
        emacs_title_pattern: Some("[".to_string()),
        ..ProfileConfig::default()
    };
    let err = install(&mut engine, &ModeContext::new(), &config, None).unwrap_err();
    assert!(matches!(err, ProfileError::Condition(_)));

    let config = ProfileConfig {
        emacs_condition: Some("pid == '1'".to_string()),
        ..ProfileConfig::default()
    };
    let err = install(&mut engine, &ModeContext::new(), &config, None).unwrap_err();
    assert!(matches!(
        err,
        ProfileError::Condition(ConditionParseError::InvalidField(_))
    ));
}
