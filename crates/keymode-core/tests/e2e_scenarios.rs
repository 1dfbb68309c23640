// Keymode End-to-End Test Scenarios
//
// These tests simulate complete user workflows: settings file to profile,
// mode switches, and the movement pad driving a virtual pointer.
// They need no real input hook.
//
// Run with: cargo test --test e2e_scenarios

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use keymode_core::chord::OutputChord;
use keymode_core::clipboard::{self, ListerItem};
use keymode_core::host::{
    CommandRunner, ImeControl, InputSink, Scheduler, Task, ThreadScheduler, WindowMover,
};
use keymode_core::movement::{Direction, Gait, Pacer, Point, VirtualCursor};
use keymode_core::window::FixedWindow;
use keymode_core::{
    install, Host, HostCommand, Key, KeyEvent, KeymapEngine, Mode, ModeContext, MonitorEdge,
    MovementConfig, MovementController, MovementState, ProfileConfig, Settings,
};

// =========================================================================
// Test Helpers
// =========================================================================

#[derive(Default)]
struct Recorder {
    log: Mutex<Vec<String>>,
}

impl Recorder {
    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.log.lock())
    }
}

impl InputSink for Recorder {
    fn send_chord(&self, chord: &OutputChord) {
        self.log.lock().push(format!("send {}", chord));
    }
}

impl ImeControl for Recorder {
    fn set_ime_status(&self, open: bool) {
        self.log.lock().push(format!("ime {}", open));
    }
}

impl WindowMover for Recorder {
    fn move_window(&self, dx: i32, dy: i32) {
        self.log.lock().push(format!("move {} {}", dx, dy));
    }
    fn move_to_monitor_edge(&self, edge: MonitorEdge) {
        self.log.lock().push(format!("edge {}", edge));
    }
}

impl CommandRunner for Recorder {
    fn run_command(&self, command: HostCommand) {
        self.log.lock().push(format!("command {}", command));
    }
}

/// Signals every finished tick and waits for permission to continue
struct GatedPacer {
    ticked: Sender<()>,
    gate: Receiver<()>,
}

impl Pacer for GatedPacer {
    fn pause(&mut self, _interval: Duration) {
        let _ = self.ticked.send(());
        let _ = self.gate.recv();
    }
}

fn host(rec: &Arc<Recorder>, scheduler: Arc<dyn Scheduler>) -> Host {
    Host {
        input: rec.clone(),
        ime: rec.clone(),
        scheduler,
        windows: Arc::new(FixedWindow::new()),
        mover: rec.clone(),
        commands: rec.clone(),
    }
}

/// Runs deferred work at once
struct Inline;

impl Scheduler for Inline {
    fn delayed_call(&self, task: Task, _delay: Duration) {
        task();
    }
}

fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        thread::sleep(Duration::from_millis(2));
    }
    panic!("timed out waiting for {}", what);
}

// =========================================================================
// Scenario: movement pad in test mode
// =========================================================================

#[test]
fn test_scenario_walk_then_dash_with_movement_pad() {
    let rec = Arc::new(Recorder::default());
    let cursor = VirtualCursor::new(Point::new(100, 100));
    let (ticked_tx, ticked) = mpsc::channel();
    let (gate, gate_rx) = mpsc::channel();
    let pacer = GatedPacer {
        ticked: ticked_tx,
        gate: gate_rx,
    };
    let controller = Arc::new(
        MovementController::spawn_with_pacer(MovementConfig::default(), cursor.clone(), pacer)
            .unwrap(),
    );

    let mode = ModeContext::new();
    let mut engine = KeymapEngine::new(host(&rec, Arc::new(Inline)));
    install(
        &mut engine,
        &mode,
        &ProfileConfig::default(),
        Some(Arc::clone(&controller)),
    )
    .unwrap();
    wait_until("worker to park", || controller.is_parked());

    // Limited mode sends A-Right; the pad is only bound in test mode
    engine.type_chord("D-U1-A-l").unwrap();
    assert_eq!(controller.state(), MovementState::Normal);
    assert_eq!(rec.take(), vec!["send A-Right"]);
    engine.type_chord("U-U1-A-l").unwrap();
    assert!(rec.take().is_empty());

    engine.type_chord("U1-t").unwrap();
    assert_eq!(mode.current(), Mode::Test);

    // Hold l: walk right one tick
    engine.type_chord("D-U1-A-l").unwrap();
    assert_eq!(
        controller.state(),
        MovementState::moving(Gait::Walk, Direction::Right)
    );
    ticked.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(cursor_position(&cursor), Point::new(108, 100));

    // Add i with shift: dash up-right
    engine.type_chord("D-U1-A-S-i").unwrap();
    assert_eq!(
        controller.state(),
        MovementState::moving(Gait::Dash, Direction::UpRight)
    );
    gate.send(()).unwrap();
    ticked.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(cursor_position(&cursor), Point::new(132, 76));

    // Release both keys: the pointer stops
    engine.type_chord("U-U1-A-S-i").unwrap();
    engine.type_chord("U-U1-A-l").unwrap();
    assert_eq!(controller.state(), MovementState::Normal);
    gate.send(()).unwrap();
    wait_until("worker to park", || controller.is_parked());
    assert_eq!(cursor_position(&cursor), Point::new(132, 76));

    // Nothing was injected along the way
    assert!(rec.take().is_empty());

    drop(gate);
    controller.shutdown();
    assert!(controller.is_finished());
}

fn cursor_position(cursor: &VirtualCursor) -> Point {
    use keymode_core::movement::CursorDriver;
    cursor.position()
}

#[test]
fn test_scenario_sneak_stays_bound_after_modifier_release() {
    let rec = Arc::new(Recorder::default());
    let (ticked_tx, _ticked) = mpsc::channel();
    let (gate, gate_rx) = mpsc::channel();
    let controller = Arc::new(
        MovementController::spawn_with_pacer(
            MovementConfig::default(),
            VirtualCursor::default(),
            GatedPacer {
                ticked: ticked_tx,
                gate: gate_rx,
            },
        )
        .unwrap(),
    );

    let mode = ModeContext::with_mode(Mode::Test);
    let mut engine = KeymapEngine::new(host(&rec, Arc::new(Inline)));
    install(
        &mut engine,
        &mode,
        &ProfileConfig::default(),
        Some(Arc::clone(&controller)),
    )
    .unwrap();

    engine.type_chord("D-U1-A-C-k").unwrap();
    assert_eq!(
        controller.state(),
        MovementState::moving(Gait::Sneak, Direction::Down)
    );

    // The modifiers are already up when k is released; the release still
    // matches the chord it was pressed with
    engine.dispatch(KeyEvent::up(Key::letter('k').unwrap()));
    assert_eq!(controller.state(), MovementState::Normal);

    drop(gate);
    controller.shutdown();
}

// =========================================================================
// Scenario: settings file drives the profile
// =========================================================================

#[test]
fn test_scenario_settings_to_profile() {
    let settings = Settings::from_toml(
        r#"
        [mode]
        initial = "cursor"

        [modifiers]
        user1 = "Apps"

        [emacs]
        title_pattern = "Notepad"

        [macro]
        text = "hi"
        delay_ms = 0

        [[clipboard.phrases]]
        label = "Greeting"
        text = "Hello"
        "#,
    )
    .unwrap();

    let rec = Arc::new(Recorder::default());
    let mode = ModeContext::with_mode(settings.initial_mode());
    let mut engine = KeymapEngine::new(host(&rec, Arc::new(Inline)));
    let profile = install(&mut engine, &mode, &ProfileConfig::from(&settings), None).unwrap();

    assert!(profile.emacs.is_some());
    assert_eq!(profile.listers[0].items, vec![ListerItem::phrase("Greeting", "Hello")]);

    // Cursor mode from the start, user1 on the menu key
    engine.type_chord("j").unwrap();
    assert_eq!(rec.take(), vec!["send Left"]);
    engine.type_chord("U1-t").unwrap();
    assert_eq!(mode.current(), Mode::Test);
    assert_eq!(
        engine.user_modifier_key(keymode_core::Modifier::User1),
        Some(Key(0x5D))
    );

    engine.type_chord("U1-q").unwrap();
    assert_eq!(rec.take(), vec!["send H", "send I"]);
}

#[test]
fn test_scenario_default_settings_file_round_trip() {
    let settings = Settings::from_toml(keymode_core::settings::default_settings_content()).unwrap();
    assert_eq!(settings, Settings::new());
    assert_eq!(settings.initial_mode(), Mode::Limited);
    assert_eq!(settings.user1_key(), Key::NON_CONVERT);
    assert_eq!(settings.user2_key(), Key::SLASH);
    assert_eq!(settings.movement(), &MovementConfig::default());
}

// =========================================================================
// Scenario: deferred macro on a real thread
// =========================================================================

#[test]
fn test_scenario_deferred_macro_returns_before_typing() {
    let rec = Arc::new(Recorder::default());
    let mode = ModeContext::with_mode(Mode::Test);
    let mut engine = KeymapEngine::new(host(&rec, Arc::new(ThreadScheduler)));
    let config = ProfileConfig {
        macro_text: "abc".to_string(),
        macro_delay: Duration::from_millis(1),
        ..ProfileConfig::default()
    };
    install(&mut engine, &mode, &config, None).unwrap();

    engine.type_chord("U1-q").unwrap();
    let mut typed = Vec::new();
    wait_until("macro to finish", || {
        typed.extend(rec.take());
        typed.len() == 3
    });
    assert_eq!(typed, vec!["send A", "send B", "send C"]);
}

// =========================================================================
// Scenario: clipboard extensions
// =========================================================================

#[test]
fn test_scenario_clipboard_others_list() {
    let rec = Arc::new(Recorder::default());
    let mut engine = KeymapEngine::new(host(&rec, Arc::new(Inline)));
    let profile = install(&mut engine, &ModeContext::new(), &ProfileConfig::default(), None).unwrap();

    let others = &profile.listers[2];
    let labels: Vec<String> = others.items.iter().map(|i| i.label()).collect();
    assert_eq!(
        labels,
        vec![
            "Quote clipboard",
            "Indent clipboard",
            "Unindent clipboard",
            "",
            "To Half-Width",
            "To Full-Width",
            "",
            "Save clipboard to file",
            "",
            "Edit config",
            "Reload config",
        ]
    );
    assert_eq!(
        others.items.last(),
        Some(&ListerItem::Command(HostCommand::ReloadConfig))
    );

    let now = clipboard::now();
    let quoted = others.items[0].text("line one\nline two", &profile.clipboard.quote_mark, &now);
    assert_eq!(quoted.as_deref(), Some("> line one\n> line two"));
    let indented = others.items[1].text("a\n\nb", "> ", &now);
    assert_eq!(indented.as_deref(), Some("    a\n\n    b"));
    let quoted = others.items[0].text("mac\rline", "> ", &now);
    assert_eq!(quoted.as_deref(), Some("> mac\r> line"));
}
