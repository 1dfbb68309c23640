// Keymode Host Capabilities
// Traits through which bindings reach the host (injection, IME, timers, windows)

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use strum_macros::{Display, EnumString};

use crate::chord::OutputChord;
use crate::window::WindowProvider;

/// Injects synthetic input
pub trait InputSink: Send + Sync {
    /// Press and release a chord, with its modifiers held around the key
    fn send_chord(&self, chord: &OutputChord);
}

/// Input method editor control
pub trait ImeControl: Send + Sync {
    /// Open (`true`) or close the IME
    fn set_ime_status(&self, open: bool);
}

/// A unit of deferred work
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs work outside the hook context
pub trait Scheduler: Send + Sync {
    fn delayed_call(&self, task: Task, delay: Duration);
}

/// Monitor edge targets for [`WindowMover::move_to_monitor_edge`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MonitorEdge {
    Left,
    Top,
    Right,
    Bottom,
}


/// Moves the foreground window
pub trait WindowMover: Send + Sync {
    fn move_window(&self, dx: i32, dy: i32);

    fn move_to_monitor_edge(&self, edge: MonitorEdge);
}

/// Named host commands a binding can trigger
///
/// Clipboard history, macro recording and config editing live entirely in
/// the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum HostCommand {
    ClipboardList,
    ClipboardRotate,
    ClipboardRemove,
    RecordToggle,
    RecordStart,
    RecordStop,
    RecordPlay,
    RecordClear,
    EditConfig,
    ReloadConfig,
}

pub trait CommandRunner: Send + Sync {
    fn run_command(&self, command: HostCommand);
}

/// The full set of host capabilities
#[derive(Clone)]
pub struct Host {
    pub input: Arc<dyn InputSink>,
    pub ime: Arc<dyn ImeControl>,
    pub scheduler: Arc<dyn Scheduler>,
    pub windows: Arc<dyn WindowProvider>,
    pub mover: Arc<dyn WindowMover>,
    pub commands: Arc<dyn CommandRunner>,
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host").finish_non_exhaustive()
    }
}

/// What a callback binding gets to work with.
///
/// `update_keymap` only records the request; the engine recomputes the
/// active tables after the callback returns.
pub struct HostCtx<'a> {
    host: &'a Host,
    update_requested: bool,
}

impl<'a> HostCtx<'a> {
    pub fn new(host: &'a Host) -> Self {
        Self {
            host,
            update_requested: false,
        }
    }

    pub fn host(&self) -> &Host {
        self.host
    }

    pub fn input(&self) -> &Arc<dyn InputSink> {
        &self.host.input
    }

    pub fn ime(&self) -> &Arc<dyn ImeControl> {
        &self.host.ime
    }

    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.host.scheduler
    }

    pub fn mover(&self) -> &Arc<dyn WindowMover> {
        &self.host.mover
    }

    pub fn commands(&self) -> &Arc<dyn CommandRunner> {
        &self.host.commands
    }

    /// Ask for the active tables to be recomputed
    pub fn update_keymap(&mut self) {
        self.update_requested = true;
    }

    pub fn update_requested(&self) -> bool {
        self.update_requested
    }
}

/// Scheduler that runs each task on its own short-lived thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadScheduler;

impl Scheduler for ThreadScheduler {
    fn delayed_call(&self, task: Task, delay: Duration) {
        let spawned = thread::Builder::new()
            .name("delayed-call".to_string())
            .spawn(move || {
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
                task();
            });
        if let Err(e) = spawned {
            log::error!("Failed to spawn delayed call: {}", e);
        }
    }
}
