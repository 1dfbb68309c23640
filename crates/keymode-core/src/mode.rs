// Keymode Mode Dispatcher
// Holds the current keymap mode and hands out activation predicates over it

use std::sync::Arc;

use parking_lot::RwLock;
use strum_macros::{Display, EnumIter, EnumString};

use crate::keymap::Activation;

/// Which group of keymap tables is currently meant to be active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Mode {
    /// Everyday typing; only user-modifier chords are remapped
    #[default]
    Limited,
    /// Vim-like cursor movement on the home row
    Cursor,
    /// Nearly everything passes through untouched (for playing games)
    Celeste,
    /// Experimental bindings
    Test,
}

/// Shared handle to the mode flag.
///
/// Cloning yields another handle to the same flag. Setting a mode never
/// changes which tables are active by itself: after a setter the caller must
/// ask the resolver to recompute (`HostCtx::update_keymap`).
#[derive(Debug, Clone, Default)]
pub struct ModeContext {
    mode: Arc<RwLock<Mode>>,
}

impl ModeContext {
    /// Create a context starting in [`Mode::Limited`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context starting in `mode`
    pub fn with_mode(mode: Mode) -> Self {
        Self {
            mode: Arc::new(RwLock::new(mode)),
        }
    }

    pub fn current(&self) -> Mode {
        *self.mode.read()
    }

    pub fn set(&self, mode: Mode) {
        let mut current = self.mode.write();
        if *current != mode {
            log::info!("keymap mode {} -> {}", *current, mode);
        }
        *current = mode;
    }

    pub fn set_limited(&self) {
        self.set(Mode::Limited);
    }

    pub fn set_cursor(&self) {
        self.set(Mode::Cursor);
    }

    pub fn set_celeste(&self) {
        self.set(Mode::Celeste);
    }

    pub fn set_test(&self) {
        self.set(Mode::Test);
    }

    pub fn is(&self, mode: Mode) -> bool {
        self.current() == mode
    }

    pub fn is_limited(&self) -> bool {
        self.is(Mode::Limited)
    }

    pub fn is_cursor(&self) -> bool {
        self.is(Mode::Cursor)
    }

    pub fn is_celeste(&self) -> bool {
        self.is(Mode::Celeste)
    }

    pub fn is_test(&self) -> bool {
        self.is(Mode::Test)
    }

    /// Activation predicate that holds while the flag equals `mode`.
    ///
    /// The predicate ignores the foreground window.
    pub fn predicate(&self, mode: Mode) -> Activation {
        let ctx = self.clone();
        Activation::when(move |_window| ctx.is(mode))
    }
}
