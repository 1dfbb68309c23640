// Keymode Movement Machine
// Thread-free transition logic of the movement worker

use super::state::{MovementConfig, MovementState, Velocity};

/// Pure movement state machine.
///
/// The worker thread drives it with [`tick`](Self::tick); the hook context
/// feeds it with [`update`](Self::update). Both go through the same mutex in
/// [`super::MovementController`].
#[derive(Debug, Clone)]
pub struct MovementMachine {
    config: MovementConfig,
    state: MovementState,
    idle_ticks: u32,
}

impl MovementMachine {
    pub fn new(config: MovementConfig) -> Self {
        Self {
            config,
            state: MovementState::Normal,
            idle_ticks: 0,
        }
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    pub fn state(&self) -> MovementState {
        self.state
    }

    /// Ticks since the last external update
    pub fn idle_ticks(&self) -> u32 {
        self.idle_ticks
    }

    /// Apply an external update. Returns true when the state changed.
    ///
    /// Repeating the current state only resets the idle counter. `Quit` is
    /// terminal: once stored, later updates are ignored.
    pub fn update(&mut self, state: MovementState) -> bool {
        if self.state == MovementState::Quit {
            return false;
        }
        self.idle_ticks = 0;
        if self.state == state {
            return false;
        }
        self.state = state;
        true
    }

    /// Advance one tick.
    ///
    /// Returns the displacement to apply, or `None` when not moving. The tick
    /// that reaches the idle timeout still moves, then falls back to `Normal`.
    pub fn tick(&mut self) -> Option<Velocity> {
        let motion = self.state.motion()?;
        let velocity = self.config.velocity(motion);

        self.idle_ticks += 1;
        if self.idle_ticks >= self.config.idle_timeout_ticks.max(1) {
            log::debug!(
                "movement idle for {} ticks, {} -> normal",
                self.idle_ticks,
                self.state
            );
            self.state = MovementState::Normal;
            self.idle_ticks = 0;
        }

        Some(velocity)
    }
}
