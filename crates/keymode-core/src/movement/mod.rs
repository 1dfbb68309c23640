// Keymode Movement
// Keyboard-driven pointer movement on a background worker

pub mod cursor;
pub mod machine;
pub mod pad;
pub mod state;
pub mod worker;

pub use cursor::{CursorDriver, Point, VirtualCursor};
pub use machine::MovementMachine;
pub use pad::{movement_bindings, DirectionPad, PadKey, PadLayout};
pub use state::{Direction, Gait, Motion, MovementConfig, MovementState, Velocity};
pub use worker::{MovementController, MovementError, Pacer, ThreadSleep};
