// Keymode Cursor Driver
// Where the movement worker applies its displacement

use std::sync::Arc;

use parking_lot::Mutex;

use super::state::Velocity;

/// Absolute screen position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, velocity: Velocity) -> Self {
        Self {
            x: self.x + velocity.dx,
            y: self.y + velocity.dy,
        }
    }
}

/// Reads and writes the pointer position
pub trait CursorDriver: Send {
    fn position(&self) -> Point;

    fn set_position(&mut self, point: Point);

    /// Move by `velocity`, returning the new position
    fn drift(&mut self, velocity: Velocity) -> Point {
        let next = self.position().offset(velocity);
        self.set_position(next);
        next
    }
}

/// A pointer that only exists in memory.
///
/// Clones share the position, so one clone can drive the worker while
/// another observes it.
#[derive(Debug, Clone, Default)]
pub struct VirtualCursor {
    position: Arc<Mutex<Point>>,
}

impl VirtualCursor {
    pub fn new(start: Point) -> Self {
        Self {
            position: Arc::new(Mutex::new(start)),
        }
    }
}

impl CursorDriver for VirtualCursor {
    fn position(&self) -> Point {
        *self.position.lock()
    }

    fn set_position(&mut self, point: Point) {
        *self.position.lock() = point;
    }
}
