// Keymode Movement State
// Gaits, directions, the movement state enum and speed configuration

use std::fmt;
use std::time::Duration;

use strum_macros::{Display, EnumIter, EnumString};

/// Movement speed class
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Gait {
    #[default]
    Walk,
    Dash,
    Sneak,
}

/// One of the eight compass directions, in screen coordinates (y grows down)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl Direction {
    /// Unit step on each axis
    pub fn axes(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::UpLeft => (-1, -1),
            Direction::UpRight => (1, -1),
            Direction::DownLeft => (-1, 1),
            Direction::DownRight => (1, 1),
        }
    }

    /// Direction from axis signs; `None` for (0, 0)
    pub fn from_axes(dx: i32, dy: i32) -> Option<Direction> {
        match (dx.signum(), dy.signum()) {
            (0, -1) => Some(Direction::Up),
            (0, 1) => Some(Direction::Down),
            (-1, 0) => Some(Direction::Left),
            (1, 0) => Some(Direction::Right),
            (-1, -1) => Some(Direction::UpLeft),
            (1, -1) => Some(Direction::UpRight),
            (-1, 1) => Some(Direction::DownLeft),
            (1, 1) => Some(Direction::DownRight),
            _ => None,
        }
    }

    pub fn is_diagonal(self) -> bool {
        let (dx, dy) = self.axes();
        dx != 0 && dy != 0
    }
}

/// A gait moving in a direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Motion {
    pub gait: Gait,
    pub direction: Direction,
}

impl Motion {
    pub fn new(gait: Gait, direction: Direction) -> Self {
        Self { gait, direction }
    }
}

impl fmt::Display for Motion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.gait, self.direction)
    }
}

/// State of the movement worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MovementState {
    /// Terminal; the worker exits
    Quit,
    /// Parked, waiting for a wake-up
    #[default]
    Normal,
    Moving(Motion),
}

impl MovementState {
    pub fn moving(gait: Gait, direction: Direction) -> Self {
        MovementState::Moving(Motion::new(gait, direction))
    }

    pub fn is_active(self) -> bool {
        matches!(self, MovementState::Moving(_))
    }

    pub fn motion(self) -> Option<Motion> {
        match self {
            MovementState::Moving(motion) => Some(motion),
            _ => None,
        }
    }
}

impl fmt::Display for MovementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovementState::Quit => write!(f, "quit"),
            MovementState::Normal => write!(f, "normal"),
            MovementState::Moving(motion) => write!(f, "{}", motion),
        }
    }
}

/// Per-tick displacement in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Velocity {
    pub dx: i32,
    pub dy: i32,
}

/// Speeds and timing of the movement worker
#[derive(Debug, Clone, PartialEq)]
pub struct MovementConfig {
    /// Pixels per tick while walking
    pub walk_speed: i32,
    pub dash_speed: i32,
    pub sneak_speed: i32,
    pub tick_interval: Duration,
    /// Ticks without an update before falling back to `Normal`
    pub idle_timeout_ticks: u32,
    /// Log position and state on every tick
    pub verbose: bool,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            walk_speed: 8,
            dash_speed: 24,
            sneak_speed: 2,
            tick_interval: Duration::from_micros(16_667),
            idle_timeout_ticks: 30,
            verbose: false,
        }
    }
}

impl MovementConfig {
    pub fn speed(&self, gait: Gait) -> i32 {
        match gait {
            Gait::Walk => self.walk_speed,
            Gait::Dash => self.dash_speed,
            Gait::Sneak => self.sneak_speed,
        }
    }

    /// Displacement for one tick of `motion`.
    ///
    /// Diagonals move at full speed on both axes, so they cover about 1.41
    /// times the distance of a straight move.
    pub fn velocity(&self, motion: Motion) -> Velocity {
        let speed = self.speed(motion.gait);
        let (x, y) = motion.direction.axes();
        Velocity {
            dx: x * speed,
            dy: y * speed,
        }
    }
}
