// Keymode Direction Pad
// Turns held direction keys into movement states and binds them to a keymap

use std::sync::Arc;

use parking_lot::Mutex;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use super::state::{Direction, Gait, Motion, MovementState};
use super::worker::MovementController;
use crate::chord::ChordParseError;
use crate::keymap::{Binding, WindowKeymap};

/// A key of the direction pad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum PadKey {
    Up,
    Down,
    Left,
    Right,
}

/// Held direction keys plus the gait of the most recent press
#[derive(Debug, Clone, Default)]
pub struct DirectionPad {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    gait: Gait,
}

impl DirectionPad {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, key: PadKey) -> &mut bool {
        match key {
            PadKey::Up => &mut self.up,
            PadKey::Down => &mut self.down,
            PadKey::Left => &mut self.left,
            PadKey::Right => &mut self.right,
        }
    }

    pub fn press(&mut self, key: PadKey, gait: Gait) -> MovementState {
        *self.slot(key) = true;
        self.gait = gait;
        self.state()
    }

    pub fn release(&mut self, key: PadKey) -> MovementState {
        *self.slot(key) = false;
        self.state()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// State to request: opposite keys cancel, orthogonal keys combine
    pub fn state(&self) -> MovementState {
        let dx = i32::from(self.right) - i32::from(self.left);
        let dy = i32::from(self.down) - i32::from(self.up);
        match Direction::from_axes(dx, dy) {
            Some(direction) => MovementState::Moving(Motion::new(self.gait, direction)),
            None => MovementState::Normal,
        }
    }
}

/// Key names and modifier prefixes for [`movement_bindings`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PadLayout {
    /// Prefix shared by every movement chord, e.g. `"U1-A-"`
    pub prefix: String,
    pub up: String,
    pub down: String,
    pub left: String,
    pub right: String,
    /// Extra prefix selecting the dash gait
    pub dash: String,
    pub sneak: String,
}

impl Default for PadLayout {
    fn default() -> Self {
        Self {
            prefix: "U1-A-".to_string(),
            up: "i".to_string(),
            down: "k".to_string(),
            left: "j".to_string(),
            right: "l".to_string(),
            dash: "S-".to_string(),
            sneak: "C-".to_string(),
        }
    }
}

impl PadLayout {
    fn key(&self, key: PadKey) -> &str {
        match key {
            PadKey::Up => &self.up,
            PadKey::Down => &self.down,
            PadKey::Left => &self.left,
            PadKey::Right => &self.right,
        }
    }

    fn gait_prefix(&self, gait: Gait) -> &str {
        match gait {
            Gait::Walk => "",
            Gait::Dash => &self.dash,
            Gait::Sneak => &self.sneak,
        }
    }
}

/// Bind `D-`/`U-` chords for every pad key and gait to drive `controller`.
///
/// Key-down presses the pad key and requests the resulting state; key-up
/// releases it. Auto-repeat re-sends the same state, which keeps the idle
/// timeout from firing while a key is held.
pub fn movement_bindings(
    keymap: &mut WindowKeymap,
    layout: &PadLayout,
    controller: Arc<MovementController>,
) -> Result<(), ChordParseError> {
    let pad = Arc::new(Mutex::new(DirectionPad::new()));

    for gait in Gait::iter() {
        for key in PadKey::iter() {
            let chord = format!("{}{}{}", layout.gait_prefix(gait), layout.prefix, layout.key(key));

            let (p, c) = (Arc::clone(&pad), Arc::clone(&controller));
            keymap.bind(
                &format!("D-{}", chord),
                Binding::callback(move |_ctx| {
                    let state = p.lock().press(key, gait);
                    c.update_state(state);
                }),
            )?;

            let (p, c) = (Arc::clone(&pad), Arc::clone(&controller));
            keymap.bind(
                &format!("U-{}", chord),
                Binding::callback(move |_ctx| {
                    let state = p.lock().release(key);
                    c.update_state(state);
                }),
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_key() {
        let mut pad = DirectionPad::new();
        assert_eq!(
            pad.press(PadKey::Right, Gait::Walk),
            MovementState::moving(Gait::Walk, Direction::Right)
        );
        assert_eq!(pad.release(PadKey::Right), MovementState::Normal);
    }

    #[test]
    fn test_orthogonal_keys_make_diagonal() {
        let mut pad = DirectionPad::new();
        pad.press(PadKey::Up, Gait::Dash);
        assert_eq!(
            pad.press(PadKey::Left, Gait::Dash),
            MovementState::moving(Gait::Dash, Direction::UpLeft)
        );
        assert_eq!(
            pad.release(PadKey::Up),
            MovementState::moving(Gait::Dash, Direction::Left)
        );
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let mut pad = DirectionPad::new();
        pad.press(PadKey::Left, Gait::Walk);
        assert_eq!(pad.press(PadKey::Right, Gait::Walk), MovementState::Normal);
        assert_eq!(
            pad.release(PadKey::Left),
            MovementState::moving(Gait::Walk, Direction::Right)
        );
    }

    #[test]
    fn test_latest_gait_wins() {
        let mut pad = DirectionPad::new();
        pad.press(PadKey::Down, Gait::Walk);
        assert_eq!(
            pad.press(PadKey::Right, Gait::Sneak),
            MovementState::moving(Gait::Sneak, Direction::DownRight)
        );
        pad.clear();
        assert_eq!(pad.state(), MovementState::Normal);
    }

    #[test]
    fn test_bindings_cover_every_gait_and_key() {
        use crate::movement::cursor::VirtualCursor;
        use crate::movement::state::MovementConfig;

        let controller = Arc::new(
            MovementController::spawn(MovementConfig::default(), VirtualCursor::default())
                .unwrap(),
        );
        let mut keymap = WindowKeymap::new("test");
        movement_bindings(&mut keymap, &PadLayout::default(), Arc::clone(&controller)).unwrap();
        assert_eq!(keymap.len(), 3 * 4 * 2);

        let names: Vec<String> = keymap.iter().map(|(c, _)| c.to_string()).collect();
        assert!(names.contains(&"D-U1-A-I".to_string()));
        assert!(names.contains(&"U-U1-A-S-L".to_string()));
        assert!(names.contains(&"D-U1-A-C-J".to_string()));
        controller.shutdown();
    }
}
