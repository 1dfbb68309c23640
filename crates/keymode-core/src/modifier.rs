// Keymode Modifier System
// Represents chord modifiers (Shift, Ctrl, Alt, Win and the user modifiers U0..U3)

use std::fmt;

use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::Key;

/// A chord modifier.
///
/// The generic variants (`Shift`, `Ctrl`, `Alt`, `Win`) accept either side of
/// the keyboard; the `L*`/`R*` variants are specific to one side. `User0` to
/// `User3` are assigned to arbitrary keys at runtime (see
/// [`crate::engine::KeymapEngine::define_modifier`]).
///
/// Variant order is the display order of a chord prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter)]
#[repr(u8)]
pub enum Modifier {
    User0,
    User1,
    User2,
    User3,
    Win,
    LWin,
    RWin,
    Alt,
    LAlt,
    RAlt,
    Ctrl,
    LCtrl,
    RCtrl,
    Shift,
    LShift,
    RShift,
}

/// The four physical modifier families, each with a left and right key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
enum Family {
    Win,
    Alt,
    Ctrl,
    Shift,
}

impl Family {
    fn generic(self) -> Modifier {
        match self {
            Family::Win => Modifier::Win,
            Family::Alt => Modifier::Alt,
            Family::Ctrl => Modifier::Ctrl,
            Family::Shift => Modifier::Shift,
        }
    }
}

impl Modifier {
    /// All accepted spellings; the first entry is the chord prefix form
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Modifier::Shift => &["S", "Shift"],
            Modifier::LShift => &["LS", "LShift"],
            Modifier::RShift => &["RS", "RShift"],
            Modifier::Ctrl => &["C", "Ctrl"],
            Modifier::LCtrl => &["LC", "LCtrl"],
            Modifier::RCtrl => &["RC", "RCtrl"],
            Modifier::Alt => &["A", "Alt"],
            Modifier::LAlt => &["LA", "LAlt"],
            Modifier::RAlt => &["RA", "RAlt"],
            Modifier::Win => &["W", "Win"],
            Modifier::LWin => &["LW", "LWin"],
            Modifier::RWin => &["RW", "RWin"],
            Modifier::User0 => &["U0", "User0"],
            Modifier::User1 => &["U1", "User1"],
            Modifier::User2 => &["U2", "User2"],
            Modifier::User3 => &["U3", "User3"],
        }
    }

    /// Get the first alias (chord prefix form)
    pub fn primary_alias(self) -> &'static str {
        self.aliases()[0]
    }

    /// Get modifier by alias (case-insensitive)
    pub fn from_alias(alias: &str) -> Option<Modifier> {
        Modifier::iter().find(|m| m.aliases().iter().any(|a| a.eq_ignore_ascii_case(alias)))
    }

    /// Check if this is one of the runtime-assigned user modifiers
    pub fn is_user(self) -> bool {
        matches!(
            self,
            Modifier::User0 | Modifier::User1 | Modifier::User2 | Modifier::User3
        )
    }

    fn family(self) -> Option<Family> {
        match self {
            Modifier::Win | Modifier::LWin | Modifier::RWin => Some(Family::Win),
            Modifier::Alt | Modifier::LAlt | Modifier::RAlt => Some(Family::Alt),
            Modifier::Ctrl | Modifier::LCtrl | Modifier::RCtrl => Some(Family::Ctrl),
            Modifier::Shift | Modifier::LShift | Modifier::RShift => Some(Family::Shift),
            _ => None,
        }
    }

    /// Get the left variant of a generic modifier
    pub fn to_left(self) -> Option<Modifier> {
        match self.family()? {
            Family::Win => Some(Modifier::LWin),
            Family::Alt => Some(Modifier::LAlt),
            Family::Ctrl => Some(Modifier::LCtrl),
            Family::Shift => Some(Modifier::LShift),
        }
    }

    /// Get the right variant of a generic modifier
    pub fn to_right(self) -> Option<Modifier> {
        match self.family()? {
            Family::Win => Some(Modifier::RWin),
            Family::Alt => Some(Modifier::RAlt),
            Family::Ctrl => Some(Modifier::RCtrl),
            Family::Shift => Some(Modifier::RShift),
        }
    }

    /// Sided modifier for a physical modifier key
    pub fn from_key(key: Key) -> Option<Modifier> {
        match key {
            Key::LSHIFT => Some(Modifier::LShift),
            Key::RSHIFT => Some(Modifier::RShift),
            Key::LCTRL => Some(Modifier::LCtrl),
            Key::RCTRL => Some(Modifier::RCtrl),
            Key::LALT => Some(Modifier::LAlt),
            Key::RALT => Some(Modifier::RAlt),
            Key::LWIN => Some(Modifier::LWin),
            Key::RWIN => Some(Modifier::RWin),
            _ => None,
        }
    }

    /// Physical key used when a modifier has to be injected
    pub fn key(self) -> Option<Key> {
        match self {
            Modifier::Shift | Modifier::LShift => Some(Key::LSHIFT),
            Modifier::RShift => Some(Key::RSHIFT),
            Modifier::Ctrl | Modifier::LCtrl => Some(Key::LCTRL),
            Modifier::RCtrl => Some(Key::RCTRL),
            Modifier::Alt | Modifier::LAlt => Some(Key::LALT),
            Modifier::RAlt => Some(Key::RALT),
            Modifier::Win | Modifier::LWin => Some(Key::LWIN),
            Modifier::RWin => Some(Key::RWIN),
            _ => None,
        }
    }

    fn bit(self) -> u16 {
        1 << (self as u8)
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.primary_alias())
    }
}

/// A set of modifiers, stored as a bitmask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ModifierSet(u16);

impl ModifierSet {
    pub const EMPTY: ModifierSet = ModifierSet(0);

    pub fn new() -> Self {
        Self::EMPTY
    }

    pub fn insert(&mut self, modifier: Modifier) -> bool {
        let fresh = !self.contains(modifier);
        self.0 |= modifier.bit();
        fresh
    }

    pub fn remove(&mut self, modifier: Modifier) {
        self.0 &= !modifier.bit();
    }

    pub fn contains(self, modifier: Modifier) -> bool {
        self.0 & modifier.bit() != 0
    }

    pub fn with(mut self, modifier: Modifier) -> Self {
        self.insert(modifier);
        self
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterate in display order
    pub fn iter(self) -> impl Iterator<Item = Modifier> {
        Modifier::iter().filter(move |m| self.contains(*m))
    }

    /// Check whether a chord requiring `self` is satisfied by the `held` set.
    ///
    /// `held` contains only sided and user modifiers. A generic requirement is
    /// met by either side; a family that is not required must not be held at
    /// all. User modifiers must match exactly.
    pub fn matches_held(self, held: ModifierSet) -> bool {
        for family in Family::iter() {
            let generic = family.generic();
            let (left, right) = match (generic.to_left(), generic.to_right()) {
                (Some(l), Some(r)) => (l, r),
                _ => continue,
            };
            let held_left = held.contains(left);
            let held_right = held.contains(right);

            let ok = if self.contains(generic) {
                held_left || held_right
            } else {
                let want_left = self.contains(left);
                let want_right = self.contains(right);
                want_left == held_left && want_right == held_right
            };
            if !ok {
                return false;
            }
        }

        Modifier::iter()
            .filter(|m| m.is_user())
            .all(|m| self.contains(m) == held.contains(m))
    }
}

impl FromIterator<Modifier> for ModifierSet {
    fn from_iter<I: IntoIterator<Item = Modifier>>(iter: I) -> Self {
        let mut set = ModifierSet::new();
        for m in iter {
            set.insert(m);
        }
        set
    }
}

impl fmt::Display for ModifierSet {
    /// Renders as a chord prefix, e.g. `U1-A-C-`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for m in self.iter() {
            write!(f, "{}-", m)?;
        }
        Ok(())
    }
}
