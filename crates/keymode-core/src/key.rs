// Keymode Key Type
// Represents a single Windows virtual-key code

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Represents a single keyboard key as a virtual-key code.
///
/// The numeric values match the `VK_*` constants of `winuser.h`, which is
/// also what raw chord specs such as `"(28)"` refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Key(pub u8);

impl Key {
    pub const LBUTTON: Key = Key(0x01);
    pub const RBUTTON: Key = Key(0x02);
    pub const MBUTTON: Key = Key(0x04);
    pub const BACK: Key = Key(0x08);
    pub const TAB: Key = Key(0x09);
    pub const ENTER: Key = Key(0x0D);
    pub const ESCAPE: Key = Key(0x1B);
    /// Henkan on Japanese keyboards
    pub const CONVERT: Key = Key(0x1C);
    /// Muhenkan on Japanese keyboards
    pub const NON_CONVERT: Key = Key(0x1D);
    pub const SPACE: Key = Key(0x20);
    pub const PAGE_UP: Key = Key(0x21);
    pub const PAGE_DOWN: Key = Key(0x22);
    pub const END: Key = Key(0x23);
    pub const HOME: Key = Key(0x24);
    pub const LEFT: Key = Key(0x25);
    pub const UP: Key = Key(0x26);
    pub const RIGHT: Key = Key(0x27);
    pub const DOWN: Key = Key(0x28);
    pub const DELETE: Key = Key(0x2E);
    pub const LSHIFT: Key = Key(0xA0);
    pub const RSHIFT: Key = Key(0xA1);
    pub const LCTRL: Key = Key(0xA2);
    pub const RCTRL: Key = Key(0xA3);
    pub const LALT: Key = Key(0xA4);
    pub const RALT: Key = Key(0xA5);
    pub const LWIN: Key = Key(0x5B);
    pub const RWIN: Key = Key(0x5C);
    pub const SEMICOLON: Key = Key(0xBA);
    pub const SLASH: Key = Key(0xBF);

    /// Get the raw virtual-key code
    pub fn code(self) -> u8 {
        self.0
    }

    /// Get the canonical name of this key, if it has one
    pub fn name(self) -> Option<&'static str> {
        key_name(self.0)
    }

    /// Key for a letter `a`..`z` (case-insensitive)
    pub fn letter(c: char) -> Option<Key> {
        let upper = c.to_ascii_uppercase();
        upper.is_ascii_uppercase().then(|| Key(upper as u8))
    }
}

impl From<u8> for Key {
    fn from(code: u8) -> Self {
        Key(code)
    }
}

impl From<Key> for u8 {
    fn from(key: Key) -> Self {
        key.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "({})", self.0),
        }
    }
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        key_from_name(s).ok_or_else(|| format!("Unknown key: {}", s))
    }
}

/// Name table: canonical names first, aliases after them.
fn name_table() -> &'static [(&'static str, u8)] {
    static TABLE: OnceLock<Vec<(&'static str, u8)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table: Vec<(&'static str, u8)> = vec![
            ("LButton", 0x01),
            ("RButton", 0x02),
            ("Cancel", 0x03),
            ("MButton", 0x04),
            ("XButton1", 0x05),
            ("XButton2", 0x06),
            ("Back", 0x08),
            ("Tab", 0x09),
            ("Clear", 0x0C),
            ("Enter", 0x0D),
            ("Shift", 0x10),
            ("Ctrl", 0x11),
            ("Alt", 0x12),
            ("Pause", 0x13),
            ("CapsLock", 0x14),
            ("Kana", 0x15),
            ("Kanji", 0x19),
            ("Escape", 0x1B),
            ("Convert", 0x1C),
            ("NonConvert", 0x1D),
            ("Space", 0x20),
            ("PageUp", 0x21),
            ("PageDown", 0x22),
            ("End", 0x23),
            ("Home", 0x24),
            ("Left", 0x25),
            ("Up", 0x26),
            ("Right", 0x27),
            ("Down", 0x28),
            ("Select", 0x29),
            ("PrintScreen", 0x2C),
            ("Insert", 0x2D),
            ("Delete", 0x2E),
            ("Help", 0x2F),
            ("LWin", 0x5B),
            ("RWin", 0x5C),
            ("Apps", 0x5D),
            ("Sleep", 0x5F),
            ("Multiply", 0x6A),
            ("Add", 0x6B),
            ("Separator", 0x6C),
            ("Subtract", 0x6D),
            ("Decimal", 0x6E),
            ("Divide", 0x6F),
            ("NumLock", 0x90),
            ("ScrollLock", 0x91),
            ("LShift", 0xA0),
            ("RShift", 0xA1),
            ("LCtrl", 0xA2),
            ("RCtrl", 0xA3),
            ("LAlt", 0xA4),
            ("RAlt", 0xA5),
            ("Semicolon", 0xBA),
            ("Plus", 0xBB),
            ("Comma", 0xBC),
            ("Minus", 0xBD),
            ("Period", 0xBE),
            ("Slash", 0xBF),
            ("BackQuote", 0xC0),
            ("OpenBracket", 0xDB),
            ("BackSlash", 0xDC),
            ("CloseBracket", 0xDD),
            ("Quote", 0xDE),
        ];

        const DIGITS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];
        for (i, digit) in DIGITS.iter().enumerate() {
            table.push((*digit, 0x30 + i as u8));
        }

        const LETTERS: [&str; 26] = [
            "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P",
            "Q", "R", "S", "T", "U", "V", "W", "X", "Y", "Z",
        ];
        for (i, letter) in LETTERS.iter().enumerate() {
            table.push((*letter, 0x41 + i as u8));
        }

        const NUMPAD: [&str; 10] = [
            "Num0", "Num1", "Num2", "Num3", "Num4", "Num5", "Num6", "Num7", "Num8", "Num9",
        ];
        for (i, num) in NUMPAD.iter().enumerate() {
            table.push((*num, 0x60 + i as u8));
        }

        const FUNCTION: [&str; 24] = [
            "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12", "F13",
            "F14", "F15", "F16", "F17", "F18", "F19", "F20", "F21", "F22", "F23", "F24",
        ];
        for (i, f) in FUNCTION.iter().enumerate() {
            table.push((*f, 0x70 + i as u8));
        }

        // Aliases, never used for display
        table.extend_from_slice(&[
            ("BackSpace", 0x08),
            ("Return", 0x0D),
            ("Esc", 0x1B),
            ("Prior", 0x21),
            ("Next", 0x22),
            ("Del", 0x2E),
            ("Ins", 0x2D),
            ("Henkan", 0x1C),
            ("Muhenkan", 0x1D),
            ("Colon", 0xBA),
            ("Dot", 0xBE),
            ("Grave", 0xC0),
        ]);
        table
    })
}

/// Display name for a virtual-key code
pub fn key_name(code: u8) -> Option<&'static str> {
    name_table()
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(name, _)| *name)
}

/// Try to parse a key name to a key code (case-insensitive)
pub fn key_from_name(name: &str) -> Option<Key> {
    name_table()
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, code)| Key(*code))
}

/// ASCII character to the unshifted key that types it
pub fn ascii_to_key(c: char) -> Option<Key> {
    match c {
        'a'..='z' | 'A'..='Z' => Key::letter(c),
        '0'..='9' => Some(Key(c as u8)),
        ' ' => Some(Key::SPACE),
        ';' => Some(Key::SEMICOLON),
        '=' => Some(Key(0xBB)),
        ',' => Some(Key(0xBC)),
        '-' => Some(Key(0xBD)),
        '.' => Some(Key(0xBE)),
        '/' => Some(Key::SLASH),
        '`' => Some(Key(0xC0)),
        '[' => Some(Key(0xDB)),
        '\\' => Some(Key(0xDC)),
        ']' => Some(Key(0xDD)),
        '\'' => Some(Key(0xDE)),
        '\n' => Some(Key::ENTER),
        '\t' => Some(Key::TAB),
        _ => None,
    }
}
