//! On-screen numeric keypad.
//!
//! The keypad holds no input state. It maps a pressed [`Key`] to a
//! [`KeypadEvent`] and leaves the meaning of that event to whichever candidate
//! is currently active.
//!
//! ```text
//! ┌─────┬─────┬─────┐
//! │  1  │  2  │  3  │
//! │     │ ABC │ DEF │
//! ├─────┼─────┼─────┤
//! │  4  │  5  │  6  │
//! │ GHI │ JKL │ MNO │
//! ├─────┼─────┼─────┤
//! │  7  │  8  │  9  │
//! │PQRS │ TUV │WXYZ │
//! ├─────┼─────┼─────┤
//! │     │  0  │  ⌫  │
//! │     │  +  │     │
//! └─────┴─────┴─────┘
//! ```

use serde::{Deserialize, Serialize};

/// A single cell of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Digit(char),
    /// Filler cell left of `0`. Never emits.
    Blank,
    Backspace,
}

/// What a key press means to the active candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeypadEvent {
    Digit(char),
    Backspace,
}

pub const ROWS: usize = 4;
pub const COLUMNS: usize = 3;

const LAYOUT: [[Key; COLUMNS]; ROWS] = [
    [Key::Digit('1'), Key::Digit('2'), Key::Digit('3')],
    [Key::Digit('4'), Key::Digit('5'), Key::Digit('6')],
    [Key::Digit('7'), Key::Digit('8'), Key::Digit('9')],
    [Key::Blank, Key::Digit('0'), Key::Backspace],
];

impl Key {
    /// Main glyph printed on the key.
    pub fn label(&self) -> &'static str {
        match self {
            Key::Digit('0') => "0",
            Key::Digit('1') => "1",
            Key::Digit('2') => "2",
            Key::Digit('3') => "3",
            Key::Digit('4') => "4",
            Key::Digit('5') => "5",
            Key::Digit('6') => "6",
            Key::Digit('7') => "7",
            Key::Digit('8') => "8",
            Key::Digit('9') => "9",
            Key::Digit(_) | Key::Blank => "",
            Key::Backspace => "⌫",
        }
    }

    /// Telephone letters printed under the digit.
    pub fn letters(&self) -> &'static str {
        match self {
            Key::Digit('2') => "ABC",
            Key::Digit('3') => "DEF",
            Key::Digit('4') => "GHI",
            Key::Digit('5') => "JKL",
            Key::Digit('6') => "MNO",
            Key::Digit('7') => "PQRS",
            Key::Digit('8') => "TUV",
            Key::Digit('9') => "WXYZ",
            Key::Digit('0') => "+",
            _ => "",
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Key::Blank)
    }
}

/// The keypad surface for one render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeypadInput {
    disabled: bool,
}

impl KeypadInput {
    pub fn enabled() -> Self {
        Self { disabled: false }
    }

    pub fn disabled() -> Self {
        Self { disabled: true }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Rows of the grid, top to bottom.
    pub fn rows(&self) -> &'static [[Key; COLUMNS]; ROWS] {
        &LAYOUT
    }

    /// Translate a press. Blank cells, keys not on the grid, and any press
    /// while disabled produce nothing.
    pub fn press(&self, key: Key) -> Option<KeypadEvent> {
        if self.disabled {
            return None;
        }
        match key {
            Key::Digit(d) if d.is_ascii_digit() => Some(KeypadEvent::Digit(d)),
            Key::Digit(_) | Key::Blank => None,
            Key::Backspace => Some(KeypadEvent::Backspace),
        }
    }

    /// Map a typed character onto the grid, for hardware keyboards and
    /// terminals. Backspace and DEL both map to [`Key::Backspace`].
    pub fn key_for_char(c: char) -> Option<Key> {
        match c {
            '0'..='9' => Some(Key::Digit(c)),
            '\u{8}' | '\u{7f}' => Some(Key::Backspace),
            _ => None,
        }
    }
}
