//! USB HID keyboard report (boot protocol compatible) and the key
//! vocabulary used by action strings.
//!
//! Layout (8 bytes):
//! ```text
//! Byte 0: Modifier keys (bitfield)
//!         Bit 0 = Left Ctrl,  Bit 1 = Left Shift,
//!         Bit 2 = Left Alt,   Bit 3 = Left GUI,
//!         Bit 4 = Right Ctrl, Bit 5 = Right Shift,
//!         Bit 6 = Right Alt,  Bit 7 = Right GUI
//! Byte 1: Reserved (0x00)
//! Byte 2-7: Up to 6 simultaneous key codes (USB HID usage codes)
//! ```

use crate::error::{Error, Result};

/// Keyboard report size in bytes.
pub const KEYBOARD_REPORT_SIZE: usize = 8;

/// Standard USB HID boot-protocol keyboard report.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    /// Modifier key bitfield.
    pub modifier: u8,
    /// Reserved byte (always 0x00 per HID spec).
    pub reserved: u8,
    /// Up to 6 simultaneously pressed key codes.
    pub keycodes: [u8; 6],
}

impl KeyboardReport {
    /// Create an empty (all-keys-released) report.
    pub const fn empty() -> Self {
        Self {
            modifier: 0,
            reserved: 0,
            keycodes: [0; 6],
        }
    }

    /// Serialise into a byte slice for USB HID transmission.
    /// Returns the number of bytes written (always 8).
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < KEYBOARD_REPORT_SIZE {
            return 0;
        }
        buf[0] = self.modifier;
        buf[1] = self.reserved;
        buf[2..8].copy_from_slice(&self.keycodes);
        KEYBOARD_REPORT_SIZE
    }

    /// Returns `true` if no keys are pressed (release event).
    pub fn is_empty(&self) -> bool {
        self.modifier == 0 && self.keycodes.iter().all(|&k| k == 0)
    }

    /// Add a usage to the first free slot. Already-held keys are kept once.
    pub fn add_key(&mut self, usage: u8) -> Result<()> {
        if self.keycodes.contains(&usage) {
            return Ok(());
        }
        let slot = self
            .keycodes
            .iter_mut()
            .find(|k| **k == 0)
            .ok_or(Error::BufferOverflow)?;
        *slot = usage;
        Ok(())
    }
}

/// Modifier keys (left-hand variants).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Modifier {
    Ctrl,
    Shift,
    Alt,
    Gui,
}

impl Modifier {
    /// Bit in [`KeyboardReport::modifier`].
    pub const fn bit(self) -> u8 {
        match self {
            Modifier::Ctrl => 0x01,
            Modifier::Shift => 0x02,
            Modifier::Alt => 0x04,
            Modifier::Gui => 0x08,
        }
    }
}

/// One `+`-separated token of an action string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyToken {
    Modifier(Modifier),
    /// HID usage on the Keyboard/Keypad page.
    Key(u8),
}

// Keyboard/Keypad page usages.
mod usage {
    pub const A: u8 = 0x04;
    pub const N1: u8 = 0x1E;
    pub const N0: u8 = 0x27;
    pub const ENTER: u8 = 0x28;
    pub const ESCAPE: u8 = 0x29;
    pub const BACKSPACE: u8 = 0x2A;
    pub const TAB: u8 = 0x2B;
    pub const SPACE: u8 = 0x2C;
    pub const MINUS: u8 = 0x2D;
    pub const EQUAL: u8 = 0x2E;
    pub const LEFT_BRACKET: u8 = 0x2F;
    pub const RIGHT_BRACKET: u8 = 0x30;
    pub const BACKSLASH: u8 = 0x31;
    pub const SEMICOLON: u8 = 0x33;
    pub const QUOTE: u8 = 0x34;
    pub const GRAVE: u8 = 0x35;
    pub const COMMA: u8 = 0x36;
    pub const DOT: u8 = 0x37;
    pub const SLASH: u8 = 0x38;
    pub const CAPS_LOCK: u8 = 0x39;
    pub const F1: u8 = 0x3A;
    pub const PRINT_SCREEN: u8 = 0x46;
    pub const INSERT: u8 = 0x49;
    pub const HOME: u8 = 0x4A;
    pub const PAGE_UP: u8 = 0x4B;
    pub const DELETE: u8 = 0x4C;
    pub const END: u8 = 0x4D;
    pub const PAGE_DOWN: u8 = 0x4E;
    pub const RIGHT: u8 = 0x4F;
    pub const LEFT: u8 = 0x50;
    pub const DOWN: u8 = 0x51;
    pub const UP: u8 = 0x52;
    pub const KP_SLASH: u8 = 0x54;
    pub const KP_ASTERISK: u8 = 0x55;
    pub const KP_MINUS: u8 = 0x56;
    pub const KP_PLUS: u8 = 0x57;
    pub const KP_ENTER: u8 = 0x58;
}

/// Named keys accepted in action strings. Matching is case-insensitive.
const NAMED_KEYS: &[(&str, KeyToken)] = &[
    ("CTRL", KeyToken::Modifier(Modifier::Ctrl)),
    ("CONTROL", KeyToken::Modifier(Modifier::Ctrl)),
    ("SHIFT", KeyToken::Modifier(Modifier::Shift)),
    ("ALT", KeyToken::Modifier(Modifier::Alt)),
    ("OPTION", KeyToken::Modifier(Modifier::Alt)),
    ("GUI", KeyToken::Modifier(Modifier::Gui)),
    ("WIN", KeyToken::Modifier(Modifier::Gui)),
    ("CMD", KeyToken::Modifier(Modifier::Gui)),
    ("META", KeyToken::Modifier(Modifier::Gui)),
    ("ENTER", KeyToken::Key(usage::ENTER)),
    ("RETURN", KeyToken::Key(usage::ENTER)),
    ("ESC", KeyToken::Key(usage::ESCAPE)),
    ("ESCAPE", KeyToken::Key(usage::ESCAPE)),
    ("BACKSPACE", KeyToken::Key(usage::BACKSPACE)),
    ("TAB", KeyToken::Key(usage::TAB)),
    ("SPACE", KeyToken::Key(usage::SPACE)),
    ("CAPS_LOCK", KeyToken::Key(usage::CAPS_LOCK)),
    ("PRINT_SCREEN", KeyToken::Key(usage::PRINT_SCREEN)),
    ("INSERT", KeyToken::Key(usage::INSERT)),
    ("DELETE", KeyToken::Key(usage::DELETE)),
    ("DEL", KeyToken::Key(usage::DELETE)),
    ("HOME", KeyToken::Key(usage::HOME)),
    ("END", KeyToken::Key(usage::END)),
    ("PAGE_UP", KeyToken::Key(usage::PAGE_UP)),
    ("PAGE_DOWN", KeyToken::Key(usage::PAGE_DOWN)),
    ("UP", KeyToken::Key(usage::UP)),
    ("DOWN", KeyToken::Key(usage::DOWN)),
    ("LEFT", KeyToken::Key(usage::LEFT)),
    ("RIGHT", KeyToken::Key(usage::RIGHT)),
    ("NUM_SLASH", KeyToken::Key(usage::KP_SLASH)),
    ("NUM_STAR", KeyToken::Key(usage::KP_ASTERISK)),
    ("NUM_MINUS", KeyToken::Key(usage::KP_MINUS)),
    ("NUM_PLUS", KeyToken::Key(usage::KP_PLUS)),
    ("NUM_ENTER", KeyToken::Key(usage::KP_ENTER)),
];

impl KeyToken {
    /// Parse one token: a named key, `F1`..`F12`, or a single printable
    /// character. `None` for anything else.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if let Some((_, key)) = NAMED_KEYS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(token))
        {
            return Some(*key);
        }
        if let Some(f) = parse_function_key(token) {
            return Some(KeyToken::Key(f));
        }
        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => ascii_usage(c).map(|(usage, _)| KeyToken::Key(usage)),
            _ => None,
        }
    }
}

fn parse_function_key(token: &str) -> Option<u8> {
    let rest = token.strip_prefix('F').or_else(|| token.strip_prefix('f'))?;
    match rest.parse::<u8>() {
        Ok(n @ 1..=12) => Some(usage::F1 + n - 1),
        _ => None,
    }
}

/// HID usage for an ASCII character, plus whether Shift is needed on a
/// US layout.
pub fn ascii_usage(c: char) -> Option<(u8, bool)> {
    let mapped = match c {
        'a'..='z' => (usage::A + (c as u8 - b'a'), false),
        'A'..='Z' => (usage::A + (c as u8 - b'A'), true),
        '1'..='9' => (usage::N1 + (c as u8 - b'1'), false),
        '0' => (usage::N0, false),
        '!' => (usage::N1, true),
        '@' => (usage::N1 + 1, true),
        '#' => (usage::N1 + 2, true),
        '$' => (usage::N1 + 3, true),
        '%' => (usage::N1 + 4, true),
        '^' => (usage::N1 + 5, true),
        '&' => (usage::N1 + 6, true),
        '*' => (usage::N1 + 7, true),
        '(' => (usage::N1 + 8, true),
        ')' => (usage::N0, true),
        '\n' => (usage::ENTER, false),
        '\t' => (usage::TAB, false),
        ' ' => (usage::SPACE, false),
        '-' => (usage::MINUS, false),
        '_' => (usage::MINUS, true),
        '=' => (usage::EQUAL, false),
        '+' => (usage::EQUAL, true),
        '[' => (usage::LEFT_BRACKET, false),
        '{' => (usage::LEFT_BRACKET, true),
        ']' => (usage::RIGHT_BRACKET, false),
        '}' => (usage::RIGHT_BRACKET, true),
        '\\' => (usage::BACKSLASH, false),
        '|' => (usage::BACKSLASH, true),
        ';' => (usage::SEMICOLON, false),
        ':' => (usage::SEMICOLON, true),
        '\'' => (usage::QUOTE, false),
        '"' => (usage::QUOTE, true),
        '`' => (usage::GRAVE, false),
        '~' => (usage::GRAVE, true),
        ',' => (usage::COMMA, false),
        '<' => (usage::COMMA, true),
        '.' => (usage::DOT, false),
        '>' => (usage::DOT, true),
        '/' => (usage::SLASH, false),
        '?' => (usage::SLASH, true),
        _ => return None,
    };
    Some(mapped)
}

/// Keyboard transport as seen by the action dispatcher.
pub trait Keyboard {
    /// Add a key or modifier to the held set.
    fn press_key(&mut self, key: KeyToken) -> Result<()>;
    /// Release everything held.
    fn release_all(&mut self) -> Result<()>;
    /// Press and release one character.
    fn type_character(&mut self, c: char) -> Result<()>;
}

/// Destination for finished reports (a USB endpoint queue in firmware).
pub trait ReportSink {
    fn send(&mut self, report: &KeyboardReport) -> Result<()>;
}

impl<T: ReportSink + ?Sized> ReportSink for &mut T {
    fn send(&mut self, report: &KeyboardReport) -> Result<()> {
        (**self).send(report)
    }
}

/// [`Keyboard`] that turns key operations into boot-protocol reports.
pub struct ReportKeyboard<S> {
    sink: S,
    held: KeyboardReport,
}

impl<S: ReportSink> ReportKeyboard<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            held: KeyboardReport::empty(),
        }
    }

    /// Currently held keys.
    pub fn held(&self) -> &KeyboardReport {
        &self.held
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S: ReportSink> Keyboard for ReportKeyboard<S> {
    fn press_key(&mut self, key: KeyToken) -> Result<()> {
        match key {
            KeyToken::Modifier(m) => self.held.modifier |= m.bit(),
            KeyToken::Key(usage) => self.held.add_key(usage)?,
        }
        self.sink.send(&self.held)
    }

    fn release_all(&mut self) -> Result<()> {
        self.held = KeyboardReport::empty();
        self.sink.send(&self.held)
    }

    fn type_character(&mut self, c: char) -> Result<()> {
        let (usage, shift) = ascii_usage(c).ok_or(Error::Keyboard)?;
        let mut stroke = KeyboardReport::empty();
        stroke.modifier = self.held.modifier;
        if shift {
            stroke.modifier |= Modifier::Shift.bit();
        }
        stroke.keycodes[0] = usage;
        self.sink.send(&stroke)?;
        self.sink.send(&self.held)
    }
}
