//! Button actions.
//!
//! Each hall button carries an action string from the settings store:
//!
//! - `TYPE:<text>` types `<text>` one character at a time.
//! - Anything else is a `+`-joined chord such as `CTRL+SHIFT+Z`. Tokens
//!   are matched case-insensitively; unknown ones are dropped. All keys
//!   are pressed in order and then released together.

use heapless::Vec;

use crate::config::{ACTION_MAX_LEN, HALL_BUTTON_COUNT};
use crate::hid::{KeyToken, Keyboard};
use crate::input::Button;

/// Stored action string.
pub type ActionString = heapless::String<ACTION_MAX_LEN>;

/// Most keys one chord may hold (modifiers plus the six report slots).
pub const MAX_CHORD_KEYS: usize = 10;

const TYPE_PREFIX: &str = "TYPE:";

/// Parsed action string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action<'a> {
    /// Literal text.
    Type(&'a str),
    /// Chord pressed in order, then released.
    Press(Vec<KeyToken, MAX_CHORD_KEYS>),
}

impl<'a> Action<'a> {
    pub fn parse(action: &'a str) -> Self {
        if let Some(text) = action.strip_prefix(TYPE_PREFIX) {
            return Action::Type(text);
        }
        let mut keys = Vec::new();
        for token in action.split('+') {
            match KeyToken::parse(token) {
                Some(key) => {
                    if keys.push(key).is_err() {
                        warn!("action: chord too long, extra keys dropped");
                        break;
                    }
                }
                None => {
                    if !token.trim().is_empty() {
                        debug!("action: unknown token dropped");
                    }
                }
            }
        }
        Action::Press(keys)
    }
}

/// Run `action` against `keyboard`. Transport errors are logged and the
/// rest of the action still runs.
pub fn dispatch<K: Keyboard>(action: &str, keyboard: &mut K) {
    match Action::parse(action) {
        Action::Type(text) => {
            for c in text.chars() {
                if keyboard.type_character(c).is_err() {
                    warn!("action: could not type character");
                }
            }
            if keyboard.release_all().is_err() {
                warn!("action: release failed");
            }
        }
        Action::Press(keys) => {
            if keys.is_empty() {
                return;
            }
            for key in keys {
                if keyboard.press_key(key).is_err() {
                    warn!("action: key press refused");
                }
            }
            if keyboard.release_all().is_err() {
                warn!("action: release failed");
            }
        }
    }
}

/// Maps button edges to their configured actions.
pub struct ActionDispatcher {
    actions: [ActionString; HALL_BUTTON_COUNT],
}

impl ActionDispatcher {
    pub fn new(actions: [ActionString; HALL_BUTTON_COUNT]) -> Self {
        Self { actions }
    }

    pub fn action(&self, button: Button) -> &str {
        &self.actions[button.index()]
    }

    /// Replace one button's action (e.g. after a settings change).
    pub fn set_action(&mut self, button: Button, action: ActionString) {
        self.actions[button.index()] = action;
    }

    /// Emit the action bound to `button`.
    pub fn dispatch<K: Keyboard>(&self, button: Button, keyboard: &mut K) {
        debug!("action: button {}", button.index());
        dispatch(self.action(button), keyboard);
    }
}
