//! Input subsystem - hall-effect buttons and the rotary knob.
//!
//! ## Components
//!
//! - **Hall channels**: six analog buttons on two ADS1115 ADCs
//! - **Debounce**: one shift-register filter per button
//! - **Rotary knob**: AS5600 absolute angle sensor

pub mod debounce;
pub mod hall;
pub mod rotary;

pub use debounce::DebounceFilter;
pub use hall::{HallChannel, TriggerMode};
pub use rotary::{MapSelect, RotaryKnob, Rotation};

use crate::config::{CANCEL_BUTTON, CONFIRM_BUTTON, HALL_BUTTON_COUNT};

/// The six physical buttons, in wiring order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    LeftTop,
    RightTop,
    LeftMid,
    RightMid,
    LeftBottom,
    RightBottom,
}

impl Button {
    pub const ALL: [Button; HALL_BUTTON_COUNT] = [
        Button::LeftTop,
        Button::RightTop,
        Button::LeftMid,
        Button::RightMid,
        Button::LeftBottom,
        Button::RightBottom,
    ];

    /// Index into per-button arrays (channels, filters, actions).
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Whether this button doubles as a timer-menu key.
    pub const fn is_menu_key(self) -> bool {
        let i = self.index();
        i == CONFIRM_BUTTON || i == CANCEL_BUTTON
    }

    /// Two-letter label used on the sensor screen.
    pub const fn label(self) -> &'static str {
        match self {
            Button::LeftTop => "LT",
            Button::RightTop => "RT",
            Button::LeftMid => "LM",
            Button::RightMid => "RM",
            Button::LeftBottom => "LB",
            Button::RightBottom => "RB",
        }
    }
}
