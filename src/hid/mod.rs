//! HID keyboard layer: key vocabulary, report building and the keyboard
//! transport seam.

pub mod keyboard;

pub use keyboard::{
    ascii_usage, Keyboard, KeyToken, KeyboardReport, Modifier, ReportKeyboard, ReportSink,
    KEYBOARD_REPORT_SIZE,
};
