//! User interface hardware - the SSD1306 status panel.
//!
//! Screen layouts live in `kronos::display`; this module only puts
//! pixels on the panel.

pub mod display;
