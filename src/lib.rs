//! Input-and-feedback core for the KRONOS macro keyboard.
//!
//! Everything here is hardware-independent and runs on the host:
//! sensors, debouncing, the countdown timer, the LED meter, the menu and
//! the action dispatcher. Hardware sits behind the traits in [`hal`],
//! [`display`], [`hid`] and [`settings`].
//!
//! Usage: `cargo test --lib`
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main]
//! and links this library for all of its logic.

#![cfg_attr(not(test), no_std)]

// Must come first so every module sees the logging macros.
#[macro_use]
mod fmt;

pub mod action;
pub mod calibration;
pub mod config;
pub mod display;
pub mod error;
pub mod hal;
pub mod hid;
pub mod input;
pub mod menu;
pub mod meter;
pub mod scan;
pub mod settings;
pub mod timer;

pub use error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════
// Cross-module tests
// ═══════════════════════════════════════════════════════════════════════════
