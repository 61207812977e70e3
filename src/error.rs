//! Unified error type for the KRONOS core.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Nothing in the core treats these as fatal: each collaborator failure
//! is logged and the state machines keep running on the last known
//! values.

/// Top-level error type returned by the hardware and storage seams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Sensors
    /// I²C transaction to an ADC or the angle sensor failed.
    Bus,

    /// The selector / sub-channel pair names no physical input.
    NoSuchChannel,

    // Storage
    /// Settings store read/write failed.
    Storage,

    // Outputs
    /// Display transaction failed.
    Display,

    /// Keyboard transport refused a report.
    Keyboard,

    /// LED strip write failed.
    Led,

    // Generic
    /// Buffer too small for the requested operation.
    BufferOverflow,
}

/// Convenience alias used across the crate.
pub type Result<T> = core::result::Result<T, Error>;
