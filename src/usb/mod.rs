//! USB Device subsystem - presents a HID keyboard to the host.
//!
//! The nRF52840's built-in USB 2.0 Full-Speed controller is driven by
//! `embassy-usb` with a single boot-protocol keyboard interface.
//!
//! The scan activity queues finished reports; the writer task drains
//! them to the endpoint.

pub mod hid_device;
