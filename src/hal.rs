//! Hardware seams: raw sensor reads, the monotonic clock, and the
//! mutex-guarded bus accessor shared by the scan and menu activities.
//!
//! The two ADCs and the angle sensor hang off one I²C bus. Each read is
//! a multi-step bus transaction (select channel, wait, read back), so
//! two activities interleaving their transactions would corrupt both
//! samples. [`SharedBus`] holds its lock for exactly one transaction.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::error::Result;

/// Analog-to-digital front end for the hall buttons.
pub trait HallAdc {
    /// Read one single-ended sample from `sub_channel` of the ADC picked
    /// by `selector`.
    fn read_channel(&mut self, selector: u8, sub_channel: u8) -> Result<u16>;
}

/// Absolute angle sensor behind the rotary knob.
pub trait AngleSensor {
    /// Raw angle, `0..=4095`.
    fn read_angle(&mut self) -> Result<u16>;
}

/// Monotonic millisecond clock.
///
/// The counter is 32 bits wide and wraps after ~49.7 days; every
/// consumer uses wrapping arithmetic on its values.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

impl<T: HallAdc + ?Sized> HallAdc for &mut T {
    fn read_channel(&mut self, selector: u8, sub_channel: u8) -> Result<u16> {
        (**self).read_channel(selector, sub_channel)
    }
}

impl<T: AngleSensor + ?Sized> AngleSensor for &mut T {
    fn read_angle(&mut self) -> Result<u16> {
        (**self).read_angle()
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

/// Bus-connected devices shared between activities.
///
/// Every access goes through [`SharedBus::transaction`], which holds the
/// mutex for the duration of one closure call and no longer.
pub struct SharedBus<M: RawMutex, B> {
    inner: Mutex<M, RefCell<B>>,
}

impl<M: RawMutex, B> SharedBus<M, B> {
    /// Wrap the bus devices.
    pub const fn new(bus: B) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(bus)),
        }
    }

    /// Run one bus transaction with exclusive access.
    pub fn transaction<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Consume the wrapper and return the bus devices.
    pub fn into_inner(self) -> B {
        self.inner.into_inner().into_inner()
    }
}

/// A shared reference to the bus is itself an ADC: each read is one
/// locked transaction.
impl<M: RawMutex, B: HallAdc> HallAdc for &SharedBus<M, B> {
    fn read_channel(&mut self, selector: u8, sub_channel: u8) -> Result<u16> {
        self.transaction(|bus| bus.read_channel(selector, sub_channel))
    }
}

impl<M: RawMutex, B: AngleSensor> AngleSensor for &SharedBus<M, B> {
    fn read_angle(&mut self) -> Result<u16> {
        self.transaction(|bus| bus.read_angle())
    }
}
