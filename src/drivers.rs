//! Blocking I²C drivers for the sensor bus.
//!
//! Two ADS1115 ADCs (hall buttons) and an AS5600 (knob) share one bus
//! with the SSD1306. All of them go through the same [`SharedBus`]; the
//! display gets a [`SharedI2c`] handle that locks per transaction.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal::i2c::{ErrorType, I2c, Operation};
use kronos::config::{ADC1_ADDR, ADC2_ADDR, ANGLE_SENSOR_ADDR};
use kronos::hal::{AngleSensor, HallAdc, SharedBus};
use kronos::{Error, Result};

// ADS1115 registers
const ADS_REG_CONVERSION: u8 = 0x00;
const ADS_REG_CONFIG: u8 = 0x01;

// ADS1115 config: start single conversion, ±4.096 V, single-shot,
// 860 SPS, comparator off.
const ADS_OS_START: u16 = 1 << 15;
const ADS_PGA_4V096: u16 = 0b001 << 9;
const ADS_MODE_SINGLE: u16 = 1 << 8;
const ADS_DR_860SPS: u16 = 0b111 << 5;
const ADS_COMP_DISABLE: u16 = 0b11;

/// Status polls before a conversion counts as lost (~50 µs each at 400 kHz).
const ADS_READY_POLLS: u8 = 40;

// AS5600 raw angle register (12 bits, big-endian)
const AS5600_REG_RAW_ANGLE: u8 = 0x0C;

/// Everything on the sensor bus.
pub struct SensorBus<I> {
    i2c: I,
}

impl<I: I2c> SensorBus<I> {
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    fn ads_write_config(&mut self, addr: u8, config: u16) -> Result<()> {
        let [hi, lo] = config.to_be_bytes();
        self.i2c
            .write(addr, &[ADS_REG_CONFIG, hi, lo])
            .map_err(|_| Error::Bus)
    }

    fn ads_read(&mut self, addr: u8, reg: u8) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(addr, &[reg], &mut buf)
            .map_err(|_| Error::Bus)?;
        Ok(u16::from_be_bytes(buf))
    }
}

impl<I: I2c> HallAdc for SensorBus<I> {
    fn read_channel(&mut self, selector: u8, sub_channel: u8) -> Result<u16> {
        let addr = match selector {
            1 => ADC1_ADDR,
            2 => ADC2_ADDR,
            _ => return Err(Error::NoSuchChannel),
        };
        if sub_channel > 3 {
            return Err(Error::NoSuchChannel);
        }

        // Single-ended AINx against GND: MUX = 0b100 + channel.
        let mux = (0b100 | u16::from(sub_channel)) << 12;
        let config =
            ADS_OS_START | mux | ADS_PGA_4V096 | ADS_MODE_SINGLE | ADS_DR_860SPS | ADS_COMP_DISABLE;
        self.ads_write_config(addr, config)?;

        for _ in 0..ADS_READY_POLLS {
            if self.ads_read(addr, ADS_REG_CONFIG)? & ADS_OS_START != 0 {
                let raw = self.ads_read(addr, ADS_REG_CONVERSION)? as i16;
                // Single-ended readings are never meaningfully negative.
                return Ok(raw.max(0) as u16);
            }
        }
        Err(Error::Bus)
    }
}

impl<I: I2c> AngleSensor for SensorBus<I> {
    fn read_angle(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(ANGLE_SENSOR_ADDR, &[AS5600_REG_RAW_ANGLE], &mut buf)
            .map_err(|_| Error::Bus)?;
        Ok(u16::from_be_bytes(buf) & 0x0FFF)
    }
}

/// Plain I²C handle onto the shared bus, for the display driver.
pub struct SharedI2c<'a, M: RawMutex, I> {
    bus: &'a SharedBus<M, SensorBus<I>>,
}

impl<'a, M: RawMutex, I> SharedI2c<'a, M, I> {
    pub fn new(bus: &'a SharedBus<M, SensorBus<I>>) -> Self {
        Self { bus }
    }
}

impl<M: RawMutex, I: I2c> ErrorType for SharedI2c<'_, M, I> {
    type Error = I::Error;
}

impl<M: RawMutex, I: I2c> I2c for SharedI2c<'_, M, I> {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> core::result::Result<(), Self::Error> {
        self.bus
            .transaction(|devices| devices.i2c.transaction(address, operations))
    }
}
