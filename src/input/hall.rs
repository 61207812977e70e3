//! Hall-effect button channel with live auto-ranging calibration.
//!
//! Each button is a magnet over an analog hall sensor read through an
//! external ADC. The channel keeps the lowest and highest sample it has
//! ever seen and rescales new samples into a fixed resolution picked
//! from [`HALL_PRECISION_TABLE`]. Calibration never stops: every
//! calibrating read can widen the observed range.
//!
//! A failed bus read is not an error at this layer. The channel keeps
//! reporting the last sample it managed to take.

use crate::config::{HALL_DEFAULT_PRECISION, HALL_PRECISION_TABLE, HALL_RAW_TRIGGER};
use crate::hal::HallAdc;

/// How [`HallChannel::is_triggered`] decides that a button is pressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerMode {
    /// Compare a calibrating raw sample against [`HALL_RAW_TRIGGER`].
    ///
    /// Coarse and precision-independent; used while calibrating.
    Raw,
    /// Compare the quantized reading against half scale.
    Quantized,
}

/// One analog button bound to an ADC channel.
pub struct HallChannel<A> {
    adc: A,
    selector: u8,
    sub_channel: u8,
    cal_min: u16,
    cal_max: u16,
    precision: u8,
    trig_point: u16,
    last_raw: u16,
}

impl<A: HallAdc> HallChannel<A> {
    /// Bind a channel to `sub_channel` of the ADC picked by `selector`.
    pub fn new(adc: A, selector: u8, sub_channel: u8) -> Self {
        let mut channel = Self {
            adc,
            selector,
            sub_channel,
            cal_min: u16::MAX,
            cal_max: 0,
            precision: 0,
            trig_point: 0,
            last_raw: 0,
        };
        channel.set_precision(HALL_DEFAULT_PRECISION);
        channel
    }

    /// Instantaneous sample; the last good sample if the bus read fails.
    pub fn raw_read(&mut self) -> u16 {
        match self.adc.read_channel(self.selector, self.sub_channel) {
            Ok(value) => self.last_raw = value,
            Err(_e) => {
                warn!(
                    "hall {}/{}: read failed, keeping {}",
                    self.selector, self.sub_channel, self.last_raw
                );
            }
        }
        self.last_raw
    }

    /// Take one sample and widen the calibration range with it.
    pub fn calibrate(&mut self) -> u16 {
        let value = self.raw_read();
        if value < self.cal_min {
            self.cal_min = value;
        }
        if value > self.cal_max {
            self.cal_max = value;
        }
        value
    }

    /// Take one sample and rescale it into `[0, resolution)`.
    ///
    /// Without a calibration spread there is nothing to scale against:
    /// the read is used to calibrate instead and the result is `0`.
    pub fn quantized_read(&mut self) -> u16 {
        if self.cal_min >= self.cal_max {
            self.calibrate();
            return 0;
        }

        let value = self.raw_read().clamp(self.cal_min, self.cal_max);
        let offset = u32::from(value - self.cal_min);
        let span = u32::from(self.cal_max - self.cal_min) + 1;
        (offset * u32::from(self.resolution()) / span) as u16
    }

    /// Whether the button currently reads as pressed.
    pub fn is_triggered(&mut self, mode: TriggerMode) -> bool {
        match mode {
            TriggerMode::Raw => self.calibrate() > HALL_RAW_TRIGGER,
            TriggerMode::Quantized => self.quantized_read() > self.trig_point,
        }
    }

    /// Select a resolution from the precision table. Out-of-range
    /// indices are clamped to the last entry.
    pub fn set_precision(&mut self, index: u8) {
        let last = (HALL_PRECISION_TABLE.len() - 1) as u8;
        self.precision = index.min(last);
        self.trig_point = self.resolution() / 2;
    }

    /// Current quantization resolution.
    pub fn resolution(&self) -> u16 {
        HALL_PRECISION_TABLE[usize::from(self.precision)]
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn trig_point(&self) -> u16 {
        self.trig_point
    }

    /// Lowest sample seen so far (`u16::MAX` before the first sample).
    pub fn cal_min(&self) -> u16 {
        self.cal_min
    }

    /// Highest sample seen so far (`0` before the first sample).
    pub fn cal_max(&self) -> u16 {
        self.cal_max
    }

    /// Whether at least one calibrating sample has been taken.
    pub fn has_samples(&self) -> bool {
        self.cal_min <= self.cal_max
    }

    /// Most recent sample, for the sensor screen.
    pub fn last_raw(&self) -> u16 {
        self.last_raw
    }

    /// `(selector, sub_channel)` this channel is bound to.
    pub fn binding(&self) -> (u8, u8) {
        (self.selector, self.sub_channel)
    }
}
