//! Rotary knob on a 12-bit absolute angle sensor (AS5600).
//!
//! The knob serves two UI needs from one sample: [`RotaryKnob::scan_map_angle`]
//! maps a single read into two output ranges at once, so choosing a
//! timer slot and a brightness in the same tick costs one bus
//! transaction instead of two.
//!
//! Direction detection measures the shortest arc between the baseline
//! and the new angle, so crossing the 4095 → 0 seam counts as a small
//! move rather than a near-full turn.

use crate::config::{KNOB_FULL_SCALE, KNOB_PRECISION_TABLE};
use crate::hal::AngleSensor;

/// Result of [`RotaryKnob::check_rotation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    Stationary,
    Forward,
    Reverse,
}

/// Which of the two [`RotaryKnob::scan_map_angle`] outputs to return.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MapSelect {
    First,
    Second,
}

/// Angle sensor wrapper with precision scaling and coarse direction
/// detection.
pub struct RotaryKnob<S> {
    sensor: S,
    precision: u8,
    last_angle: u16,
    baseline: u16,
    mapped: (u16, u16),
}

/// Rescale a raw angle into `0..range`.
fn map_angle(angle: u16, range: u16) -> u16 {
    let angle = u32::from(angle % KNOB_FULL_SCALE);
    (angle * u32::from(range) / u32::from(KNOB_FULL_SCALE)) as u16
}

impl<S: AngleSensor> RotaryKnob<S> {
    pub fn new(sensor: S) -> Self {
        Self {
            sensor,
            precision: 3,
            last_angle: 0,
            baseline: 0,
            mapped: (0, 0),
        }
    }

    /// Raw angle `0..=4095`; the last good angle if the read fails.
    pub fn read_raw_angle(&mut self) -> u16 {
        match self.sensor.read_angle() {
            Ok(angle) => self.last_angle = angle % KNOB_FULL_SCALE,
            Err(_e) => warn!("knob: read failed, keeping {}", self.last_angle),
        }
        self.last_angle
    }

    /// Select an output resolution; out-of-range indices are clamped.
    pub fn set_precision(&mut self, index: u8) {
        let last = (KNOB_PRECISION_TABLE.len() - 1) as u8;
        self.precision = index.min(last);
    }

    pub fn resolution(&self) -> u16 {
        KNOB_PRECISION_TABLE[usize::from(self.precision)]
    }

    /// Angle rescaled into the configured resolution.
    pub fn read_calibrated_angle(&mut self) -> u16 {
        let angle = self.read_raw_angle();
        map_angle(angle, self.resolution())
    }

    /// One sample mapped into `0..range_a` and `0..range_b`; returns the
    /// selected one. Both results stay available through [`Self::mapped`].
    pub fn scan_map_angle(&mut self, range_a: u16, range_b: u16, select: MapSelect) -> u16 {
        let angle = self.read_raw_angle();
        self.mapped = (map_angle(angle, range_a), map_angle(angle, range_b));
        match select {
            MapSelect::First => self.mapped.0,
            MapSelect::Second => self.mapped.1,
        }
    }

    /// Both outputs of the latest [`Self::scan_map_angle`] call.
    pub fn mapped(&self) -> (u16, u16) {
        self.mapped
    }

    /// Latch the current angle as the rotation baseline.
    pub fn start_rotation_check(&mut self) {
        self.baseline = self.read_raw_angle();
    }

    /// Compare the latest angle to the baseline.
    ///
    /// Moves of `hysteresis` counts or less report `Stationary` and leave
    /// the baseline alone, so jitter cannot creep into a false report.
    pub fn check_rotation(&mut self, hysteresis: u16) -> Rotation {
        let angle = self.read_raw_angle();
        let delta = shortest_arc(self.baseline, angle);
        let band = i32::from(hysteresis);
        let rotation = if delta > band {
            Rotation::Forward
        } else if delta < -band {
            Rotation::Reverse
        } else {
            Rotation::Stationary
        };
        if rotation != Rotation::Stationary {
            self.baseline = angle;
        }
        rotation
    }

    pub fn baseline(&self) -> u16 {
        self.baseline
    }

    pub fn last_angle(&self) -> u16 {
        self.last_angle
    }
}

/// Signed distance from `from` to `to` on the sensor circle, in
/// `-2048..2048`.
fn shortest_arc(from: u16, to: u16) -> i32 {
    let full = i32::from(KNOB_FULL_SCALE);
    let raw = (i32::from(to) - i32::from(from)).rem_euclid(full);
    if raw >= full / 2 {
        raw - full
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};

    struct FakeSensor {
        angle: Option<u16>,
        reads: u32,
    }

    impl FakeSensor {
        fn at(angle: u16) -> Self {
            Self {
                angle: Some(angle),
                reads: 0,
            }
        }
    }

    impl AngleSensor for FakeSensor {
        fn read_angle(&mut self) -> Result<u16> {
            self.reads += 1;
            self.angle.ok_or(Error::Bus)
        }
    }

    #[test]
    fn calibrated_angle_uses_precision_table() {
        let mut knob = RotaryKnob::new(FakeSensor::at(2048));
        knob.set_precision(5);
        assert_eq!(knob.read_calibrated_angle(), 2048);
        knob.set_precision(1);
        assert_eq!(knob.read_calibrated_angle(), 127);
        knob.set_precision(9);
        assert_eq!(knob.resolution(), 4096);
    }

    #[test]
    fn scan_map_angle_takes_one_sample_for_two_ranges() {
        let mut knob = RotaryKnob::new(FakeSensor::at(4095));
        let minutes = knob.scan_map_angle(12, 255, MapSelect::First);
        assert_eq!(minutes, 11);
        assert_eq!(knob.mapped(), (11, 254));
        assert_eq!(knob.sensor.reads, 1);

        knob.sensor.angle = Some(0);
        assert_eq!(knob.scan_map_angle(12, 255, MapSelect::Second), 0);
    }

    #[test]
    fn rotation_reports_direction_and_moves_baseline() {
        let mut knob = RotaryKnob::new(FakeSensor::at(1000));
        knob.start_rotation_check();

        knob.sensor.angle = Some(1050);
        assert_eq!(knob.check_rotation(100), Rotation::Stationary);
        assert_eq!(knob.baseline(), 1000);

        knob.sensor.angle = Some(1200);
        assert_eq!(knob.check_rotation(100), Rotation::Forward);
        assert_eq!(knob.baseline(), 1200);

        knob.sensor.angle = Some(1000);
        assert_eq!(knob.check_rotation(100), Rotation::Reverse);
        assert_eq!(knob.baseline(), 1000);
    }

    #[test]
    fn jitter_never_accumulates() {
        let mut knob = RotaryKnob::new(FakeSensor::at(2000));
        knob.start_rotation_check();
        for step in 0..50u16 {
            knob.sensor.angle = Some(2000 + (step % 2) * 90);
            assert_eq!(knob.check_rotation(100), Rotation::Stationary);
        }
        assert_eq!(knob.baseline(), 2000);
    }

    #[test]
    fn jitter_across_the_seam_is_stationary() {
        let mut knob = RotaryKnob::new(FakeSensor::at(4090));
        knob.start_rotation_check();
        knob.sensor.angle = Some(20);
        assert_eq!(knob.check_rotation(100), Rotation::Stationary);
        knob.sensor.angle = Some(4000);
        assert_eq!(knob.check_rotation(100), Rotation::Stationary);
    }

    #[test]
    fn failed_read_keeps_last_angle() {
        let mut knob = RotaryKnob::new(FakeSensor::at(321));
        assert_eq!(knob.read_raw_angle(), 321);
        knob.sensor.angle = None;
        assert_eq!(knob.read_raw_angle(), 321);
        assert_eq!(knob.last_angle(), 321);
    }

    #[test]
    fn shortest_arc_wraps() {
        assert_eq!(shortest_arc(10, 20), 10);
        assert_eq!(shortest_arc(20, 10), -10);
        assert_eq!(shortest_arc(4090, 5), 11);
        assert_eq!(shortest_arc(5, 4090), -11);
    }
}
