//! LED progress meter on the 5×15 "screen" grid.
//!
//! The fill level is a fixed-point value with 8 fractional bits over the
//! row count (`rows * 256` is full). Whole rows are lit at full
//! brightness and the next row fades linearly with the fractional part,
//! so the meter drains smoothly instead of in row-sized steps.
//!
//! ## Physical layout
//!
//! The strip snakes through the grid column by column (IDs are 1-based,
//! as printed on the board):
//!
//! ```text
//!  col:   0    1    2    3    4
//!  top:   1   30   31   60   61
//!         2   29   32   59   62
//!         …    …    …    …    …
//!  bot:  15   16   45   46   75
//! ```
//!
//! Even columns run top-to-bottom, odd columns bottom-to-top.

use smart_leds::colors::{BLACK, BLUE, WHITE, YELLOW};
use smart_leds::hsv::{hsv2rgb, Hsv};
use smart_leds::{brightness, SmartLedsWrite, RGB8};

use crate::config::{METER_MIN_UPDATE_MS, METER_SETTING_FULL_SCALE_MIN};
use crate::error::Error;

/// Hue of the bottom (fullest) row in gradient style: green.
const GRADIENT_HUE_BOTTOM: u16 = 85;

/// Base colour selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MeterStyle {
    /// Uniform white.
    White,
    /// Green→red by row while running, blue while setting, yellow while paused.
    Gradient,
}

impl MeterStyle {
    /// Decode the persisted style byte; unknown values fall back to white.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => MeterStyle::Gradient,
            _ => MeterStyle::White,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            MeterStyle::White => 0,
            MeterStyle::Gradient => 1,
        }
    }
}

/// What the meter is showing; picks the gradient colours.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MeterMode {
    None,
    Setting,
    Running,
    Paused,
}

/// What the menu wants the meter to show this cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MeterCommand {
    Clear,
    /// Minutes being selected, before the timer starts.
    Minutes(u32),
    Remaining {
        remaining_ms: u32,
        total_ms: u32,
        mode: MeterMode,
    },
    /// Whole grid in one colour (timer over).
    Alert(RGB8),
}

/// Fill level for `remaining_ms` out of `total_ms`, or `None` when there
/// is no total to divide by.
pub fn level256_from_remaining(remaining_ms: u32, total_ms: u32, rows: u8) -> Option<u16> {
    if total_ms == 0 {
        return None;
    }
    let raw = u64::from(remaining_ms) * u64::from(rows) * 256 / u64::from(total_ms);
    Some(clamp_level(raw, rows))
}

/// Fill level for the setting screen: minutes against a 60-minute scale.
pub fn level256_from_minutes(minutes: u32, rows: u8) -> u16 {
    let minutes = minutes.min(METER_SETTING_FULL_SCALE_MIN);
    let raw = u64::from(minutes) * u64::from(rows) * 256 / u64::from(METER_SETTING_FULL_SCALE_MIN);
    clamp_level(raw, rows)
}

fn clamp_level(raw: u64, rows: u8) -> u16 {
    raw.min(u64::from(rows) * 256) as u16
}

/// Strip index for a grid cell (`row_top` counts from the top), following
/// the serpentine wiring. `None` for cells outside the grid.
pub fn led_index(row_top: u8, col: u8, rows: u8, cols: u8) -> Option<usize> {
    if row_top >= rows || col >= cols {
        return None;
    }
    let base = usize::from(col) * usize::from(rows);
    let offset = if col % 2 == 0 {
        usize::from(row_top)
    } else {
        usize::from(rows - 1 - row_top)
    };
    Some(base + offset)
}

/// Scale a channel like a video fade: a lit channel never drops to zero.
fn scale_video(channel: u8, scale: u8) -> u8 {
    let scaled = (u16::from(channel) * u16::from(scale)) >> 8;
    let floor = u16::from(channel != 0 && scale != 0);
    (scaled + floor).min(255) as u8
}

fn dim(color: RGB8, scale: u8) -> RGB8 {
    RGB8::new(
        scale_video(color.r, scale),
        scale_video(color.g, scale),
        scale_video(color.b, scale),
    )
}

/// LED meter renderer over a strip of `N` LEDs.
pub struct LedMeter<W, const N: usize> {
    strip: W,
    frame: [RGB8; N],
    rows: u8,
    cols: u8,
    style: MeterStyle,
    brightness_cap: u8,
    level: u16,
    mode: MeterMode,
    filled: Option<RGB8>,
    last_update_ms: Option<u32>,
}

impl<W, const N: usize> LedMeter<W, N>
where
    W: SmartLedsWrite<Color = RGB8>,
{
    pub fn new(strip: W, rows: u8, cols: u8) -> Self {
        Self {
            strip,
            frame: [BLACK; N],
            rows,
            cols,
            style: MeterStyle::White,
            brightness_cap: 255,
            level: 0,
            mode: MeterMode::None,
            filled: None,
            last_update_ms: None,
        }
    }

    pub fn set_style(&mut self, style: MeterStyle) {
        self.style = style;
    }

    pub fn style(&self) -> MeterStyle {
        self.style
    }

    /// Global brightness cap applied when the frame is written (1–255).
    pub fn set_brightness_cap(&mut self, cap: u8) {
        self.brightness_cap = cap.max(1);
    }

    pub fn brightness_cap(&self) -> u8 {
        self.brightness_cap
    }

    /// Last rendered fill level.
    pub fn level(&self) -> u16 {
        self.level
    }

    /// Last rendered mode.
    pub fn mode(&self) -> MeterMode {
        self.mode
    }

    /// Current frame in strip order, before the brightness cap.
    pub fn frame(&self) -> &[RGB8] {
        &self.frame
    }

    pub fn strip(&self) -> &W {
        &self.strip
    }

    /// Show the time left. Rate-limited; a zero total clears the meter.
    pub fn update_from_remaining(
        &mut self,
        now_ms: u32,
        remaining_ms: u32,
        total_ms: u32,
        mode: MeterMode,
    ) {
        if !self.take_update_slot(now_ms) {
            return;
        }
        match level256_from_remaining(remaining_ms, total_ms, self.rows) {
            Some(level) => self.set_level(level, mode, false),
            None => self.clear(false),
        }
    }

    /// Show the minutes being selected on the setting screen. Rate-limited.
    pub fn update_from_minutes(&mut self, now_ms: u32, minutes: u32) {
        if !self.take_update_slot(now_ms) {
            return;
        }
        let level = level256_from_minutes(minutes, self.rows);
        self.set_level(level, MeterMode::Setting, false);
    }

    /// Turn every LED off. Skipped when already clear unless `force`.
    pub fn clear(&mut self, force: bool) {
        if !force && self.mode == MeterMode::None && self.level == 0 && self.filled.is_none() {
            return;
        }
        self.frame = [BLACK; N];
        self.level = 0;
        self.mode = MeterMode::None;
        self.filled = None;
        self.show();
    }

    /// Light the whole strip in `color`. Skipped when already showing it.
    pub fn fill(&mut self, color: RGB8) {
        if self.filled == Some(color) {
            return;
        }
        self.frame = [color; N];
        self.level = 0;
        self.mode = MeterMode::None;
        self.filled = Some(color);
        self.show();
    }

    /// Carry out one menu cycle's command.
    pub fn apply(&mut self, now_ms: u32, command: MeterCommand) {
        match command {
            MeterCommand::Clear => self.clear(false),
            MeterCommand::Minutes(minutes) => self.update_from_minutes(now_ms, minutes),
            MeterCommand::Remaining {
                remaining_ms,
                total_ms,
                mode,
            } => self.update_from_remaining(now_ms, remaining_ms, total_ms, mode),
            MeterCommand::Alert(color) => self.fill(color),
        }
    }

    /// Paint `level` in `mode`. Skipped when nothing changed unless `force`.
    pub fn set_level(&mut self, level: u16, mode: MeterMode, force: bool) {
        let level = clamp_level(u64::from(level), self.rows);
        if !force && self.filled.is_none() && level == self.level && mode == self.mode {
            return;
        }

        let full_rows = level / 256;
        let partial = (level % 256) as u8;

        for row_from_bottom in 0..self.rows {
            let row_brightness = match u16::from(row_from_bottom).cmp(&full_rows) {
                core::cmp::Ordering::Less => 255,
                core::cmp::Ordering::Equal => partial,
                core::cmp::Ordering::Greater => 0,
            };

            let color = match row_brightness {
                0 => BLACK,
                255 => self.row_color(row_from_bottom, mode),
                b => dim(self.row_color(row_from_bottom, mode), b),
            };

            let row_top = self.rows - 1 - row_from_bottom;
            for col in 0..self.cols {
                match led_index(row_top, col, self.rows, self.cols) {
                    Some(idx) if idx < N => self.frame[idx] = color,
                    _ => {}
                }
            }
        }

        self.level = level;
        self.mode = mode;
        self.filled = None;
        self.show();
    }

    fn row_color(&self, row_from_bottom: u8, mode: MeterMode) -> RGB8 {
        match self.style {
            MeterStyle::White => WHITE,
            MeterStyle::Gradient => match mode {
                MeterMode::Running => {
                    let max_row = u16::from(self.rows.saturating_sub(1).max(1));
                    let r = u16::from(row_from_bottom).min(max_row);
                    let hue = GRADIENT_HUE_BOTTOM - GRADIENT_HUE_BOTTOM * r / max_row;
                    hsv2rgb(Hsv {
                        hue: hue as u8,
                        sat: 255,
                        val: 255,
                    })
                }
                MeterMode::Setting => BLUE,
                MeterMode::Paused => YELLOW,
                MeterMode::None => BLACK,
            },
        }
    }

    fn take_update_slot(&mut self, now_ms: u32) -> bool {
        if let Some(last) = self.last_update_ms {
            if now_ms.wrapping_sub(last) < METER_MIN_UPDATE_MS {
                return false;
            }
        }
        self.last_update_ms = Some(now_ms);
        true
    }

    fn show(&mut self) {
        if let Err(_e) = self.write_frame() {
            warn!("meter: strip write failed ({})", _e);
        }
    }

    /// Push the frame, scaled by the brightness cap, to the strip.
    fn write_frame(&mut self) -> crate::Result<()> {
        let frame = brightness(self.frame.iter().copied(), self.brightness_cap);
        self.strip.write(frame).map_err(|_| Error::Led)
    }
}
