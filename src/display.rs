//! Status display: the screen set and how each screen is laid out.
//!
//! The panel itself sits behind the [`Display`] trait (an SSD1306 in
//! firmware). Rendering is fail-open: a failed draw is logged and the
//! caller's state machine carries on.

use core::fmt::Write;

use heapless::String;

use crate::calibration::WizardPrompt;
use crate::config::{HALL_BUTTON_COUNT, SENSOR_SCREEN_INTERVAL_MS};
use crate::error::Result;
use crate::input::Button;

/// Panel width in pixels.
pub const DISPLAY_WIDTH: i32 = 128;

/// Font selection for [`Display::set_text`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TextSize {
    /// 6×10 px cells, 21 columns.
    Small,
    /// 10×20 px cells, 12 columns.
    Large,
}

impl TextSize {
    pub const fn line_height(self) -> i32 {
        match self {
            TextSize::Small => 10,
            TextSize::Large => 20,
        }
    }

    pub const fn char_width(self) -> i32 {
        match self {
            TextSize::Small => 6,
            TextSize::Large => 10,
        }
    }
}

/// Draw-command sink. Coordinates are the top-left corner in pixels.
pub trait Display {
    fn clear(&mut self) -> Result<()>;
    fn set_text(&mut self, x: i32, y: i32, text: &str, size: TextSize) -> Result<()>;
    /// 1 bpp, row-major, MSB first; `width` is a multiple of 8.
    fn draw_bitmap(&mut self, x: i32, y: i32, width: u32, bitmap: &[u8]) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
}

impl<T: Display + ?Sized> Display for &mut T {
    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }
    fn set_text(&mut self, x: i32, y: i32, text: &str, size: TextSize) -> Result<()> {
        (**self).set_text(x, y, text, size)
    }
    fn draw_bitmap(&mut self, x: i32, y: i32, width: u32, bitmap: &[u8]) -> Result<()> {
        (**self).draw_bitmap(x, y, width, bitmap)
    }
    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Everything the device can show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Screen {
    BootLogo,
    /// Knob angle and the last raw value of every hall channel.
    Sensors {
        angle: u16,
        raw: [u16; HALL_BUTTON_COUNT],
    },
    /// Calibration wizard step for one button.
    CalibrationLive {
        button: Button,
        prompt: WizardPrompt,
        raw: u16,
    },
    /// Calibrated range of one button.
    CalibrationSummary { button: Button, min: u16, max: u16 },
    TimerSet { minutes: u32 },
    TimerRunning { minutes: u32, seconds: u32 },
    TimerPaused { minutes: u32, seconds: u32 },
    /// `minutes` is the length of the timer that just ran out.
    TimerOver { minutes: u32 },
}

/// 16×16 hourglass shown at boot.
const LOGO: [u8; 32] = [
    0xFF, 0xFF, 0x80, 0x01, 0x40, 0x02, 0x20, 0x04, 0x10, 0x08, 0x08, 0x10, 0x04, 0x20, 0x02,
    0x40, 0x02, 0x40, 0x04, 0x20, 0x08, 0x10, 0x10, 0x08, 0x20, 0x04, 0x40, 0x02, 0x80, 0x01,
    0xFF, 0xFF,
];

type Line = String<24>;

fn line(args: core::fmt::Arguments<'_>) -> Line {
    let mut s = Line::new();
    // Lines are sized for the panel; overflow only truncates.
    let _ = s.write_fmt(args);
    s
}

/// Draw `screen` into `display` and flush.
pub fn render<D: Display>(display: &mut D, screen: &Screen) -> Result<()> {
    use TextSize::{Large, Small};

    display.clear()?;
    match *screen {
        Screen::BootLogo => {
            display.draw_bitmap((DISPLAY_WIDTH - 16) / 2, 8, 16, &LOGO)?;
            display.set_text(34, 32, "KRONOS", Large)?;
        }
        Screen::Sensors { angle, raw } => {
            display.set_text(0, 0, "Sensor Readings:", Small)?;
            display.set_text(0, 10, &line(format_args!("Hall Angle: {}", angle)), Small)?;
            for row in 0..HALL_BUTTON_COUNT / 2 {
                let (l, r) = (row * 2, row * 2 + 1);
                let (ll, rl) = (label(l), label(r));
                let text = line(format_args!("{}: {} {}: {}", ll, raw[l], rl, raw[r]));
                display.set_text(0, 20 + 10 * row as i32, &text, Small)?;
            }
        }
        Screen::CalibrationLive {
            button,
            prompt,
            raw,
        } => {
            let n = button.index() + 1;
            let title = match prompt {
                WizardPrompt::Press => line(format_args!("PRESS BTN {}", n)),
                WizardPrompt::FullyPress => line(format_args!("FULLY PRESS")),
                WizardPrompt::Calibrating => line(format_args!("CALIBRATING")),
                WizardPrompt::Checked => line(format_args!("HALL {} CHK", n)),
            };
            display.set_text(0, 0, &title, Large)?;
            display.set_text(0, 20, &line(format_args!("{}", raw)), Large)?;
        }
        Screen::CalibrationSummary { button, min, max } => {
            display.set_text(0, 0, &line(format_args!("HALL {}", button.index() + 1)), Large)?;
            display.set_text(0, 20, &line(format_args!("Max:{}", max)), Large)?;
            display.set_text(0, 40, &line(format_args!("Min:{}", min)), Large)?;
        }
        Screen::TimerSet { minutes } => {
            display.set_text(0, 8, &line(format_args!("{} M", minutes)), Large)?;
            display.set_text(0, 54, "Confirm       Cancel", Small)?;
        }
        Screen::TimerRunning { minutes, seconds } => {
            display.set_text(0, 0, "Time Left:", Small)?;
            display.set_text(0, 16, &line(format_args!("{}M {}S", minutes, seconds)), Large)?;
            display.set_text(0, 54, "Pause       Cancel", Small)?;
        }
        Screen::TimerPaused { minutes, seconds } => {
            display.set_text(0, 0, "Paused:", Small)?;
            display.set_text(0, 16, &line(format_args!("{}M {}S", minutes, seconds)), Large)?;
            display.set_text(0, 54, "Resume      Cancel", Small)?;
        }
        Screen::TimerOver { minutes } => {
            display.set_text(0, 0, &line(format_args!("{}M Timer Over:", minutes)), Small)?;
            display.set_text(0, 16, "REST", Large)?;
            display.set_text(0, 54, "OK          Cancel", Small)?;
        }
    }
    display.flush()
}

fn label(index: usize) -> &'static str {
    Button::from_index(index).map_or("??", Button::label)
}

/// Display owner that skips redundant redraws and throttles the sensor
/// screen.
pub struct StatusDisplay<D> {
    display: D,
    shown: Option<Screen>,
    sensors_drawn_at: Option<u32>,
}

impl<D: Display> StatusDisplay<D> {
    pub fn new(display: D) -> Self {
        Self {
            display,
            shown: None,
            sensors_drawn_at: None,
        }
    }

    /// Show `screen` unless it is already up. Live sensor values refresh
    /// at most every [`SENSOR_SCREEN_INTERVAL_MS`].
    pub fn show(&mut self, now_ms: u32, screen: Screen) {
        if self.shown == Some(screen) {
            return;
        }
        if let (Screen::Sensors { .. }, Some(Screen::Sensors { .. }), Some(at)) =
            (screen, self.shown, self.sensors_drawn_at)
        {
            if now_ms.wrapping_sub(at) < SENSOR_SCREEN_INTERVAL_MS {
                return;
            }
        }

        match render(&mut self.display, &screen) {
            Ok(()) => {}
            Err(_e) => warn!("display: render failed"),
        }
        // Recorded even on failure so a broken panel is not hammered.
        self.shown = Some(screen);
        if let Screen::Sensors { .. } = screen {
            self.sensors_drawn_at = Some(now_ms);
        }
    }

    /// Forget what is on screen so the next [`Self::show`] redraws.
    pub fn invalidate(&mut self) {
        self.shown = None;
    }

    pub fn shown(&self) -> Option<Screen> {
        self.shown
    }

    pub fn display(&self) -> &D {
        &self.display
    }
}
