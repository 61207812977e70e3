//! SSD1306 OLED display wrapper.

use embedded_graphics::image::{Image, ImageRaw};
use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10};
use embedded_graphics::mono_font::{MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use kronos::display::{Display, TextSize};
use kronos::{Error, Result};
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::I2CDisplayInterface;
use ssd1306::Ssd1306;

/// Type alias for the concrete display driver.
///
/// Generic over the I²C implementation so callers pass in their HAL's
/// I²C peripheral.
pub type Driver<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

/// The status panel.
pub struct Oled<I2C> {
    driver: Driver<I2C>,
}

/// Initialise the SSD1306 display and clear the screen.
pub fn init<I2C>(i2c: I2C) -> Oled<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    let interface = I2CDisplayInterface::new(i2c);
    let mut driver = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
        .into_buffered_graphics_mode();
    if driver.init().is_err() {
        defmt::warn!("OLED init failed");
    }
    driver.clear_buffer();
    let _ = driver.flush();
    Oled { driver }
}

fn text_style(size: TextSize) -> MonoTextStyle<'static, BinaryColor> {
    let font = match size {
        TextSize::Small => &FONT_6X10,
        TextSize::Large => &FONT_10X20,
    };
    MonoTextStyleBuilder::new()
        .font(font)
        .text_color(BinaryColor::On)
        .build()
}

impl<I2C> Display for Oled<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    fn clear(&mut self) -> Result<()> {
        self.driver.clear_buffer();
        Ok(())
    }

    fn set_text(&mut self, x: i32, y: i32, text: &str, size: TextSize) -> Result<()> {
        Text::with_baseline(text, Point::new(x, y), text_style(size), Baseline::Top)
            .draw(&mut self.driver)
            .map(|_| ())
            .map_err(|_| Error::Display)
    }

    fn draw_bitmap(&mut self, x: i32, y: i32, width: u32, bitmap: &[u8]) -> Result<()> {
        let raw = ImageRaw::<BinaryColor>::new(bitmap, width);
        Image::new(&raw, Point::new(x, y))
            .draw(&mut self.driver)
            .map_err(|_| Error::Display)
    }

    fn flush(&mut self) -> Result<()> {
        self.driver.flush().map_err(|_| Error::Display)
    }
}
