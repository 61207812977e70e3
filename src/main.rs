//! KRONOS - hall-effect macro keyboard firmware (nRF52840).
//!
//! # Architecture
//!
//! ```text
//!  ┌────────────┐  I²C   ┌──────────────────────────┐  USB HID  ┌──────┐
//!  │ ADS1115 ×2 │◄──────►│        nRF52840          │──────────►│ Host │
//!  │ AS5600     │        │                          │           └──────┘
//!  │ SSD1306    │        │  scan_task  (2 ms)       │
//!  └────────────┘        │  menu_task  (25 ms)      │  SPI   ┌─────────┐
//!                        │  usb tasks               │───────►│ WS2812  │
//!                        └──────────────────────────┘        │ 5 × 15  │
//!                                                            └─────────┘
//! ```
//!
//! The scan task debounces the six hall buttons and fires their
//! actions; the menu task owns the knob, countdown, display and LED
//! meter. Both share the I²C bus through one [`SharedBus`].

#![no_std]
#![no_main]

mod drivers;
mod storage;
mod ui;
mod usb;

use defmt::info;
use defmt_rtt as _;
use panic_probe as _;

use embassy_embedded_hal::adapter::BlockingAsync;
use embassy_executor::Spawner;
use embassy_nrf::gpio::{Input, Pull};
use embassy_nrf::nvmc::Nvmc;
use embassy_nrf::spim::{self, Spim};
use embassy_nrf::twim::{self, Twim};
use embassy_nrf::{bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_time::{Instant, Timer};
use embassy_usb::class::hid::HidWriter;
use embassy_usb::UsbDevice;
use static_cell::StaticCell;
use ws2812_spi::Ws2812;

use kronos::action::ActionDispatcher;
use kronos::calibration::{CalibrationWizard, WizardPrompt, WizardStep};
use kronos::config::{
    BOOT_LOGO_MS, CALIBRATION_SUMMARY_MS, CONFIRM_BUTTON, KNOB_BOOT_PRECISION, MENU_PERIOD_MS,
    METER_COLS, METER_LED_COUNT, METER_ROWS, SCAN_PERIOD_MS,
};
use kronos::display::{Screen, StatusDisplay};
use kronos::hal::{Clock, SharedBus};
use kronos::hid::{ReportKeyboard, KEYBOARD_REPORT_SIZE};
use kronos::input::{RotaryKnob, TriggerMode};
use kronos::menu::MenuActivity;
use kronos::meter::LedMeter;
use kronos::scan::{MenuLink, ScanActivity, SensorSnapshot};
use kronos::settings::DeviceSettings;

use crate::drivers::{SensorBus, SharedI2c};
use crate::ui::display::{self as oled, Oled};
use crate::usb::hid_device::{self, QueueSink, UsbDriver};

bind_interrupts!(struct Irqs {
    SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0 => twim::InterruptHandler<peripherals::TWISPI0>;
    SPIM3 => spim::InterruptHandler<peripherals::SPI3>;
});

type I2cBus = Twim<'static, peripherals::TWISPI0>;
type Bus = SharedBus<ThreadModeRawMutex, SensorBus<I2cBus>>;
type Panel = Oled<SharedI2c<'static, ThreadModeRawMutex, I2cBus>>;
type Strip = Ws2812<Spim<'static, peripherals::SPI3>>;
type Scan = ScanActivity<&'static Bus>;
type Menu = MenuActivity<&'static Bus, Panel, Strip, METER_LED_COUNT>;

static BUS: StaticCell<Bus> = StaticCell::new();

/// Menu keys routed from the scan task to the menu task.
static MENU_LINK: MenuLink = MenuLink::new();

/// Last raw hall values, for the sensor screen.
static SNAPSHOT: SensorSnapshot = SensorSnapshot::new();

/// Milliseconds since boot, wrapping at 32 bits.
struct Uptime;

impl Clock for Uptime {
    fn now_ms(&self) -> u32 {
        Instant::now().as_millis() as u32
    }
}

// Embassy tasks

#[embassy_executor::task]
async fn usb_task(device: UsbDevice<'static, UsbDriver>) -> ! {
    hid_device::run_usb_device(device).await
}

#[embassy_executor::task]
async fn hid_writer_task(writer: HidWriter<'static, UsbDriver, KEYBOARD_REPORT_SIZE>) -> ! {
    hid_device::hid_writer_task(writer).await
}

/// Button scanning: sample, debounce, route press edges.
#[embassy_executor::task]
async fn scan_task(mut scan: Scan, dispatcher: ActionDispatcher) -> ! {
    info!("Scan task started ({} mode)", scan.trigger_mode());
    let mut keyboard = ReportKeyboard::new(QueueSink);

    loop {
        scan.poll(&MENU_LINK, &dispatcher, &mut keyboard, &SNAPSHOT);
        Timer::after_millis(SCAN_PERIOD_MS).await;
    }
}

/// Knob, countdown menu, status screen and LED meter.
#[embassy_executor::task]
async fn menu_task(mut activity: Menu, mode_select: Input<'static>) -> ! {
    info!("Menu task started");

    loop {
        activity.tick(Uptime.now_ms(), mode_select.is_low(), &MENU_LINK, &SNAPSHOT);
        Timer::after_millis(MENU_PERIOD_MS).await;
    }
}

/// Guided per-button calibration, then switch to quantized triggering.
async fn calibrate(scan: &mut Scan, display: &mut StatusDisplay<Panel>) {
    info!("Calibration wizard started");
    let mut wizard = CalibrationWizard::new();

    loop {
        let now = Uptime.now_ms();
        match wizard.poll(scan.channels_mut(), now) {
            WizardStep::Complete => break,
            WizardStep::Active {
                button,
                prompt,
                raw,
            } => {
                display.show(
                    now,
                    Screen::CalibrationLive {
                        button,
                        prompt,
                        raw,
                    },
                );
                if prompt == WizardPrompt::Checked {
                    Timer::after_millis(CALIBRATION_SUMMARY_MS).await;
                    let channel = scan.channel(button);
                    display.show(
                        Uptime.now_ms(),
                        Screen::CalibrationSummary {
                            button,
                            min: channel.cal_min(),
                            max: channel.cal_max(),
                        },
                    );
                    Timer::after_millis(CALIBRATION_SUMMARY_MS).await;
                }
            }
        }
        Timer::after_millis(SCAN_PERIOD_MS).await;
    }

    scan.set_trigger_mode(TriggerMode::Quantized);
    info!("Calibration complete");
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("KRONOS starting...");

    let p = embassy_nrf::init(Default::default());

    // ── Settings ─────────────────────────────────────────────────────
    let mut flash = BlockingAsync::new(Nvmc::new(p.NVMC));
    let mut store = storage::load_from_flash(&mut flash).await;
    let settings = DeviceSettings::load(&mut store);
    // First boot writes the defaults back.
    storage::save_to_flash(&mut store, &mut flash).await;

    // ── Shared I²C bus ───────────────────────────────────────────────
    let mut i2c_config = twim::Config::default();
    i2c_config.frequency = twim::Frequency::K400;
    let twim = Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, i2c_config);
    let bus: &'static Bus = BUS.init(SharedBus::new(SensorBus::new(twim)));

    // ── Display ──────────────────────────────────────────────────────
    let mut display = StatusDisplay::new(oled::init(SharedI2c::new(bus)));
    display.show(Uptime.now_ms(), Screen::BootLogo);
    Timer::after_millis(BOOT_LOGO_MS).await;

    // ── LED meter ────────────────────────────────────────────────────
    let mut spi_config = spim::Config::default();
    spi_config.frequency = spim::Frequency::M2;
    spi_config.mode = spim::MODE_0;
    let spim = Spim::new_txonly_nosck(p.SPI3, Irqs, p.P0_06, spi_config);
    let mut meter = LedMeter::new(Ws2812::new(spim), METER_ROWS, METER_COLS);
    meter.set_style(settings.meter_style);
    meter.set_brightness_cap(settings.led_brightness);
    meter.clear(true);

    // ── Buttons and knob ─────────────────────────────────────────────
    let mut scan = ScanActivity::new(bus);
    let entering_wizard = scan.channels_mut()[CONFIRM_BUTTON].is_triggered(TriggerMode::Raw);
    if entering_wizard {
        calibrate(&mut scan, &mut display).await;
    }

    let mut knob = RotaryKnob::new(bus);
    knob.set_precision(KNOB_BOOT_PRECISION);
    let mode_select = Input::new(p.P0_11, Pull::Up);

    // ── USB HID ──────────────────────────────────────────────────────
    let usb = hid_device::init(p.USBD);

    // ── Spawn tasks ──────────────────────────────────────────────────
    let dispatcher = ActionDispatcher::new(settings.actions);
    let menu = MenuActivity::new(knob, display, meter);

    spawner.must_spawn(usb_task(usb.device));
    spawner.must_spawn(hid_writer_task(usb.keyboard_writer));
    spawner.must_spawn(scan_task(scan, dispatcher));
    spawner.must_spawn(menu_task(menu, mode_select));

    info!("All tasks spawned - KRONOS running");
}
