//! USB HID keyboard device.
//!
//! Initialises the Embassy USB stack on the nRF52840 hardware USB
//! peripheral and exposes one boot-protocol keyboard endpoint. Reports
//! built by the scan activity arrive through [`REPORTS`].

use kronos::config;
use defmt::{info, warn};
use embassy_nrf::usb::vbus_detect::HardwareVbusDetect;
use embassy_nrf::usb::Driver;
use embassy_nrf::{self, bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::Timer;
use embassy_usb::class::hid::{Config as HidConfig, HidWriter, State};
use embassy_usb::{Builder, Config, UsbDevice};
use kronos::hid::{KeyboardReport, ReportSink, KEYBOARD_REPORT_SIZE};
use kronos::{Error, Result};
use static_cell::StaticCell;
use usbd_hid::descriptor::{KeyboardReport as BootKeyboardReport, SerializedDescriptor};

bind_interrupts!(struct Irqs {
    USBD => embassy_nrf::usb::InterruptHandler<peripherals::USBD>;
    CLOCK_POWER => embassy_nrf::usb::vbus_detect::InterruptHandler;
});

pub type UsbDriver = Driver<'static, peripherals::USBD, HardwareVbusDetect>;

/// Reports queued for the keyboard endpoint. Holds a whole `TYPE:`
/// action of maximum length, which the scan task queues in one go.
pub static REPORTS: Channel<CriticalSectionRawMutex, KeyboardReport, { config::REPORT_QUEUE_DEPTH }> =
    Channel::new();

static KB_STATE: StaticCell<State> = StaticCell::new();
static USB_CONFIG_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_BOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_MSOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_CTRL_BUF: StaticCell<[u8; 128]> = StaticCell::new();

/// [`ReportSink`] that queues onto [`REPORTS`] without blocking the scan.
pub struct QueueSink;

impl ReportSink for QueueSink {
    fn send(&mut self, report: &KeyboardReport) -> Result<()> {
        REPORTS.try_send(*report).map_err(|_| Error::Keyboard)
    }
}

/// Build result containing the USB device runner and the keyboard writer.
pub struct UsbHidDevice {
    pub device: UsbDevice<'static, UsbDriver>,
    pub keyboard_writer: HidWriter<'static, UsbDriver, KEYBOARD_REPORT_SIZE>,
}

/// Initialise the USB stack and create the HID keyboard.
///
/// Must be called exactly once.  All static buffers are consumed here.
pub fn init(usbd: peripherals::USBD) -> UsbHidDevice {
    // Create the low-level USB driver with hardware VBUS detection.
    let driver = Driver::new(usbd, Irqs, HardwareVbusDetect::new(Irqs));

    // USB device-level configuration.
    let mut usb_config = Config::new(config::USB_VID, config::USB_PID);
    usb_config.manufacturer = Some(config::USB_MANUFACTURER);
    usb_config.product = Some(config::USB_PRODUCT);
    usb_config.serial_number = Some(config::USB_SERIAL_NUMBER);
    usb_config.max_power = 100; // mA
    usb_config.max_packet_size_0 = 64;

    // Allocate static descriptor buffers.
    let config_desc = USB_CONFIG_DESC.init([0u8; 256]);
    let bos_desc = USB_BOS_DESC.init([0u8; 256]);
    let msos_desc = USB_MSOS_DESC.init([0u8; 256]);
    let ctrl_buf = USB_CTRL_BUF.init([0u8; 128]);

    let mut builder = Builder::new(
        driver,
        usb_config,
        config_desc,
        bos_desc,
        msos_desc,
        ctrl_buf,
    );

    let kb_state = KB_STATE.init(State::new());
    let kb_config = HidConfig {
        report_descriptor: BootKeyboardReport::desc(),
        request_handler: None,
        poll_ms: config::USB_HID_POLL_MS,
        max_packet_size: 8,
    };
    let keyboard_writer = HidWriter::new(&mut builder, kb_state, kb_config);

    let device = builder.build();

    info!("USB HID keyboard initialised");

    UsbHidDevice {
        device,
        keyboard_writer,
    }
}

/// Run the USB device stack - must be spawned as a dedicated Embassy task.
pub async fn run_usb_device(mut device: UsbDevice<'static, UsbDriver>) -> ! {
    info!("USB device task started");
    device.run().await
}

/// Report forwarding - drains [`REPORTS`] into the keyboard endpoint.
pub async fn hid_writer_task(mut keyboard: HidWriter<'static, UsbDriver, KEYBOARD_REPORT_SIZE>) -> ! {
    info!("HID writer task started - waiting for reports");

    let mut buf = [0u8; KEYBOARD_REPORT_SIZE];

    loop {
        let report = REPORTS.receive().await;
        let n = report.serialize(&mut buf);
        if let Err(_e) = keyboard.write(&buf[..n]).await {
            warn!("USB keyboard write failed");
        }
        // Hosts drop a repeated key without a gap between strokes.
        Timer::after_millis(config::TYPE_CHAR_GAP_MS).await;
    }
}
