//! Application-wide constants and compile-time configuration.
//!
//! All hardware bindings, timing parameters, and calibration
//! constants live here so they can be tuned in one place.

// Hall buttons

/// Number of hall-effect buttons on the device.
pub const HALL_BUTTON_COUNT: usize = 6;

/// Quantization resolutions selectable through the precision index.
pub const HALL_PRECISION_TABLE: [u16; 6] = [128, 256, 512, 1024, 2048, 4096];

/// Precision index a hall channel starts with (256 steps).
pub const HALL_DEFAULT_PRECISION: u8 = 1;

/// Precision index applied to every button at boot (1024 steps).
pub const HALL_BOOT_PRECISION: u8 = 3;

/// Raw ADC level above which a sensor counts as "touched" in raw mode.
pub const HALL_RAW_TRIGGER: u16 = 11_000;

/// ADC bindings `(device selector, sub-channel)` in button order:
/// left-top, right-top, left-mid, right-mid, left-bottom, right-bottom.
///
///   ADC 1 (ADS1115 @ 0x48) → left column
///   ADC 2 (ADS1115 @ 0x49) → right column
pub const HALL_CHANNEL_MAP: [(u8, u8); HALL_BUTTON_COUNT] =
    [(1, 0), (2, 0), (1, 1), (2, 1), (1, 2), (2, 2)];

/// Button index that confirms / pauses in the timer menu (left-top).
pub const CONFIRM_BUTTON: usize = 0;

/// Button index that cancels in the timer menu (right-top).
pub const CANCEL_BUTTON: usize = 1;

// Debounce

/// Consecutive pressed samples required before a press edge is reported.
///
/// The history window is this plus one released sample, i.e. the filter
/// matches "released, pressed ×7" over the last 8 samples.
pub const DEBOUNCE_STABLE_SAMPLES: u8 = 7;

/// Consecutive pressed menu ticks before the mode-select switch counts
/// as pressed (2 × `MENU_PERIOD_MS`).
pub const MODE_SELECT_STABLE_SAMPLES: u8 = 2;

// Rotary knob

/// Full-scale count of the 12-bit angle sensor.
pub const KNOB_FULL_SCALE: u16 = 4096;

/// Output resolutions selectable for the knob.
pub const KNOB_PRECISION_TABLE: [u16; 6] = [128, 255, 512, 1024, 2048, 4096];

/// Knob precision index used by the firmware (full 12-bit range).
pub const KNOB_BOOT_PRECISION: u8 = 5;

/// Angle change (raw counts) needed before a rotation is reported.
pub const ROTATION_HYSTERESIS: u16 = 100;

/// Brightness mapping range for the second knob output.
pub const KNOB_BRIGHTNESS_RANGE: u16 = 255;

// Countdown timer

/// Selectable durations in minutes, indexed by the knob.
pub const TIMER_MINUTES: [u32; 12] = [1, 10, 15, 20, 25, 30, 35, 40, 45, 50, 55, 60];

/// Knob output range used to pick a timer slot (0..=11).
pub const TIMER_SLOT_RANGE: u16 = TIMER_MINUTES.len() as u16;

// LED meter

/// Rows in the 5×15 "screen" LED grid.
pub const METER_ROWS: u8 = 15;

/// Columns in the 5×15 "screen" LED grid.
pub const METER_COLS: u8 = 5;

/// Number of LEDs on the screen strip.
pub const METER_LED_COUNT: usize = 75;

/// Minimum interval between two meter repaints (ms).
pub const METER_MIN_UPDATE_MS: u32 = 50;

/// Full scale of the pre-start "minutes being selected" meter.
pub const METER_SETTING_FULL_SCALE_MIN: u32 = 60;

// Activities

/// Scan activity poll period (ms). The debounce window is counted in
/// samples, so this period defines the debounce time.
pub const SCAN_PERIOD_MS: u64 = 2;

/// Menu / render activity poll period (ms).
pub const MENU_PERIOD_MS: u64 = 25;

/// Sensor screen refresh interval (ms).
pub const SENSOR_SCREEN_INTERVAL_MS: u32 = 500;

/// Duration a button must be held during calibration (ms).
pub const CALIBRATION_HOLD_MS: u32 = 500;

/// How long a button's calibrated range stays on screen (ms).
pub const CALIBRATION_SUMMARY_MS: u64 = 500;

/// Boot logo display time (ms).
pub const BOOT_LOGO_MS: u64 = 1000;

// Settings

/// Settings-store namespace for everything the core persists.
pub const SETTINGS_NAMESPACE: &str = "kronos";

/// Default LED brightness cap.
pub const DEFAULT_LED_BRIGHTNESS: u8 = 20;

/// Maximum length of one configured action string.
pub const ACTION_MAX_LEN: usize = 224;

/// Actions written on first boot, in button order.
pub const DEFAULT_ACTIONS: [&str; HALL_BUTTON_COUNT] = [
    "CTRL+C",
    "GUI+NUM_MINUS",
    "CTRL+Z",
    "CTRL+SHIFT+Z",
    "CTRL+V",
    "DELETE",
];

/// Default meter style byte (0 = white, 1 = gradient).
pub const DEFAULT_METER_STYLE: u8 = 0;

/// Settings records held in RAM at once.
pub const SETTINGS_MAX_ENTRIES: usize = 16;

/// Longest namespace or key name.
pub const SETTINGS_NAME_LEN: usize = 16;

/// Size of the serialized settings blob kept in flash.
pub const SETTINGS_BLOB_SIZE: usize = 2048;

// USB

/// USB VID/PID - use the "pid.codes" open-source test VID.
/// Replace with your own allocated VID/PID for production.
pub const USB_VID: u16 = 0x1209;
pub const USB_PID: u16 = 0x0002;

/// USB device strings.
pub const USB_MANUFACTURER: &str = "AddeyX";
pub const USB_PRODUCT: &str = "KRONOS V1";
pub const USB_SERIAL_NUMBER: &str = "000001";

/// USB HID polling interval (ms).
pub const USB_HID_POLL_MS: u8 = 1;

/// Keyboard reports queued for the USB endpoint. A `TYPE:` action of
/// maximum length needs two reports per character plus the final
/// release, and the scan activity queues them all before the writer
/// drains any.
pub const REPORT_QUEUE_DEPTH: usize = 2 * ACTION_MAX_LEN + 1;

/// Gap between two typed characters (ms), so hosts never drop repeats.
pub const TYPE_CHAR_GAP_MS: u64 = 10;

// GPIO / bus assignments (nRF52840-DK defaults)
//
// These are logical names; the concrete `embassy_nrf::peripherals::*`
// are picked in `main.rs`.  Adjust for your custom PCB.
//
//   Mode-select button → P0.11 (active-low, pull-up)
//   I²C SDA            → P0.26  (ADS1115 ×2, AS5600, SSD1306)
//   I²C SCL            → P0.27
//   LED strip data     → P0.06  (SPIM3 MOSI, WS2812 encoding)

/// I²C address of the left-column ADC.
pub const ADC1_ADDR: u8 = 0x48;

/// I²C address of the right-column ADC.
pub const ADC2_ADDR: u8 = 0x49;

/// I²C address of the AS5600 angle sensor.
pub const ANGLE_SENSOR_ADDR: u8 = 0x36;

// Settings flash region

/// Flash page index where settings storage starts (4 KB per page on nRF52840).
pub const STORAGE_FLASH_PAGE_START: u32 = 240;

/// Number of flash pages reserved for settings storage.
pub const STORAGE_FLASH_PAGE_COUNT: u32 = 4;
