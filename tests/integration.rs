//! Integration tests for the kronos host-testable core.

use std::cell::Cell;
use std::sync::atomic::{AtomicU16, AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use smart_leds::colors::RED;
use smart_leds::{SmartLedsWrite, RGB8};

use kronos::action::ActionDispatcher;
use kronos::config::{HALL_BUTTON_COUNT, HALL_CHANNEL_MAP, METER_COLS, METER_ROWS};
use kronos::display::{Display, Screen, StatusDisplay, TextSize};
use kronos::hal::{AngleSensor, HallAdc, SharedBus};
use kronos::hid::{KeyboardReport, ReportKeyboard, ReportSink};
use kronos::input::{Button, RotaryKnob};
use kronos::menu::{MenuActivity, MenuState};
use kronos::meter::LedMeter;
use kronos::scan::{MenuKey, MenuLink, ScanActivity, SensorSnapshot};
use kronos::settings::{DeviceSettings, MemoryStore, SettingsStore, ACTION_KEYS};
use kronos::{config, Result};

const LEDS: usize = 75;

// ═══════════════════════════════════════════════════════════════════════════
// Fakes
// ═══════════════════════════════════════════════════════════════════════════

struct FixedKnob(u16);

impl AngleSensor for FixedKnob {
    fn read_angle(&mut self) -> Result<u16> {
        Ok(self.0)
    }
}

#[derive(Default)]
struct TextLog {
    lines: Vec<String>,
    flushes: usize,
}

impl Display for TextLog {
    fn clear(&mut self) -> Result<()> {
        self.lines.clear();
        Ok(())
    }

    fn set_text(&mut self, _x: i32, _y: i32, text: &str, _size: TextSize) -> Result<()> {
        self.lines.push(text.to_string());
        Ok(())
    }

    fn draw_bitmap(&mut self, _x: i32, _y: i32, _width: u32, _bitmap: &[u8]) -> Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

#[derive(Default)]
struct Strip {
    writes: usize,
    last: Vec<RGB8>,
}

impl SmartLedsWrite for Strip {
    type Error = ();
    type Color = RGB8;

    fn write<T, I>(&mut self, iterator: T) -> core::result::Result<(), ()>
    where
        T: IntoIterator<Item = I>,
        I: Into<RGB8>,
    {
        self.writes += 1;
        self.last = iterator.into_iter().map(Into::into).collect();
        Ok(())
    }
}

#[derive(Default)]
struct Reports(Vec<KeyboardReport>);

impl ReportSink for Reports {
    fn send(&mut self, report: &KeyboardReport) -> Result<()> {
        self.0.push(*report);
        Ok(())
    }
}

/// Six hall sensors; each reads the level set for its button.
#[derive(Clone, Copy)]
struct Panel<'a> {
    levels: &'a [Cell<u16>; HALL_BUTTON_COUNT],
}

impl HallAdc for Panel<'_> {
    fn read_channel(&mut self, selector: u8, sub_channel: u8) -> Result<u16> {
        let i = HALL_CHANNEL_MAP
            .iter()
            .position(|&b| b == (selector, sub_channel))
            .ok_or(kronos::Error::NoSuchChannel)?;
        Ok(self.levels[i].get())
    }
}

fn menu_activity(angle: u16) -> MenuActivity<FixedKnob, TextLog, Strip, LEDS> {
    MenuActivity::new(
        RotaryKnob::new(FixedKnob(angle)),
        StatusDisplay::new(TextLog::default()),
        LedMeter::new(Strip::default(), METER_ROWS, METER_COLS),
    )
}

// ═══════════════════════════════════════════════════════════════════════════
// Countdown scenarios
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn one_minute_countdown_runs_out_and_alerts() {
    let link = MenuLink::new();
    let snapshot = SensorSnapshot::new();
    // Knob at zero selects the first slot: one minute.
    let mut activity = menu_activity(0);

    assert_eq!(activity.tick(0, false, &link, &snapshot), MenuState::SensorIdle);
    assert!(!link.is_active());

    // The switch must read down on two consecutive ticks.
    assert_eq!(activity.tick(25, true, &link, &snapshot), MenuState::SensorIdle);
    assert_eq!(activity.tick(50, true, &link, &snapshot), MenuState::TimerSetting);
    assert!(link.is_active());
    assert_eq!(activity.display().shown(), Some(Screen::TimerSet { minutes: 1 }));

    link.post(MenuKey::Confirm);
    assert_eq!(activity.tick(100, false, &link, &snapshot), MenuState::TimerRunning);
    assert_eq!(activity.menu().timer().total_duration_ms(), 60_000);

    assert_eq!(activity.tick(30_100, false, &link, &snapshot), MenuState::TimerRunning);
    assert_eq!(
        activity.display().shown(),
        Some(Screen::TimerRunning {
            minutes: 0,
            seconds: 30
        })
    );

    assert_eq!(activity.tick(60_100, false, &link, &snapshot), MenuState::TimerExpired);
    assert_eq!(activity.display().shown(), Some(Screen::TimerOver { minutes: 1 }));
    assert!(activity.meter().frame().iter().all(|&c| c == RED));
    assert_eq!(activity.meter().strip().last.len(), LEDS);
    let writes = activity.meter().strip().writes;

    link.post(MenuKey::Cancel);
    assert_eq!(activity.tick(61_000, false, &link, &snapshot), MenuState::SensorIdle);
    assert!(!link.is_active());
    assert!(activity.meter().frame().iter().all(|&c| c == RGB8::default()));
    assert_eq!(activity.meter().strip().writes, writes + 1);
}

#[test]
fn pause_freezes_remaining_time() {
    let link = MenuLink::new();
    let snapshot = SensorSnapshot::new();
    let mut activity = menu_activity(0);

    activity.tick(0, true, &link, &snapshot);
    activity.tick(0, true, &link, &snapshot);
    link.post(MenuKey::Confirm);
    activity.tick(0, false, &link, &snapshot);

    link.post(MenuKey::Confirm);
    assert_eq!(activity.tick(20_000, false, &link, &snapshot), MenuState::TimerPaused);

    // A long pause changes nothing.
    assert_eq!(activity.tick(500_000, false, &link, &snapshot), MenuState::TimerPaused);
    assert_eq!(activity.menu().timer().remaining_ms(500_000), 40_000);

    link.post(MenuKey::Confirm);
    assert_eq!(activity.tick(500_000, false, &link, &snapshot), MenuState::TimerRunning);
    assert_eq!(activity.tick(540_000, false, &link, &snapshot), MenuState::TimerExpired);
}

#[test]
fn held_mode_select_enters_the_menu_once() {
    let link = MenuLink::new();
    let snapshot = SensorSnapshot::new();
    let mut activity = menu_activity(0);

    activity.tick(0, true, &link, &snapshot);
    assert_eq!(activity.tick(25, true, &link, &snapshot), MenuState::TimerSetting);
    link.post(MenuKey::Cancel);
    assert_eq!(activity.tick(50, true, &link, &snapshot), MenuState::SensorIdle);
    // Still held: no new edge.
    assert_eq!(activity.tick(75, true, &link, &snapshot), MenuState::SensorIdle);
    assert_eq!(activity.tick(100, false, &link, &snapshot), MenuState::SensorIdle);
    assert_eq!(activity.tick(125, true, &link, &snapshot), MenuState::SensorIdle);
    assert_eq!(activity.tick(150, true, &link, &snapshot), MenuState::TimerSetting);
}

#[test]
fn bouncing_mode_select_switch_is_ignored() {
    let link = MenuLink::new();
    let snapshot = SensorSnapshot::new();
    let mut activity = menu_activity(0);

    let mut now = 0;
    for level in [true, false, true, false, false, true, false, true, false] {
        assert_eq!(activity.tick(now, level, &link, &snapshot), MenuState::SensorIdle);
        now += 25;
    }
    activity.tick(now, true, &link, &snapshot);
    assert_eq!(activity.tick(now + 25, true, &link, &snapshot), MenuState::TimerSetting);
}

// ═══════════════════════════════════════════════════════════════════════════
// Scan → action dispatch
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn held_redo_button_sends_one_chord() {
    let levels: [Cell<u16>; HALL_BUTTON_COUNT] = Default::default();
    let mut scan = ScanActivity::new(Panel { levels: &levels });
    let dispatcher = ActionDispatcher::new(DeviceSettings::default().actions);
    let link = MenuLink::new();
    let snapshot = SensorSnapshot::new();
    let mut kb = ReportKeyboard::new(Reports::default());

    levels[Button::RightMid.index()].set(20_000);
    let mut edges = 0;
    for _ in 0..20 {
        edges += scan.poll(&link, &dispatcher, &mut kb, &snapshot).iter().count();
    }

    assert_eq!(edges, 1);
    let reports = &kb.sink().0;
    // CTRL, +SHIFT, +Z, release.
    assert_eq!(reports.len(), 4);
    assert_eq!(reports[2].modifier, 0x03);
    assert_eq!(reports[2].keycodes[0], 0x1D);
    assert!(reports[3].is_empty());
    assert_eq!(snapshot.load()[Button::RightMid.index()], 20_000);
}

#[test]
fn confirm_button_goes_to_the_menu_while_it_listens() {
    let levels: [Cell<u16>; HALL_BUTTON_COUNT] = Default::default();
    let mut scan = ScanActivity::new(Panel { levels: &levels });
    let dispatcher = ActionDispatcher::new(DeviceSettings::default().actions);
    let link = MenuLink::new();
    let snapshot = SensorSnapshot::new();
    let mut kb = ReportKeyboard::new(Reports::default());

    link.set_active(true);
    levels[Button::LeftTop.index()].set(20_000);
    for _ in 0..20 {
        scan.poll(&link, &dispatcher, &mut kb, &snapshot);
    }

    assert!(kb.sink().0.is_empty());
    assert!(link.take(MenuKey::Confirm));
    assert!(!link.take(MenuKey::Cancel));
}

// ═══════════════════════════════════════════════════════════════════════════
// Settings persistence
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn edited_settings_survive_a_flash_round_trip() {
    let mut store = MemoryStore::new();
    let mut settings = DeviceSettings::load(&mut store);
    assert!(store.is_dirty());

    settings.led_brightness = 64;
    settings.actions[0] = "TYPE:hello".try_into().unwrap();
    settings.save(&mut store).unwrap();

    let mut blob = [0u8; config::SETTINGS_BLOB_SIZE];
    let len = store.serialize(&mut blob).unwrap();

    let mut restored = MemoryStore::deserialize(&blob[..len]).unwrap();
    assert_eq!(
        restored
            .get_string(config::SETTINGS_NAMESPACE, ACTION_KEYS[0])
            .unwrap()
            .as_deref(),
        Some("TYPE:hello")
    );
    assert_eq!(DeviceSettings::load(&mut restored), settings);
}

// ═══════════════════════════════════════════════════════════════════════════
// Shared bus
// ═══════════════════════════════════════════════════════════════════════════

/// Bus whose reads are counted per device.
struct CountingBus {
    adc_reads: AtomicU32,
    angle_reads: AtomicU32,
    value: AtomicU16,
}

impl HallAdc for CountingBus {
    fn read_channel(&mut self, _selector: u8, _sub_channel: u8) -> Result<u16> {
        self.adc_reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.value.load(Ordering::Relaxed))
    }
}

impl AngleSensor for CountingBus {
    fn read_angle(&mut self) -> Result<u16> {
        self.angle_reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.value.load(Ordering::Relaxed))
    }
}

#[test]
fn scan_and_knob_share_one_bus_across_threads() {
    let bus: SharedBus<CriticalSectionRawMutex, CountingBus> = SharedBus::new(CountingBus {
        adc_reads: AtomicU32::new(0),
        angle_reads: AtomicU32::new(0),
        value: AtomicU16::new(1000),
    });
    let bus_ref = &bus;

    std::thread::scope(|s| {
        s.spawn(move || {
            let mut scan = ScanActivity::new(bus_ref);
            for _ in 0..100 {
                scan.sample();
            }
        });
        s.spawn(move || {
            let mut knob = RotaryKnob::new(bus_ref);
            for _ in 0..100 {
                knob.read_raw_angle();
            }
        });
    });

    let devices = bus.into_inner();
    assert_eq!(devices.adc_reads.load(Ordering::Relaxed), 600);
    assert_eq!(devices.angle_reads.load(Ordering::Relaxed), 100);
}

// ═══════════════════════════════════════════════════════════════════════════
// Status panel
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn sensor_screen_shows_live_raw_values() {
    let link = MenuLink::new();
    let snapshot = SensorSnapshot::new();
    snapshot.store(0, 1234);
    snapshot.store(1, 4321);
    let mut activity = menu_activity(2048);

    activity.tick(0, false, &link, &snapshot);
    assert_eq!(activity.display().display().flushes, 1);
    let lines = &activity.display().display().lines;
    assert!(lines.iter().any(|l| l == "Sensor Readings:"));
    assert!(lines.iter().any(|l| l == "Hall Angle: 2048"));
    assert!(lines.iter().any(|l| l == "LT: 1234 RT: 4321"));
}
