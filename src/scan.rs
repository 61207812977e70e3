//! Scan activity: samples the six hall buttons, debounces them and routes
//! each press edge.
//!
//! Routing rule: while the menu is active (any timer state) the confirm
//! and cancel buttons belong to the menu and their edges are posted to
//! the [`MenuLink`]; every other edge runs the button's action. One edge
//! is never given both meanings.

use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use crate::action::ActionDispatcher;
use crate::config::{HALL_BOOT_PRECISION, HALL_BUTTON_COUNT, HALL_CHANNEL_MAP};
use crate::hal::HallAdc;
use crate::hid::Keyboard;
use crate::input::{Button, DebounceFilter, HallChannel, TriggerMode};

/// Menu keys handed from the scan activity to the menu activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuKey {
    Confirm,
    Cancel,
}

impl MenuKey {
    pub fn from_button(button: Button) -> Option<Self> {
        match button.index() {
            i if i == crate::config::CONFIRM_BUTTON => Some(MenuKey::Confirm),
            i if i == crate::config::CANCEL_BUTTON => Some(MenuKey::Cancel),
            _ => None,
        }
    }
}

/// Lock-free handoff between the two activities: the menu publishes
/// whether it is active, the scan posts menu key edges.
pub struct MenuLink {
    active: AtomicBool,
    confirm: AtomicBool,
    cancel: AtomicBool,
}

impl MenuLink {
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            confirm: AtomicBool::new(false),
            cancel: AtomicBool::new(false),
        }
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn post(&self, key: MenuKey) {
        self.flag(key).store(true, Ordering::Release);
    }

    /// Consume a pending edge.
    pub fn take(&self, key: MenuKey) -> bool {
        self.flag(key).swap(false, Ordering::AcqRel)
    }

    /// Drop edges that arrived while the menu was not listening.
    pub fn clear_pending(&self) {
        self.confirm.store(false, Ordering::Release);
        self.cancel.store(false, Ordering::Release);
    }

    fn flag(&self, key: MenuKey) -> &AtomicBool {
        match key {
            MenuKey::Confirm => &self.confirm,
            MenuKey::Cancel => &self.cancel,
        }
    }
}

impl Default for MenuLink {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::declare_interior_mutable_const)]
const RAW_ZERO: AtomicU16 = AtomicU16::new(0);

/// Latest raw value of every hall channel, for the sensor screen.
pub struct SensorSnapshot {
    raw: [AtomicU16; HALL_BUTTON_COUNT],
}

impl SensorSnapshot {
    pub const fn new() -> Self {
        Self {
            raw: [RAW_ZERO; HALL_BUTTON_COUNT],
        }
    }

    pub fn store(&self, index: usize, value: u16) {
        if let Some(slot) = self.raw.get(index) {
            slot.store(value, Ordering::Relaxed);
        }
    }

    pub fn load(&self) -> [u16; HALL_BUTTON_COUNT] {
        core::array::from_fn(|i| self.raw[i].load(Ordering::Relaxed))
    }
}

impl Default for SensorSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// Buttons that produced a press edge in one poll, as a bitmask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Edges(u8);

impl Edges {
    pub fn contains(self, button: Button) -> bool {
        self.0 & (1 << button.index()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Button> {
        Button::ALL.into_iter().filter(move |b| self.contains(*b))
    }

    fn insert(&mut self, button: Button) {
        self.0 |= 1 << button.index();
    }
}

/// Owns the hall channels and their debounce filters.
pub struct ScanActivity<A> {
    channels: [HallChannel<A>; HALL_BUTTON_COUNT],
    filters: [DebounceFilter; HALL_BUTTON_COUNT],
    mode: TriggerMode,
}

impl<A: HallAdc + Clone> ScanActivity<A> {
    /// Bind all six buttons to `adc` per [`HALL_CHANNEL_MAP`], at boot
    /// precision, in raw trigger mode.
    pub fn new(adc: A) -> Self {
        let channels = core::array::from_fn(|i| {
            let (selector, sub_channel) = HALL_CHANNEL_MAP[i];
            let mut channel = HallChannel::new(adc.clone(), selector, sub_channel);
            channel.set_precision(HALL_BOOT_PRECISION);
            channel
        });
        Self::from_channels(channels)
    }
}

impl<A: HallAdc> ScanActivity<A> {
    pub fn from_channels(channels: [HallChannel<A>; HALL_BUTTON_COUNT]) -> Self {
        Self {
            channels,
            filters: [DebounceFilter::default(); HALL_BUTTON_COUNT],
            mode: TriggerMode::Raw,
        }
    }

    pub fn trigger_mode(&self) -> TriggerMode {
        self.mode
    }

    /// Switch trigger mode; filters restart so no stale history carries
    /// over.
    pub fn set_trigger_mode(&mut self, mode: TriggerMode) {
        if mode != self.mode {
            info!("scan: trigger mode {}", mode);
            self.mode = mode;
            self.filters.iter_mut().for_each(DebounceFilter::reset);
        }
    }

    pub fn channel(&self, button: Button) -> &HallChannel<A> {
        &self.channels[button.index()]
    }

    /// All channels, e.g. for the calibration wizard.
    pub fn channels_mut(&mut self) -> &mut [HallChannel<A>; HALL_BUTTON_COUNT] {
        &mut self.channels
    }

    /// Sample and debounce every button once.
    pub fn sample(&mut self) -> Edges {
        let mut edges = Edges::default();
        for button in Button::ALL {
            let i = button.index();
            let level = self.channels[i].is_triggered(self.mode);
            if self.filters[i].update(level) {
                edges.insert(button);
            }
        }
        edges
    }

    /// One scan period: sample, route edges, publish raw values.
    pub fn poll<K: Keyboard>(
        &mut self,
        link: &MenuLink,
        dispatcher: &ActionDispatcher,
        keyboard: &mut K,
        snapshot: &SensorSnapshot,
    ) -> Edges {
        let edges = self.sample();
        for button in edges.iter() {
            route(button, link, dispatcher, keyboard);
        }
        for (i, channel) in self.channels.iter().enumerate() {
            snapshot.store(i, channel.last_raw());
        }
        edges
    }
}

/// Hand one press edge to the menu or to the button's action.
pub fn route<K: Keyboard>(
    button: Button,
    link: &MenuLink,
    dispatcher: &ActionDispatcher,
    keyboard: &mut K,
) {
    match MenuKey::from_button(button) {
        Some(key) if link.is_active() => {
            debug!("scan: menu key {}", key);
            link.post(key);
        }
        _ => dispatcher.dispatch(button, keyboard),
    }
}
