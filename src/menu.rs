//! Timer menu state machine and the menu/render activity around it.
//!
//! ```text
//! SensorIdle ──mode-select──▶ TimerSetting ──confirm──▶ TimerRunning
//!     ▲                           │                      │  ▲
//!     │                        cancel          confirm   │  │ confirm
//!     │                           ▼                      ▼  │
//!     ◀────────── cancel (any timer state) ─────── TimerPaused
//!     ◀── confirm / cancel ── TimerExpired ◀── runs out ── TimerRunning
//! ```

use smart_leds::colors::RED;
use smart_leds::{SmartLedsWrite, RGB8};

use crate::config::{KNOB_BRIGHTNESS_RANGE, MODE_SELECT_STABLE_SAMPLES, TIMER_SLOT_RANGE};
use crate::display::{Display, Screen, StatusDisplay};
use crate::hal::AngleSensor;
use crate::input::{DebounceFilter, MapSelect, RotaryKnob};
use crate::meter::{LedMeter, MeterCommand, MeterMode};
use crate::scan::{MenuKey, MenuLink, SensorSnapshot};
use crate::timer::{minutes_for_index, CountdownTimer, TimerState};

/// Menu state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuState {
    SensorIdle,
    TimerSetting,
    TimerRunning,
    TimerPaused,
    TimerExpired,
}

/// Inputs for one menu step. Key fields are edges, not levels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MenuInput {
    pub mode_select: bool,
    pub confirm: bool,
    pub cancel: bool,
    /// Knob position as a timer slot index.
    pub knob_slot: usize,
}

/// Owns the countdown timer and drives it from menu input.
pub struct MenuController {
    state: MenuState,
    timer: CountdownTimer,
    slot: usize,
}

impl MenuController {
    pub const fn new() -> Self {
        Self {
            state: MenuState::SensorIdle,
            timer: CountdownTimer::new(),
            slot: 0,
        }
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    pub fn timer(&self) -> &CountdownTimer {
        &self.timer
    }

    /// Slot currently selected on the setting screen.
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Whether the confirm/cancel buttons belong to the menu.
    pub fn is_menu_active(&self) -> bool {
        self.state != MenuState::SensorIdle
    }

    /// Apply one step of input. Cancel wins over confirm in the same step.
    pub fn step(&mut self, input: MenuInput, now_ms: u32) -> MenuState {
        let next = match self.state {
            MenuState::SensorIdle => {
                if input.mode_select {
                    self.slot = input.knob_slot;
                    MenuState::TimerSetting
                } else {
                    MenuState::SensorIdle
                }
            }
            MenuState::TimerSetting => {
                self.slot = input.knob_slot;
                if input.cancel {
                    MenuState::SensorIdle
                } else if input.confirm {
                    self.timer.start(self.slot, now_ms);
                    MenuState::TimerRunning
                } else {
                    MenuState::TimerSetting
                }
            }
            MenuState::TimerRunning => {
                if input.cancel {
                    MenuState::SensorIdle
                } else if input.confirm {
                    self.timer.pause(now_ms);
                    MenuState::TimerPaused
                } else if self.timer.mark_expired(now_ms) {
                    MenuState::TimerExpired
                } else {
                    MenuState::TimerRunning
                }
            }
            MenuState::TimerPaused => {
                if input.cancel {
                    MenuState::SensorIdle
                } else if input.confirm {
                    self.timer.resume(now_ms);
                    MenuState::TimerRunning
                } else {
                    MenuState::TimerPaused
                }
            }
            MenuState::TimerExpired => {
                if input.cancel || input.confirm {
                    MenuState::SensorIdle
                } else {
                    MenuState::TimerExpired
                }
            }
        };

        if next != self.state {
            debug!("menu: {} -> {}", self.state, next);
            if next == MenuState::SensorIdle {
                self.timer.reset();
            }
            self.state = next;
        }
        self.state
    }

    /// Screen for the current state; `None` in [`MenuState::SensorIdle`],
    /// where the caller shows live sensor values.
    pub fn screen(&self, now_ms: u32) -> Option<Screen> {
        let secs = self.timer.remaining_secs(now_ms);
        match self.state {
            MenuState::SensorIdle => None,
            MenuState::TimerSetting => Some(Screen::TimerSet {
                minutes: minutes_for_index(self.slot),
            }),
            MenuState::TimerRunning => Some(Screen::TimerRunning {
                minutes: secs / 60,
                seconds: secs % 60,
            }),
            MenuState::TimerPaused => Some(Screen::TimerPaused {
                minutes: secs / 60,
                seconds: secs % 60,
            }),
            MenuState::TimerExpired => Some(Screen::TimerOver {
                minutes: self.timer.selected_minutes(),
            }),
        }
    }

    /// Meter content for the current state.
    pub fn meter_command(&self, now_ms: u32) -> MeterCommand {
        let total_ms = self.timer.total_duration_ms();
        match self.timer.state() {
            TimerState::Running { .. } => MeterCommand::Remaining {
                remaining_ms: self.timer.remaining_ms(now_ms),
                total_ms,
                mode: MeterMode::Running,
            },
            TimerState::Paused { remaining_ms } => MeterCommand::Remaining {
                remaining_ms,
                total_ms,
                mode: MeterMode::Paused,
            },
            TimerState::Expired => MeterCommand::Alert(RED),
            TimerState::Idle if self.state == MenuState::TimerSetting => {
                MeterCommand::Minutes(minutes_for_index(self.slot))
            }
            TimerState::Idle => MeterCommand::Clear,
        }
    }
}

impl Default for MenuController {
    fn default() -> Self {
        Self::new()
    }
}

/// The menu/render activity: knob, menu, display and LED meter.
pub struct MenuActivity<S, D, W, const N: usize> {
    knob: RotaryKnob<S>,
    menu: MenuController,
    display: StatusDisplay<D>,
    meter: LedMeter<W, N>,
    mode_select: DebounceFilter,
}

impl<S, D, W, const N: usize> MenuActivity<S, D, W, N>
where
    S: AngleSensor,
    D: Display,
    W: SmartLedsWrite<Color = RGB8>,
{
    pub fn new(knob: RotaryKnob<S>, display: StatusDisplay<D>, meter: LedMeter<W, N>) -> Self {
        Self {
            knob,
            menu: MenuController::new(),
            display,
            meter,
            mode_select: DebounceFilter::new(MODE_SELECT_STABLE_SAMPLES),
        }
    }

    pub fn menu(&self) -> &MenuController {
        &self.menu
    }

    pub fn display(&self) -> &StatusDisplay<D> {
        &self.display
    }

    pub fn meter(&self) -> &LedMeter<W, N> {
        &self.meter
    }

    pub fn meter_mut(&mut self) -> &mut LedMeter<W, N> {
        &mut self.meter
    }

    /// One menu period. `mode_select_down` is the current switch level;
    /// it counts as pressed after [`MODE_SELECT_STABLE_SAMPLES`] ticks.
    pub fn tick(
        &mut self,
        now_ms: u32,
        mode_select_down: bool,
        link: &MenuLink,
        snapshot: &SensorSnapshot,
    ) -> MenuState {
        let mode_select = self.mode_select.update(mode_select_down);

        let listening = self.menu.is_menu_active();
        if !listening {
            link.clear_pending();
        }

        let slot = self
            .knob
            .scan_map_angle(TIMER_SLOT_RANGE, KNOB_BRIGHTNESS_RANGE, MapSelect::First);

        let input = MenuInput {
            mode_select,
            confirm: listening && link.take(MenuKey::Confirm),
            cancel: listening && link.take(MenuKey::Cancel),
            knob_slot: usize::from(slot),
        };
        let state = self.menu.step(input, now_ms);
        link.set_active(self.menu.is_menu_active());

        let screen = self.menu.screen(now_ms).unwrap_or(Screen::Sensors {
            angle: self.knob.last_angle(),
            raw: snapshot.load(),
        });
        self.display.show(now_ms, screen);
        self.meter.apply(now_ms, self.menu.meter_command(now_ms));

        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> MenuInput {
        MenuInput::default()
    }

    fn confirm() -> MenuInput {
        MenuInput {
            confirm: true,
            ..input()
        }
    }

    fn cancel() -> MenuInput {
        MenuInput {
            cancel: true,
            ..input()
        }
    }

    fn enter(slot: usize) -> MenuInput {
        MenuInput {
            mode_select: true,
            knob_slot: slot,
            ..input()
        }
    }

    fn running_menu(slot: usize) -> MenuController {
        let mut m = MenuController::new();
        m.step(enter(slot), 0);
        m.step(
            MenuInput {
                knob_slot: slot,
                ..confirm()
            },
            0,
        );
        m
    }

    #[test]
    fn idle_ignores_menu_keys() {
        let mut m = MenuController::new();
        assert_eq!(m.step(confirm(), 0), MenuState::SensorIdle);
        assert_eq!(m.step(cancel(), 0), MenuState::SensorIdle);
        assert!(!m.is_menu_active());
    }

    #[test]
    fn setting_follows_knob_then_starts() {
        let mut m = MenuController::new();
        assert_eq!(m.step(enter(3), 0), MenuState::TimerSetting);
        assert!(m.is_menu_active());
        m.step(
            MenuInput {
                knob_slot: 5,
                ..input()
            },
            10,
        );
        assert_eq!(m.screen(10), Some(Screen::TimerSet { minutes: 30 }));
        assert_eq!(m.meter_command(10), MeterCommand::Minutes(30));

        let state = m.step(
            MenuInput {
                knob_slot: 5,
                ..confirm()
            },
            20,
        );
        assert_eq!(state, MenuState::TimerRunning);
        assert_eq!(m.timer().selected_minutes(), 30);
    }

    #[test]
    fn confirm_toggles_pause() {
        let mut m = running_menu(0);
        assert_eq!(m.step(confirm(), 10_000), MenuState::TimerPaused);
        assert_eq!(
            m.meter_command(30_000),
            MeterCommand::Remaining {
                remaining_ms: 50_000,
                total_ms: 60_000,
                mode: MeterMode::Paused
            }
        );
        assert_eq!(m.step(confirm(), 30_000), MenuState::TimerRunning);
        assert_eq!(m.timer().remaining_ms(30_000), 50_000);
    }

    #[test]
    fn expiry_then_acknowledge() {
        let mut m = running_menu(0);
        assert_eq!(m.step(input(), 59_999), MenuState::TimerRunning);
        assert_eq!(m.step(input(), 60_000), MenuState::TimerExpired);
        assert_eq!(m.screen(60_000), Some(Screen::TimerOver { minutes: 1 }));
        assert_eq!(m.meter_command(60_000), MeterCommand::Alert(RED));
        assert_eq!(m.step(confirm(), 61_000), MenuState::SensorIdle);
        assert_eq!(m.timer().state(), TimerState::Idle);
    }

    #[test]
    fn cancel_leaves_any_timer_state() {
        let mut m = MenuController::new();
        m.step(enter(0), 0);
        assert_eq!(m.step(cancel(), 0), MenuState::SensorIdle);

        let mut m = running_menu(0);
        assert_eq!(m.step(cancel(), 1), MenuState::SensorIdle);

        let mut m = running_menu(0);
        m.step(confirm(), 1);
        assert_eq!(m.step(cancel(), 2), MenuState::SensorIdle);

        let mut m = running_menu(0);
        m.step(input(), 60_000);
        assert_eq!(m.step(cancel(), 60_001), MenuState::SensorIdle);
        assert_eq!(m.meter_command(60_001), MeterCommand::Clear);
    }

    #[test]
    fn cancel_wins_over_confirm() {
        let mut m = running_menu(0);
        let both = MenuInput {
            confirm: true,
            cancel: true,
            ..input()
        };
        assert_eq!(m.step(both, 5), MenuState::SensorIdle);
    }

    #[test]
    fn running_screen_counts_down() {
        let m = running_menu(1);
        assert_eq!(
            m.screen(61_000),
            Some(Screen::TimerRunning {
                minutes: 8,
                seconds: 59
            })
        );
    }

    #[test]
    fn idle_has_no_menu_screen() {
        let m = MenuController::new();
        assert_eq!(m.screen(0), None);
        assert_eq!(m.meter_command(0), MeterCommand::Clear);
    }
}
