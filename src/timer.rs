//! Pausable countdown timer.
//!
//! One tagged [`TimerState`] replaces the usual `running`/`paused`
//! boolean pair: the end timestamp exists only while running and the
//! frozen remaining time only while paused.
//!
//! Timestamps come from a wrapping 32-bit millisecond clock. Remaining
//! time is derived from `now - resumed_at` (a wrapping difference that is
//! valid across rollover) and never from comparing raw timestamps.

use crate::config::TIMER_MINUTES;

const MS_PER_MINUTE: u32 = 60_000;

/// Timer lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerState {
    Idle,
    /// Counting down `budget_ms` from `resumed_at`.
    Running { resumed_at: u32, budget_ms: u32 },
    /// Frozen with `remaining_ms` left.
    Paused { remaining_ms: u32 },
    /// Reached zero and the owner acted on it.
    Expired,
}

/// Minutes offered by slot `index` (clamped into the table).
pub fn minutes_for_index(index: usize) -> u32 {
    TIMER_MINUTES[index.min(TIMER_MINUTES.len() - 1)]
}

/// Countdown over one of the fixed durations in [`TIMER_MINUTES`].
#[derive(Clone, Debug)]
pub struct CountdownTimer {
    state: TimerState,
    total_duration_ms: u32,
    selected_minutes: u32,
}

impl CountdownTimer {
    pub const fn new() -> Self {
        Self {
            state: TimerState::Idle,
            total_duration_ms: 0,
            selected_minutes: 0,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Start the duration in slot `index` (clamped). No-op while running.
    pub fn start(&mut self, index: usize, now_ms: u32) {
        if matches!(self.state, TimerState::Running { .. }) {
            return;
        }
        let minutes = minutes_for_index(index);
        self.selected_minutes = minutes;
        self.total_duration_ms = minutes * MS_PER_MINUTE;
        self.state = TimerState::Running {
            resumed_at: now_ms,
            budget_ms: self.total_duration_ms,
        };
        info!("timer: started {} min", minutes);
    }

    /// Freeze the countdown. No-op unless running.
    pub fn pause(&mut self, now_ms: u32) {
        if let TimerState::Running { .. } = self.state {
            let remaining_ms = self.remaining_ms(now_ms);
            self.state = TimerState::Paused { remaining_ms };
            debug!("timer: paused with {} ms left", remaining_ms);
        }
    }

    /// Continue a paused countdown. No-op unless paused.
    pub fn resume(&mut self, now_ms: u32) {
        if let TimerState::Paused { remaining_ms } = self.state {
            self.state = TimerState::Running {
                resumed_at: now_ms,
                budget_ms: remaining_ms,
            };
            debug!("timer: resumed with {} ms left", remaining_ms);
        }
    }

    /// Back to idle from any state.
    pub fn reset(&mut self) {
        self.state = TimerState::Idle;
        self.total_duration_ms = 0;
        self.selected_minutes = 0;
    }

    /// Milliseconds left: live while running, frozen while paused, zero
    /// otherwise.
    pub fn remaining_ms(&self, now_ms: u32) -> u32 {
        match self.state {
            TimerState::Running {
                resumed_at,
                budget_ms,
            } => budget_ms.saturating_sub(now_ms.wrapping_sub(resumed_at)),
            TimerState::Paused { remaining_ms } => remaining_ms,
            TimerState::Idle | TimerState::Expired => 0,
        }
    }

    pub fn remaining_secs(&self, now_ms: u32) -> u32 {
        self.remaining_ms(now_ms) / 1000
    }

    pub fn remaining_minutes(&self, now_ms: u32) -> u32 {
        self.remaining_ms(now_ms) / MS_PER_MINUTE
    }

    /// True only for a live countdown that has reached zero.
    pub fn is_expired(&self, now_ms: u32) -> bool {
        matches!(self.state, TimerState::Running { .. }) && self.remaining_ms(now_ms) == 0
    }

    /// Move to [`TimerState::Expired`] if the countdown has run out.
    /// Returns whether the transition happened.
    pub fn mark_expired(&mut self, now_ms: u32) -> bool {
        if self.is_expired(now_ms) {
            self.state = TimerState::Expired;
            info!("timer: expired");
            true
        } else {
            false
        }
    }

    /// Clock value at which a running countdown reaches zero.
    pub fn end_timestamp(&self) -> Option<u32> {
        match self.state {
            TimerState::Running {
                resumed_at,
                budget_ms,
            } => Some(resumed_at.wrapping_add(budget_ms)),
            _ => None,
        }
    }

    /// Duration picked by the last `start`, `0` after a reset.
    pub fn total_duration_ms(&self) -> u32 {
        self.total_duration_ms
    }

    pub fn selected_minutes(&self) -> u32 {
        self.selected_minutes
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, TimerState::Running { .. })
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.state, TimerState::Paused { .. })
    }
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_then_remaining_matches_table() {
        for (i, minutes) in TIMER_MINUTES.iter().enumerate() {
            let mut t = CountdownTimer::new();
            t.start(i, 1_000);
            assert_eq!(t.remaining_ms(1_000), minutes * 60_000);
            assert_eq!(t.total_duration_ms(), minutes * 60_000);
        }
    }

    #[test]
    fn index_is_clamped() {
        let mut t = CountdownTimer::new();
        t.start(99, 0);
        assert_eq!(t.selected_minutes(), 60);
        assert_eq!(minutes_for_index(12), 60);
        assert_eq!(minutes_for_index(0), 1);
    }

    #[test]
    fn start_while_running_is_ignored() {
        let mut t = CountdownTimer::new();
        t.start(0, 0);
        t.start(11, 5_000);
        assert_eq!(t.selected_minutes(), 1);
        assert_eq!(t.remaining_ms(5_000), 55_000);
    }

    #[test]
    fn pause_resume_without_elapsed_time_is_lossless() {
        let mut t = CountdownTimer::new();
        t.start(1, 0);
        let before = t.remaining_ms(12_345);
        t.pause(12_345);
        t.resume(12_345);
        assert_eq!(t.remaining_ms(12_345), before);
    }

    #[test]
    fn pause_freezes_and_resume_continues() {
        let mut t = CountdownTimer::new();
        t.start(0, 0);
        t.pause(10_000);
        assert_eq!(t.state(), TimerState::Paused { remaining_ms: 50_000 });
        // Time passing while paused changes nothing.
        assert_eq!(t.remaining_ms(40_000), 50_000);
        t.resume(40_000);
        assert_eq!(t.remaining_ms(45_000), 45_000);
    }

    #[test]
    fn pause_and_resume_are_idempotent() {
        let mut t = CountdownTimer::new();
        t.start(0, 0);
        t.pause(1_000);
        let paused = t.state();
        t.pause(9_000);
        assert_eq!(t.state(), paused);

        t.resume(10_000);
        let running = t.state();
        t.resume(20_000);
        assert_eq!(t.state(), running);
        assert_eq!(t.remaining_ms(20_000), 49_000);
    }

    #[test]
    fn one_minute_expiry_scenario() {
        let mut t = CountdownTimer::new();
        t.start(0, 0);
        assert!(!t.is_expired(59_999));
        assert_eq!(t.remaining_ms(60_500), 0);
        assert!(t.is_expired(60_500));
        assert!(t.is_running());

        t.reset();
        assert_eq!(t.state(), TimerState::Idle);
        assert_eq!(t.remaining_ms(60_500), 0);
        assert!(!t.is_expired(60_500));
    }

    #[test]
    fn paused_at_zero_is_not_expired() {
        let mut t = CountdownTimer::new();
        t.start(0, 0);
        t.pause(70_000);
        assert_eq!(t.remaining_ms(70_000), 0);
        assert!(!t.is_expired(70_000));
        assert!(!t.mark_expired(70_000));
    }

    #[test]
    fn mark_expired_transitions_once() {
        let mut t = CountdownTimer::new();
        t.start(0, 0);
        assert!(!t.mark_expired(30_000));
        assert!(t.mark_expired(60_000));
        assert_eq!(t.state(), TimerState::Expired);
        assert!(!t.mark_expired(60_000));
        assert_eq!(t.remaining_ms(60_000), 0);
    }

    #[test]
    fn survives_clock_rollover() {
        let start = u32::MAX - 10_000;
        let mut t = CountdownTimer::new();
        t.start(0, start);
        let later = start.wrapping_add(30_000);
        assert!(later < start);
        assert_eq!(t.remaining_ms(later), 30_000);
        assert_eq!(t.end_timestamp(), Some(start.wrapping_add(60_000)));
        assert!(t.is_expired(start.wrapping_add(60_000)));
    }

    #[test]
    fn display_helpers() {
        let mut t = CountdownTimer::new();
        t.start(2, 0);
        assert_eq!(t.remaining_minutes(0), 15);
        assert_eq!(t.remaining_secs(1_500), 898);
    }

    #[test]
    fn idle_reports_zero() {
        let t = CountdownTimer::new();
        assert_eq!(t.remaining_ms(123), 0);
        assert_eq!(t.end_timestamp(), None);
        assert!(!t.is_expired(123));
    }
}
