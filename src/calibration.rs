//! Guided per-button calibration.
//!
//! The wizard walks the six buttons in order. For each one it asks for a
//! press, then needs the button held for [`CALIBRATION_HOLD_MS`] while
//! every poll feeds a calibrating sample into the channel. Releasing
//! early restarts that button.
//!
//! [`CalibrationWizard::poll`] does one step and returns; the caller
//! yields between polls and shows the returned prompt.

use crate::config::CALIBRATION_HOLD_MS;
use crate::hal::HallAdc;
use crate::input::{Button, HallChannel, TriggerMode};

/// Prompt for the button under calibration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WizardPrompt {
    /// Waiting for the press.
    Press,
    /// First half of the hold window.
    FullyPress,
    /// Rest of the hold window.
    Calibrating,
    /// Hold completed; the wizard moved on.
    Checked,
}

/// Result of one [`CalibrationWizard::poll`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WizardStep {
    Active {
        button: Button,
        prompt: WizardPrompt,
        raw: u16,
    },
    Complete,
}

pub struct CalibrationWizard {
    current: usize,
    held_since: Option<u32>,
}

impl CalibrationWizard {
    pub const fn new() -> Self {
        Self {
            current: 0,
            held_since: None,
        }
    }

    /// Index of the button being calibrated.
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn is_complete(&self, button_count: usize) -> bool {
        self.current >= button_count
    }

    /// Start over from the first button.
    pub fn restart(&mut self) {
        self.current = 0;
        self.held_since = None;
    }

    /// Sample the current button once and advance the wizard.
    pub fn poll<A: HallAdc>(&mut self, channels: &mut [HallChannel<A>], now_ms: u32) -> WizardStep {
        let Some(channel) = channels.get_mut(self.current) else {
            return WizardStep::Complete;
        };
        let Some(button) = Button::from_index(self.current) else {
            return WizardStep::Complete;
        };

        // Raw-mode trigger check doubles as the calibrating sample.
        let pressed = channel.is_triggered(TriggerMode::Raw);
        let raw = channel.last_raw();

        if !pressed {
            self.held_since = None;
            return WizardStep::Active {
                button,
                prompt: WizardPrompt::Press,
                raw,
            };
        }

        let since = *self.held_since.get_or_insert(now_ms);
        let held = now_ms.wrapping_sub(since);
        let prompt = if held >= CALIBRATION_HOLD_MS {
            info!(
                "calibration: button {} range {}..{}",
                self.current,
                channel.cal_min(),
                channel.cal_max()
            );
            self.current += 1;
            self.held_since = None;
            WizardPrompt::Checked
        } else if held < CALIBRATION_HOLD_MS / 2 {
            WizardPrompt::FullyPress
        } else {
            WizardPrompt::Calibrating
        };

        WizardStep::Active {
            button,
            prompt,
            raw,
        }
    }
}

impl Default for CalibrationWizard {
    fn default() -> Self {
        Self::new()
    }
}
