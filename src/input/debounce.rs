//! Shift-register debounce filter.
//!
//! Every sample is shifted into a 32-bit history where a set bit means
//! "released". Bits above the window are forced high by a fixed mask, so
//! the register can only equal the match pattern when the last `N + 1`
//! samples were exactly: one released sample followed by `N` pressed
//! samples. That happens on exactly one call per stable press, which
//! makes the output a one-shot rising-edge pulse rather than a level.
//!
//! The window is counted in samples: call [`DebounceFilter::update`] at
//! a fixed period ([`SCAN_PERIOD_MS`](crate::config::SCAN_PERIOD_MS)).

use crate::config::DEBOUNCE_STABLE_SAMPLES;

/// Longest supported run length; the window must fit in the register.
const MAX_STABLE_SAMPLES: u8 = 31;

/// Rising-edge detector for one button.
#[derive(Clone, Copy, Debug)]
pub struct DebounceFilter {
    history: u32,
    mask: u32,
    pattern: u32,
}

impl DebounceFilter {
    /// Filter requiring `stable_samples` consecutive pressed samples.
    /// The count is clamped to `1..=31`.
    pub const fn new(stable_samples: u8) -> Self {
        let n = if stable_samples == 0 {
            1
        } else if stable_samples > MAX_STABLE_SAMPLES {
            MAX_STABLE_SAMPLES
        } else {
            stable_samples
        };
        // Bits 0..n-1: pressed run; bit n: the released sample before it.
        let window = u32::MAX >> (MAX_STABLE_SAMPLES - n);
        let mask = !window;
        Self {
            history: u32::MAX,
            mask,
            pattern: mask | (1 << n),
        }
    }

    /// Shift in one sample; `true` exactly on the sample that completes a
    /// stable press.
    pub fn update(&mut self, level_high: bool) -> bool {
        self.history = (self.history << 1) | u32::from(!level_high) | self.mask;
        self.history == self.pattern
    }

    /// Forget all history; the button is considered released.
    pub fn reset(&mut self) {
        self.history = u32::MAX;
    }

    /// Number of pressed samples needed for an edge.
    pub fn stable_samples(&self) -> u8 {
        self.pattern.trailing_zeros() as u8
    }
}

impl Default for DebounceFilter {
    fn default() -> Self {
        Self::new(DEBOUNCE_STABLE_SAMPLES)
    }
}
