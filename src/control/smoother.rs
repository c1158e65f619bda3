//! Thermocouple sample smoothing and fault gating.
//!
//! Maintains a fixed-capacity ring of the last N accepted readings and
//! returns their arithmetic mean, so a single noisy reading (a physically
//! bumped probe, a conversion glitch) cannot yank the PID around. The ring
//! is pre-seeded with a starting value, so the mean is defined from the
//! very first sample.
//!
//! The smoother also owns the sensor fault state. Two policies, selected by
//! configuration:
//!
//! - **instantaneous** (`fault_grace_ms = None`): any faulted sample
//!   deactivates the output for that cycle;
//! - **delayed** (`Some(ms)`): a fault must persist continuously past the
//!   grace period before the output is deactivated, riding out momentary
//!   flicker.
//!
//! Clearing is immediate in both policies. A faulted reading never enters
//! the ring, and the ring is frozen while deactivated — the rolling mean
//! only ever contains trusted values.

use crate::config::MAX_SMOOTHING_WINDOW;
use crate::events::Sample;

/// What the smoother concluded about one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmootherVerdict {
    /// Mean of the last N accepted readings (degrees C).
    pub smoothed_c: f64,
    /// Output must be forced to zero this cycle.
    pub deactivated: bool,
}

pub struct SensorSmoother {
    ring: [f64; MAX_SMOOTHING_WINDOW],
    head: usize,
    window: usize,
    fault_grace_ms: Option<u64>,
    faulted_since_ms: Option<u64>,
    deactivated: bool,
}

impl SensorSmoother {
    /// `window` is clamped to [1, `MAX_SMOOTHING_WINDOW`]; the ring starts
    /// filled with `seed_c`.
    pub fn new(window: usize, seed_c: f64, fault_grace_ms: Option<u64>) -> Self {
        Self {
            ring: [seed_c; MAX_SMOOTHING_WINDOW],
            head: 0,
            window: window.clamp(1, MAX_SMOOTHING_WINDOW),
            fault_grace_ms,
            faulted_since_ms: None,
            deactivated: false,
        }
    }

    /// Fold one sample into the window and fault state.
    pub fn accept(&mut self, sample: &Sample) -> SmootherVerdict {
        let now = sample.timestamp_ms;
        let faulted = sample.faults.any();

        if faulted {
            if self.faulted_since_ms.is_none() {
                self.faulted_since_ms = Some(now);
            }
        } else {
            // No grace on recovery: one clean reading clears the fault.
            self.faulted_since_ms = None;
        }

        self.deactivated = match self.fault_grace_ms {
            None => faulted,
            Some(grace) => self
                .faulted_since_ms
                .is_some_and(|since| now.saturating_sub(since) > grace),
        };

        if !faulted && !self.deactivated {
            self.ring[self.head] = sample.temp_c();
            self.head = (self.head + 1) % self.window;
        }

        SmootherVerdict {
            smoothed_c: self.mean(),
            deactivated: self.deactivated,
        }
    }

    /// Mean of the current window contents.
    pub fn mean(&self) -> f64 {
        let sum: f64 = self.ring[..self.window].iter().sum();
        sum / self.window as f64
    }

    /// Whether the last accepted sample left the output deactivated.
    pub fn is_deactivated(&self) -> bool {
        self.deactivated
    }
}
