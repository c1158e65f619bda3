//! PID controller for heater power.
//!
//! Proportional-integral-derivative controller with output clamped to a
//! 0–100 % power demand. Beyond the textbook terms it carries the features
//! the heater rig needs:
//!
//! - an additive **bias** applied before clamping (baseline loss of the
//!   heated vessel),
//! - **proportional-on-measurement**: the P term accumulates from the
//!   measurement's rate of change instead of the instantaneous error, so a
//!   setpoint step does not bump the output,
//! - derivative on the measurement (no derivative kick on setpoint steps),
//! - **zero-crossing integral reset**: the accumulated integral is
//!   discarded the moment the control error changes sign, so the system
//!   does not spend minutes unwinding stale integral after overshoot.
//!
//! Tunings are hot-swappable between iterations; all-zero gains are the
//! fail-safe default and produce zero output.

use serde::{Deserialize, Serialize};

/// Power demand limits (percent).
const OUTPUT_MIN: f64 = 0.0;
const OUTPUT_MAX: f64 = 100.0;

/// PID tuning document.
///
/// Every field is optional in the serialised form; missing keys fall back
/// to the zero/false defaults so a partial document degrades safely.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunings {
    pub p: f64,
    pub i: f64,
    pub d: f64,
    pub bias: f64,
    pub proportional_on_measurement: bool,
}

/// Per-iteration breakdown of the PID terms, for the data-log sink.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PidComponents {
    pub proportional: f64,
    pub integral: f64,
    pub derivative: f64,
}

/// PID controller
pub struct PidController {
    tunings: Tunings,
    setpoint: f64,

    /// P term. Assigned each call in error mode; accumulated from
    /// -kp * d_measurement in proportional-on-measurement mode.
    p_term: f64,
    /// Accumulated I term (already ki-weighted, so hot gain changes do not
    /// retroactively rescale history).
    integral: f64,
    /// Last computed D term, kept for the component breakdown.
    d_term: f64,

    prev_error: Option<f64>,
    prev_measurement: Option<f64>,
}

impl PidController {
    pub fn new(setpoint: f64) -> Self {
        Self {
            tunings: Tunings::default(),
            setpoint,
            p_term: 0.0,
            integral: 0.0,
            d_term: 0.0,
            prev_error: None,
            prev_measurement: None,
        }
    }

    /// Update the target temperature. Takes effect on the next `compute`.
    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// Swap in a new tuning set. Accumulated state is kept — tunings are
    /// hot-reloaded every iteration in tuning mode and resetting here would
    /// wipe the integral each time.
    pub fn set_tunings(&mut self, tunings: Tunings) {
        self.tunings = tunings;
    }

    pub fn tunings(&self) -> Tunings {
        self.tunings
    }

    /// Compute the power demand for the current measurement.
    ///
    /// `dt_secs` is the time since the previous call, derived from sample
    /// timestamps by the caller. Output is clamped to [0, 100].
    pub fn compute(&mut self, measurement: f64, dt_secs: f64) -> f64 {
        let error = self.setpoint - measurement;
        let d_input = self.prev_measurement.map_or(0.0, |prev| measurement - prev);

        // The instant the error crosses through zero, the accumulated
        // integral belongs to the old side of the setpoint.
        if let Some(prev) = self.prev_error {
            if prev * error < 0.0 {
                self.integral = 0.0;
            }
        }

        if self.tunings.proportional_on_measurement {
            self.p_term -= self.tunings.p * d_input;
        } else {
            self.p_term = self.tunings.p * error;
        }

        self.integral += self.tunings.i * error * dt_secs;

        self.d_term = if dt_secs > 0.0 {
            -self.tunings.d * d_input / dt_secs
        } else {
            0.0
        };

        self.prev_error = Some(error);
        self.prev_measurement = Some(measurement);

        let output = self.p_term + self.integral + self.d_term + self.tunings.bias;
        output.clamp(OUTPUT_MIN, OUTPUT_MAX)
    }

    /// The last iteration's term breakdown.
    pub fn components(&self) -> PidComponents {
        PidComponents {
            proportional: self.p_term,
            integral: self.integral,
            derivative: self.d_term,
        }
    }

    /// Reset accumulated controller state.
    pub fn reset(&mut self) {
        self.p_term = 0.0;
        self.integral = 0.0;
        self.d_term = 0.0;
        self.prev_error = None;
        self.prev_measurement = None;
    }
}
