//! System configuration parameters
//!
//! All tunable parameters for the heater controller. Two historical
//! deployments (regulated PID drive and manually-driven output) are unified
//! here as configuration rather than forked code paths: the manual variant
//! is `regulated = false`, `smoothing_window = 1`, `fault_grace_ms = None`.

use serde::{Deserialize, Serialize};

/// Upper bound for the smoothing window (ring capacity is fixed).
pub const MAX_SMOOTHING_WINDOW: usize = 16;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Control mode ---
    /// PID-regulated output. When false, power is set only by operator
    /// commands and the PID is never consulted.
    pub regulated: bool,
    /// Re-read the tuning store before every PID computation.
    pub tuning_mode: bool,
    /// Emit a data-log record every control iteration.
    pub logging_mode: bool,

    // --- Sensor ---
    /// Expected sensor sample period (milliseconds). Also the dt fallback
    /// when sample timestamps are unusable.
    pub sensor_period_ms: u32,
    /// Number of samples in the rolling mean (1 = no smoothing).
    /// Clamped to [1, MAX_SMOOTHING_WINDOW] at use sites.
    pub smoothing_window: usize,
    /// Value the smoothing window is pre-seeded with (degrees C).
    pub seed_temp_c: f64,
    /// How long a sensor fault must persist before the output is
    /// deactivated. `None` deactivates on the first faulted sample.
    pub fault_grace_ms: Option<u64>,

    // --- Actuator ---
    /// Software PWM period for the relay drive (milliseconds).
    pub pwm_period_ms: u32,

    // --- Setpoint ---
    /// Lowest accepted setpoint (degrees C).
    pub setpoint_min_c: f64,
    /// Highest accepted setpoint (degrees C).
    pub setpoint_max_c: f64,

    // --- Tuning store ---
    /// Path of the tuning document. Absence is not an error.
    pub tuning_path: String,
    /// Path of the CSV data log (used when `logging_mode` is on).
    pub data_log_path: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            regulated: true,
            tuning_mode: false,
            logging_mode: false,

            sensor_period_ms: 1000,
            smoothing_window: 5,
            seed_temp_c: 20.0,
            fault_grace_ms: Some(11_000),

            pwm_period_ms: 1000,

            setpoint_min_c: 0.0,
            setpoint_max_c: 1500.0,

            tuning_path: "tuning.json".into(),
            data_log_path: "heater_data.csv".into(),
        }
    }
}

impl SystemConfig {
    /// Smoothing window clamped to the ring capacity.
    pub fn effective_window(&self) -> usize {
        self.smoothing_window.clamp(1, MAX_SMOOTHING_WINDOW)
    }
}
