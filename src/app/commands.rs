//! Operator input.
//!
//! The panel exposes fixed-size step buttons rather than free-form entry:
//! six setpoint steps in regulated mode, four power steps in unregulated
//! mode, and shutdown. Adapters translate button presses into these values
//! and enqueue them as [`Event`](crate::events::Event)s.

/// Setpoint adjustment steps (degrees C).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetpointStep {
    Down100,
    Down10,
    Down1,
    Up1,
    Up10,
    Up100,
}

impl SetpointStep {
    /// Signed step size in degrees C.
    pub fn delta_c(self) -> f64 {
        match self {
            Self::Down100 => -100.0,
            Self::Down10 => -10.0,
            Self::Down1 => -1.0,
            Self::Up1 => 1.0,
            Self::Up10 => 10.0,
            Self::Up100 => 100.0,
        }
    }
}

/// Manual power adjustment steps (percent), honoured only in unregulated
/// mode — the PID owns the power in regulated mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerStep {
    Down10,
    Down1,
    Up1,
    Up10,
}

impl PowerStep {
    /// Signed step size in percent.
    pub fn delta_pct(self) -> f64 {
        match self {
            Self::Down10 => -10.0,
            Self::Down1 => -1.0,
            Self::Up1 => 1.0,
            Self::Up10 => 10.0,
        }
    }
}
