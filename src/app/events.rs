//! Outbound engine events.
//!
//! The [`ControlEngine`](super::service::ControlEngine) emits these through
//! the [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them — render a panel, append a CSV record,
//! log to the console. Emission is fire-and-forget: no sink can fail or
//! block the control path.

use crate::control::pid::{PidComponents, Tunings};

/// Structured events emitted by the control core.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The engine has started (relay driven to its safe OFF state).
    Started { regulated: bool },

    /// One control iteration completed.
    Iteration(IterationSnapshot),

    /// The sensor fault persisted past the grace period; output forced off.
    Deactivated,

    /// The sensor reported fault-free again; normal control resumed.
    Recovered,

    /// Operator changed the setpoint.
    SetpointChanged { setpoint_c: f64 },

    /// Operator changed the manual power (unregulated mode).
    PowerChanged { power_pct: f64 },

    /// The engine shut down; the relay was released OFF.
    Stopped,
}

/// A point-in-time record of one control iteration, sized for both the
/// display panel and the per-iteration data log.
#[derive(Debug, Clone, Copy)]
pub struct IterationSnapshot {
    /// Timestamp of the driving sample (monotonic milliseconds).
    pub timestamp_ms: u64,
    /// Last accepted raw reading (degrees C). Held at its previous value
    /// while the sensor is faulted.
    pub temp_c: f64,
    /// Rolling-mean temperature the PID saw (degrees C).
    pub smoothed_c: f64,
    pub setpoint_c: f64,
    /// Power demand driven into the PWM actuator this iteration.
    pub power_pct: f64,
    /// True while the sensor fault state forces the output off.
    pub deactivated: bool,
    /// Gains in effect this iteration.
    pub tunings: Tunings,
    /// PID term breakdown this iteration.
    pub components: PidComponents,
}
