//! Port traits — the boundary between the control core and the outside
//! world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlEngine (domain)
//! ```
//!
//! Driven adapters (the relay transport, the tuning store, display and
//! data-log sinks) implement these traits. The engine consumes them via
//! generics, so the core never touches a transport directly and the whole
//! control path runs against mocks in tests.

use crate::control::pid::Tunings;
use crate::error::{ActuatorError, ConfigError};

// ───────────────────────────────────────────────────────────────
// Relay port (domain → actuator hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the heater relay.
///
/// Failures are reported, never raised past the engine: the commanded
/// state is retried on the next control iteration (the sticky holds are
/// re-issued every iteration; a dead PWM cycle is re-kicked).
pub trait RelayPort {
    /// Drive the relay to `on` immediately and hold it.
    fn set_state(&mut self, on: bool) -> Result<(), ActuatorError>;

    /// Drive the relay to `on` for `duration_ms`, then report completion
    /// once via `Event::FlopCompleted`.
    fn set_monoflop(&mut self, on: bool, duration_ms: u32) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Tuning store (persistent tuning document → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the PID tuning document.
///
/// `Ok(None)` means the document does not exist — that is not an error;
/// the engine keeps its defaults and says so once. `Err` means the
/// document exists but is unreadable or malformed; the engine keeps the
/// previous tunings.
pub trait TuningStore {
    fn load(&self) -> Result<Option<Tunings>, ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink (domain → display / logging)
// ───────────────────────────────────────────────────────────────

/// The engine emits structured [`EngineEvent`](super::events::EngineEvent)s
/// through this port. Adapters decide where they go. Infallible by
/// signature: sinks swallow and log their own I/O problems.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::EngineEvent);
}

/// A missing collaborator: `Option<S>` forwards when present and is a
/// no-op when absent, so the engine never special-cases an absent display.
impl<S: EventSink> EventSink for Option<S> {
    fn emit(&mut self, event: &super::events::EngineEvent) {
        if let Some(sink) = self {
            sink.emit(event);
        }
    }
}

/// Fan-out: a pair of sinks both receive every event (display + data log).
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &super::events::EngineEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}
