//! Mock relay and collaborators for integration tests.
//!
//! Records every relay call so tests can assert on the full command
//! history without touching a real transport.

use kilnctl::app::events::EngineEvent;
use kilnctl::app::ports::{EventSink, RelayPort, TuningStore};
use kilnctl::control::pid::Tunings;
use kilnctl::{ActuatorError, ConfigError};

// ── Relay call record ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayCall {
    SetState(bool),
    Monoflop { on: bool, duration_ms: u32 },
}

// ── MockRelay ─────────────────────────────────────────────────

pub struct MockRelay {
    pub calls: Vec<RelayCall>,
    /// Fail this many upcoming commands (then succeed again).
    pub fail_next: u32,
}

#[allow(dead_code)]
impl MockRelay {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            fail_next: 0,
        }
    }

    pub fn last_call(&self) -> Option<&RelayCall> {
        self.calls.last()
    }

    /// Commanded relay state according to the recorded history.
    pub fn commanded_on(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                RelayCall::SetState(on) => Some(*on),
                RelayCall::Monoflop { on, .. } => Some(*on),
            })
            .unwrap_or(false)
    }

    pub fn monoflops(&self) -> Vec<RelayCall> {
        self.calls
            .iter()
            .filter(|c| matches!(c, RelayCall::Monoflop { .. }))
            .copied()
            .collect()
    }

    fn record(&mut self, call: RelayCall, err: ActuatorError) -> Result<(), ActuatorError> {
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(err);
        }
        self.calls.push(call);
        Ok(())
    }
}

impl Default for MockRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayPort for MockRelay {
    fn set_state(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.record(RelayCall::SetState(on), ActuatorError::SetStateFailed)
    }

    fn set_monoflop(&mut self, on: bool, duration_ms: u32) -> Result<(), ActuatorError> {
        self.record(
            RelayCall::Monoflop { on, duration_ms },
            ActuatorError::MonoflopFailed,
        )
    }
}

// ── Tuning store stub ─────────────────────────────────────────

pub enum MockStore {
    Absent,
    Fixed(Tunings),
    Broken,
}

impl TuningStore for MockStore {
    fn load(&self) -> Result<Option<Tunings>, ConfigError> {
        match self {
            Self::Absent => Ok(None),
            Self::Fixed(t) => Ok(Some(*t)),
            Self::Broken => Err(ConfigError::Malformed),
        }
    }
}

// ── Recording event sink ──────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<EngineEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&EngineEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &EngineEvent) {
        self.events.push(event.clone());
    }
}
