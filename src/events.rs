//! Inbound event model.
//!
//! Every stimulus the controller reacts to is a discrete [`Event`]:
//!
//! - the periodic thermocouple sample (temperature + fault flags),
//! - the relay monoflop completion callback,
//! - operator input (setpoint / manual power steps, shutdown),
//! - an externally pushed tuning update.
//!
//! Collaborators produce events into the [`EventQueue`]; a single dispatch
//! loop consumes them one at a time and runs each engine handler to
//! completion. There is no concurrent mutation of controller state — the
//! queue is the only way in.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Sensor clock │────▶│              │     │              │
//! │ Flop timer   │────▶│  EventQueue  │────▶│ Dispatch loop│
//! │ Operator     │────▶│  (FIFO, 32)  │     │  (consumer)  │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```

use heapless::Deque;

use crate::app::commands::{PowerStep, SetpointStep};
use crate::control::pid::Tunings;

/// Maximum number of pending events.
/// Power of 2 for an efficient ring layout.
pub const EVENT_QUEUE_CAP: usize = 32;

/// Fault flags reported by the thermocouple alongside each reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultFlags {
    pub over_under_voltage: bool,
    pub open_circuit: bool,
}

impl FaultFlags {
    /// True if any fault condition is signalled.
    pub fn any(self) -> bool {
        self.over_under_voltage || self.open_circuit
    }
}

/// One timestamped thermocouple reading.
///
/// `temp_centi` is the sensor's native fixed-point unit: hundredths of a
/// degree C. `timestamp_ms` is a monotonic millisecond clock owned by the
/// event source — the engine never reads wall-clock time itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub timestamp_ms: u64,
    pub temp_centi: i32,
    pub faults: FaultFlags,
}

impl Sample {
    /// Temperature in degrees C.
    pub fn temp_c(&self) -> f64 {
        f64::from(self.temp_centi) / 100.0
    }
}

/// System event types consumed by the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// A new thermocouple sample arrived.
    SampleArrived(Sample),
    /// A relay monoflop interval elapsed.
    FlopCompleted,
    /// Operator stepped the setpoint.
    SetpointChanged(SetpointStep),
    /// Operator stepped the manual output power (unregulated mode).
    PowerChanged(PowerStep),
    /// New tunings were pushed from outside the control path.
    TuningsReloaded(Tunings),
    /// Operator-initiated shutdown.
    Shutdown,
}

// ── Fixed-capacity FIFO ───────────────────────────────────────
//
// Owned by the runtime and drained by the single dispatch loop; producers
// push through it between dispatch rounds. A full queue drops the event
// (returns false) rather than blocking — no producer may stall the
// control path.

/// Fixed-capacity event FIFO.
pub struct EventQueue {
    queue: Deque<Event, EVENT_QUEUE_CAP>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            queue: Deque::new(),
        }
    }

    /// Push an event. Returns `false` if the queue is full (event dropped).
    pub fn push(&mut self, event: Event) -> bool {
        self.queue.push_back(event).is_ok()
    }

    /// Pop the next event in FIFO order.
    pub fn pop(&mut self) -> Option<Event> {
        self.queue.pop_front()
    }

    /// Drain all pending events into a handler, FIFO order.
    pub fn drain(&mut self, mut handler: impl FnMut(Event)) {
        while let Some(event) = self.pop() {
            handler(event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
