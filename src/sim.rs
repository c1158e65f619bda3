//! Simulated heater rig.
//!
//! The real installation puts a thermocouple and a solid-state relay on a
//! hardware transport; neither is part of this crate. The simulator stands
//! in for both so the binary can exercise the full engine: a relay whose
//! monoflop deadline is advanced by the caller's clock, and a first-order
//! thermal plant heated by the relay and cooled towards ambient.

use crate::app::ports::RelayPort;
use crate::error::ActuatorError;

// ── Relay ─────────────────────────────────────────────────────

/// In-memory relay with monoflop support.
pub struct SimRelay {
    on: bool,
    /// (deadline_ms, state commanded for the flop interval)
    pending_flop: Option<(u64, bool)>,
    now_ms: u64,
}

impl SimRelay {
    pub fn new() -> Self {
        Self {
            on: false,
            pending_flop: None,
            now_ms: 0,
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Advance the rig clock. Returns `true` when a monoflop interval
    /// elapsed — the caller turns that into an `Event::FlopCompleted`.
    ///
    /// On expiry the relay flips to the opposite of the commanded flop
    /// state, as the hardware does; the controller's next command follows
    /// immediately, and the engine never reads this flag anyway.
    pub fn advance_to(&mut self, now_ms: u64) -> bool {
        self.now_ms = now_ms;
        match self.pending_flop {
            Some((deadline, state)) if now_ms >= deadline => {
                self.pending_flop = None;
                self.on = !state;
                true
            }
            _ => false,
        }
    }
}

impl Default for SimRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayPort for SimRelay {
    fn set_state(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.on = on;
        self.pending_flop = None;
        Ok(())
    }

    fn set_monoflop(&mut self, on: bool, duration_ms: u32) -> Result<(), ActuatorError> {
        self.on = on;
        self.pending_flop = Some((self.now_ms + u64::from(duration_ms), on));
        Ok(())
    }
}

// ── Thermal plant ─────────────────────────────────────────────

/// First-order lumped thermal model:
/// `dT/dt = heat_rate·relay − loss·(T − ambient)`.
pub struct ThermalModel {
    temp_c: f64,
    ambient_c: f64,
    /// Heating rate with the relay closed (degC per second).
    heat_rate: f64,
    /// Cooling coefficient towards ambient (1 per second).
    loss: f64,
}

impl ThermalModel {
    pub fn new(start_c: f64) -> Self {
        Self {
            temp_c: start_c,
            ambient_c: start_c,
            heat_rate: 2.0,
            loss: 0.005,
        }
    }

    /// Integrate one step of `dt_secs` with the relay in the given state.
    pub fn step(&mut self, relay_on: bool, dt_secs: f64) {
        let heating = if relay_on { self.heat_rate } else { 0.0 };
        let cooling = self.loss * (self.temp_c - self.ambient_c);
        self.temp_c += (heating - cooling) * dt_secs;
    }

    pub fn temp_c(&self) -> f64 {
        self.temp_c
    }

    /// The sensor's fixed-point reading (hundredths of a degree).
    pub fn temp_centi(&self) -> i32 {
        (self.temp_c * 100.0).round() as i32
    }
}
