//! Software PWM over a solid-state relay, built on the relay's monoflop
//! (one-shot timed state) primitive.
//!
//! A continuous 0–100 % power demand is turned into a binary drive signal
//! by alternating timed ON and OFF intervals inside a fixed period:
//! `on_time = round(power/100 * period)`, `off_time = period - on_time`.
//! Each interval is scheduled as a monoflop; its completion callback
//! schedules the next one, so the cycle sustains itself without polling.
//!
//! The extremes bypass PWM entirely as named **sticky** states:
//!
//! ```text
//!            apply(100)                 apply(0)
//!   Cycling ───────────▶ FullOn  Cycling ───────▶ FullOff
//!   FullOn/FullOff ── apply(0<p<100) ──▶ Cycling   (relay off + 0 ms kick)
//! ```
//!
//! Only `apply` leaves or enters the sticky states; a completion that
//! arrives while sticky (a stale flop from an abandoned cycle) is ignored.
//!
//! The actuator never trusts the hardware-reported relay state — one relay
//! firmware revision reports the post-flop state inverted relative to its
//! documentation. `relay_active` is tracked purely from what we commanded.

use heapless::Vec;
use log::debug;

/// A relay instruction produced by the state machine. The engine forwards
/// these to the `RelayPort`; keeping them as values keeps this module free
/// of I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayCommand {
    /// Drive the relay to a state immediately and hold it.
    SetState(bool),
    /// Drive the relay to a state for `duration_ms`, then fire completion.
    Monoflop { on: bool, duration_ms: u32 },
}

/// Commands emitted by one actuator call (at most two: forced-off + kick).
pub type RelayCommands = Vec<RelayCommand, 2>;

/// Named actuator states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PwmState {
    /// Relay held ON; PWM suspended.
    FullOn,
    /// Relay held OFF; PWM suspended.
    FullOff,
    /// Monoflop retrigger loop running.
    Cycling,
}

pub struct PwmActuator {
    period_ms: u32,
    power: f64,
    state: PwmState,
    /// Our own belief about the relay coil — the only truth source.
    relay_active: bool,
    /// A relay command failed; the next `apply` must re-kick the loop.
    retry_kick: bool,
}

impl PwmActuator {
    pub fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            power: 0.0,
            state: PwmState::FullOff,
            relay_active: false,
            retry_kick: false,
        }
    }

    /// Apply a new power demand. Returns the relay commands to issue.
    ///
    /// The sticky extremes re-issue their hold command every call, so a
    /// command lost to a transient relay fault is repaired on the next
    /// control iteration without extra bookkeeping.
    pub fn apply(&mut self, power: f64) -> RelayCommands {
        let power = power.clamp(0.0, 100.0);
        self.power = power;
        let mut cmds = RelayCommands::new();

        if power >= 100.0 {
            self.transition(PwmState::FullOn);
            self.relay_active = true;
            self.retry_kick = false;
            let _ = cmds.push(RelayCommand::SetState(true));
        } else if power <= 0.0 {
            self.transition(PwmState::FullOff);
            self.relay_active = false;
            self.retry_kick = false;
            let _ = cmds.push(RelayCommand::SetState(false));
        } else {
            let needs_kick = self.state != PwmState::Cycling || self.retry_kick;
            self.transition(PwmState::Cycling);
            if needs_kick {
                // Leaving a sticky state: force the relay off and schedule a
                // zero-duration flop whose completion starts the alternation.
                self.relay_active = false;
                self.retry_kick = false;
                let _ = cmds.push(RelayCommand::SetState(false));
                let _ = cmds.push(RelayCommand::Monoflop {
                    on: false,
                    duration_ms: 0,
                });
            }
            // Already cycling: the running loop picks up the new power on
            // its next completion.
        }

        cmds
    }

    /// Handle a monoflop completion. Returns the next interval to schedule,
    /// or `None` outside the cycling regime (stale flops are ignored).
    pub fn on_flop_complete(&mut self) -> Option<RelayCommand> {
        if self.state != PwmState::Cycling {
            return None;
        }
        if self.power <= 0.0 || self.power >= 100.0 {
            // Extremes are owned by the sticky transitions in `apply`.
            return None;
        }

        let on_time = ((self.power / 100.0) * f64::from(self.period_ms)).round() as u32;
        let off_time = self.period_ms - on_time;

        if self.relay_active {
            self.relay_active = false;
            Some(RelayCommand::Monoflop {
                on: false,
                duration_ms: off_time,
            })
        } else {
            self.relay_active = true;
            Some(RelayCommand::Monoflop {
                on: true,
                duration_ms: on_time,
            })
        }
    }

    /// Force the relay off and suspend cycling (shutdown path).
    pub fn force_off(&mut self) -> RelayCommand {
        self.power = 0.0;
        self.transition(PwmState::FullOff);
        self.relay_active = false;
        RelayCommand::SetState(false)
    }

    /// Record that an issued relay command failed; the next `apply` will
    /// re-kick the cycle instead of assuming the loop is alive.
    pub fn command_failed(&mut self) {
        self.retry_kick = true;
    }

    pub fn state(&self) -> PwmState {
        self.state
    }

    pub fn power(&self) -> f64 {
        self.power
    }

    pub fn relay_active(&self) -> bool {
        self.relay_active
    }

    fn transition(&mut self, next: PwmState) {
        if self.state != next {
            debug!("pwm: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}
