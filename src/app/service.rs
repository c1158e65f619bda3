//! The control engine — the composition root of the core.
//!
//! [`ControlEngine`] owns the smoother, the PID controller, the PWM
//! actuator, and every piece of process-wide mutable state (setpoint,
//! manual power, fault edge tracking, temperature history). All I/O flows
//! through port traits injected at call sites, making the entire engine
//! testable with mock adapters.
//!
//! ```text
//!  Event ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!            │        ControlEngine         │
//!  RelayPort ◀── Smoother · PID · PWM ──────│◀── TuningStore
//!            └──────────────────────────────┘
//! ```
//!
//! One iteration per incoming sample: smoother → (tuning reload) → PID or
//! manual power → PWM actuator → snapshot emission. The monoflop
//! completion path re-enters only the actuator. Handlers run to
//! completion; events are delivered serially by the dispatch loop.

use heapless::Deque;
use log::{info, warn};

use crate::config::SystemConfig;
use crate::control::pid::PidController;
use crate::control::pwm::{PwmActuator, RelayCommand, RelayCommands};
use crate::control::smoother::SensorSmoother;
use crate::events::{Event, Sample};

use super::commands::{PowerStep, SetpointStep};
use super::events::{EngineEvent, IterationSnapshot};
use super::ports::{EventSink, RelayPort, TuningStore};

/// Number of smoothed readings kept for trend display (one panel width).
pub const HISTORY_LEN: usize = 107;

/// The control engine orchestrates one iteration per incoming event.
pub struct ControlEngine {
    config: SystemConfig,
    smoother: SensorSmoother,
    pid: PidController,
    pwm: PwmActuator,

    /// Power demand currently driven into the actuator.
    power: f64,
    /// Operator-set power, used when `config.regulated` is false.
    manual_power: f64,
    /// Last accepted raw reading (held across faulted samples).
    last_temp_c: f64,
    /// Timestamp of the previous sample, for dt derivation.
    last_sample_ms: Option<u64>,

    /// Recent smoothed readings for trend display.
    history: Deque<f64, HISTORY_LEN>,

    /// "using default tunings" is logged once, not every iteration.
    defaults_logged: bool,
    was_deactivated: bool,
    running: bool,
    iterations: u64,
}

impl ControlEngine {
    /// Construct the engine from configuration.
    ///
    /// Does **not** touch any port — call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        let smoother = SensorSmoother::new(
            config.effective_window(),
            config.seed_temp_c,
            config.fault_grace_ms,
        );
        let pid = PidController::new(config.setpoint_min_c);
        let pwm = PwmActuator::new(config.pwm_period_ms);
        let seed = config.seed_temp_c;

        Self {
            config,
            smoother,
            pid,
            pwm,
            power: 0.0,
            manual_power: 0.0,
            last_temp_c: seed,
            last_sample_ms: None,
            history: Deque::new(),
            defaults_logged: false,
            was_deactivated: false,
            running: true,
            iterations: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Bring the engine up: load initial tunings, release the relay into
    /// its safe OFF state, and announce the start.
    pub fn start(
        &mut self,
        relay: &mut impl RelayPort,
        store: &impl TuningStore,
        sink: &mut impl EventSink,
    ) {
        self.reload_tunings(store);
        let release = self.pwm.force_off();
        self.issue(relay, release);
        sink.emit(&EngineEvent::Started {
            regulated: self.config.regulated,
        });
        info!(
            "engine started ({} mode, window={}, grace={:?})",
            if self.config.regulated { "regulated" } else { "unregulated" },
            self.config.effective_window(),
            self.config.fault_grace_ms,
        );
    }

    /// Whether the dispatch loop should keep running.
    pub fn is_running(&self) -> bool {
        self.running
    }

    // ── Event dispatch ────────────────────────────────────────

    /// Consume one event. Handlers run to completion; nothing here blocks.
    pub fn dispatch(
        &mut self,
        event: Event,
        relay: &mut impl RelayPort,
        store: &impl TuningStore,
        sink: &mut impl EventSink,
    ) {
        match event {
            Event::SampleArrived(sample) => self.handle_sample(&sample, relay, store, sink),
            Event::FlopCompleted => self.handle_flop_complete(relay),
            Event::SetpointChanged(step) => self.handle_setpoint_step(step, sink),
            Event::PowerChanged(step) => self.handle_power_step(step, relay, sink),
            Event::TuningsReloaded(tunings) => {
                self.pid.set_tunings(tunings);
                info!("tunings updated externally");
            }
            Event::Shutdown => self.shutdown(relay, sink),
        }
    }

    // ── Per-sample orchestration ──────────────────────────────

    /// Run one control iteration: smooth → regulate → actuate → report.
    fn handle_sample(
        &mut self,
        sample: &Sample,
        relay: &mut impl RelayPort,
        store: &impl TuningStore,
        sink: &mut impl EventSink,
    ) {
        let dt = self.dt_secs(sample.timestamp_ms);
        self.last_sample_ms = Some(sample.timestamp_ms);

        // 1. Smoothing + fault gating
        let verdict = self.smoother.accept(sample);

        // 2. Power decision
        let power = if verdict.deactivated {
            info!("sensor fault active; output deactivated");
            0.0
        } else if self.config.regulated {
            if self.config.tuning_mode {
                self.reload_tunings(store);
            }
            self.pid.compute(verdict.smoothed_c, dt)
        } else {
            self.manual_power
        };
        self.power = power;

        if !sample.faults.any() {
            self.last_temp_c = sample.temp_c();
            if !verdict.deactivated {
                self.push_history(verdict.smoothed_c);
            }
        }

        // 3. Actuation
        let cmds = self.pwm.apply(power);
        self.issue_all(relay, &cmds);

        // 4. Notification (fire-and-forget)
        if verdict.deactivated != self.was_deactivated {
            sink.emit(if verdict.deactivated {
                &EngineEvent::Deactivated
            } else {
                &EngineEvent::Recovered
            });
            self.was_deactivated = verdict.deactivated;
        }
        self.iterations += 1;
        sink.emit(&EngineEvent::Iteration(self.snapshot(sample.timestamp_ms, &verdict)));
    }

    /// A monoflop interval elapsed: let the actuator schedule the next one.
    fn handle_flop_complete(&mut self, relay: &mut impl RelayPort) {
        if let Some(cmd) = self.pwm.on_flop_complete() {
            self.issue(relay, cmd);
        }
    }

    // ── Operator input ────────────────────────────────────────

    fn handle_setpoint_step(&mut self, step: SetpointStep, sink: &mut impl EventSink) {
        let setpoint = (self.pid.setpoint() + step.delta_c())
            .clamp(self.config.setpoint_min_c, self.config.setpoint_max_c);
        self.pid.set_setpoint(setpoint);
        info!("setpoint -> {setpoint} degC");
        sink.emit(&EngineEvent::SetpointChanged {
            setpoint_c: setpoint,
        });
    }

    fn handle_power_step(
        &mut self,
        step: PowerStep,
        relay: &mut impl RelayPort,
        sink: &mut impl EventSink,
    ) {
        if self.config.regulated {
            warn!("manual power step ignored: controller is in regulated mode");
            return;
        }
        self.manual_power = (self.manual_power + step.delta_pct()).clamp(0.0, 100.0);
        info!("manual power -> {}%", self.manual_power);
        sink.emit(&EngineEvent::PowerChanged {
            power_pct: self.manual_power,
        });

        // Apply immediately unless a sensor fault is holding the output off.
        if !self.smoother.is_deactivated() {
            self.power = self.manual_power;
            let cmds = self.pwm.apply(self.manual_power);
            self.issue_all(relay, &cmds);
        }
    }

    /// Operator shutdown: release the relay OFF, then stop the loop.
    pub fn shutdown(&mut self, relay: &mut impl RelayPort, sink: &mut impl EventSink) {
        let release = self.pwm.force_off();
        self.issue(relay, release);
        self.power = 0.0;
        self.running = false;
        sink.emit(&EngineEvent::Stopped);
        info!("engine shut down; relay released OFF");
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn setpoint(&self) -> f64 {
        self.pid.setpoint()
    }

    pub fn power(&self) -> f64 {
        self.power
    }

    pub fn relay_active(&self) -> bool {
        self.pwm.relay_active()
    }

    /// Recent smoothed readings, oldest first (for trend display).
    pub fn recent_temps(&self) -> impl Iterator<Item = f64> + '_ {
        self.history.iter().copied()
    }

    /// Total control iterations executed since startup.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    // ── Internal ──────────────────────────────────────────────

    /// dt from consecutive sample timestamps, falling back to the nominal
    /// period on the first sample or under clock skew.
    fn dt_secs(&self, now_ms: u64) -> f64 {
        let nominal = f64::from(self.config.sensor_period_ms) / 1000.0;
        match self.last_sample_ms {
            Some(prev) if now_ms > prev => (now_ms - prev) as f64 / 1000.0,
            _ => nominal,
        }
    }

    fn reload_tunings(&mut self, store: &impl TuningStore) {
        match store.load() {
            Ok(Some(tunings)) => self.pid.set_tunings(tunings),
            Ok(None) => {
                if !self.defaults_logged {
                    info!("tuning store absent; using default tunings");
                    self.defaults_logged = true;
                }
            }
            Err(e) => {
                warn!("tuning reload failed ({e}); keeping previous tunings");
            }
        }
    }

    fn push_history(&mut self, smoothed_c: f64) {
        if self.history.is_full() {
            self.history.pop_front();
        }
        let _ = self.history.push_back(smoothed_c);
    }

    fn issue(&mut self, relay: &mut impl RelayPort, cmd: RelayCommand) {
        let result = match cmd {
            RelayCommand::SetState(on) => relay.set_state(on),
            RelayCommand::Monoflop { on, duration_ms } => relay.set_monoflop(on, duration_ms),
        };
        if let Err(e) = result {
            warn!("relay command failed ({e}); retrying next iteration");
            self.pwm.command_failed();
        }
    }

    fn issue_all(&mut self, relay: &mut impl RelayPort, cmds: &RelayCommands) {
        for cmd in cmds {
            self.issue(relay, *cmd);
        }
    }

    fn snapshot(
        &self,
        timestamp_ms: u64,
        verdict: &crate::control::smoother::SmootherVerdict,
    ) -> IterationSnapshot {
        IterationSnapshot {
            timestamp_ms,
            temp_c: self.last_temp_c,
            smoothed_c: verdict.smoothed_c,
            setpoint_c: self.pid.setpoint(),
            power_pct: self.power,
            deactivated: verdict.deactivated,
            tunings: self.pid.tunings(),
            components: self.pid.components(),
        }
    }
}
