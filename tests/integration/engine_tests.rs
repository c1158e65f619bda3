//! End-to-end scenarios: events in, relay command stream out.

use crate::mock_relay::{MockRelay, MockStore, RecordingSink, RelayCall};

use kilnctl::app::commands::{PowerStep, SetpointStep};
use kilnctl::app::events::EngineEvent;
use kilnctl::app::service::ControlEngine;
use kilnctl::config::SystemConfig;
use kilnctl::control::pid::Tunings;
use kilnctl::events::{Event, FaultFlags, Sample};

fn clean(ts: u64, temp_c: f64) -> Event {
    Event::SampleArrived(Sample {
        timestamp_ms: ts,
        temp_centi: (temp_c * 100.0).round() as i32,
        faults: FaultFlags::default(),
    })
}

fn faulted(ts: u64) -> Event {
    Event::SampleArrived(Sample {
        timestamp_ms: ts,
        temp_centi: 0,
        faults: FaultFlags {
            open_circuit: true,
            ..FaultFlags::default()
        },
    })
}

fn started_engine(
    config: SystemConfig,
    store: &MockStore,
) -> (ControlEngine, MockRelay, RecordingSink) {
    let mut engine = ControlEngine::new(config);
    let mut relay = MockRelay::new();
    let mut sink = RecordingSink::new();
    engine.start(&mut relay, store, &mut sink);
    (engine, relay, sink)
}

fn step_setpoint(
    engine: &mut ControlEngine,
    relay: &mut MockRelay,
    store: &MockStore,
    sink: &mut RecordingSink,
    steps: &[SetpointStep],
) {
    for step in steps {
        engine.dispatch(Event::SetpointChanged(*step), relay, store, sink);
    }
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_releases_relay_off() {
    let store = MockStore::Absent;
    let (engine, relay, sink) = started_engine(SystemConfig::default(), &store);
    assert_eq!(relay.calls, [RelayCall::SetState(false)]);
    assert!(engine.is_running());
    assert!(sink
        .events
        .iter()
        .any(|e| matches!(e, EngineEvent::Started { regulated: true })));
}

// ── The five-sample warmup scenario ───────────────────────────

#[test]
fn warmup_reaches_eight_percent_and_kicks_pwm() {
    let store = MockStore::Fixed(Tunings {
        p: 2.0,
        ..Tunings::default()
    });
    let (mut engine, mut relay, mut sink) = started_engine(SystemConfig::default(), &store);
    step_setpoint(
        &mut engine,
        &mut relay,
        &store,
        &mut sink,
        &[SetpointStep::Up10, SetpointStep::Up10, SetpointStep::Up10],
    );

    for (i, t) in [22.0, 24.0, 26.0, 28.0, 30.0].iter().enumerate() {
        engine.dispatch(
            clean((i as u64 + 1) * 1000, *t),
            &mut relay,
            &store,
            &mut sink,
        );
    }

    // mean(22,24,26,28,30) = 26; power = 2 * (30 - 26) = 8.
    assert!((engine.power() - 8.0).abs() < 1e-9);

    // The first nonzero demand left FULL_OFF with the canonical kick.
    assert_eq!(
        &relay.calls[..3],
        [
            RelayCall::SetState(false), // start: safe release
            RelayCall::SetState(false), // kick: forced off
            RelayCall::Monoflop {
                on: false,
                duration_ms: 0
            },
        ]
    );

    // Completions now alternate 80 ms ON / 920 ms OFF.
    engine.dispatch(Event::FlopCompleted, &mut relay, &store, &mut sink);
    engine.dispatch(Event::FlopCompleted, &mut relay, &store, &mut sink);
    let flops = relay.monoflops();
    assert_eq!(
        &flops[flops.len() - 2..],
        [
            RelayCall::Monoflop {
                on: true,
                duration_ms: 80
            },
            RelayCall::Monoflop {
                on: false,
                duration_ms: 920
            },
        ]
    );
}

// ── Sticky states ─────────────────────────────────────────────

#[test]
fn saturated_demand_holds_relay_on_and_ignores_flops() {
    let store = MockStore::Fixed(Tunings {
        p: 100.0,
        ..Tunings::default()
    });
    let (mut engine, mut relay, mut sink) = started_engine(SystemConfig::default(), &store);
    step_setpoint(
        &mut engine,
        &mut relay,
        &store,
        &mut sink,
        &[SetpointStep::Up100],
    );

    engine.dispatch(clean(1000, 20.0), &mut relay, &store, &mut sink);
    assert_eq!(engine.power(), 100.0);
    assert_eq!(relay.last_call(), Some(&RelayCall::SetState(true)));

    // A stale completion from an abandoned cycle changes nothing.
    let before = relay.calls.len();
    engine.dispatch(Event::FlopCompleted, &mut relay, &store, &mut sink);
    assert_eq!(relay.calls.len(), before);

    // The hold is re-issued on every iteration (transient fault repair).
    engine.dispatch(clean(2000, 20.0), &mut relay, &store, &mut sink);
    assert_eq!(relay.last_call(), Some(&RelayCall::SetState(true)));
}

#[test]
fn steady_cycling_issues_no_relay_traffic_between_flops() {
    let store = MockStore::Fixed(Tunings {
        p: 2.0,
        ..Tunings::default()
    });
    let (mut engine, mut relay, mut sink) = started_engine(SystemConfig::default(), &store);
    step_setpoint(
        &mut engine,
        &mut relay,
        &store,
        &mut sink,
        &[SetpointStep::Up10, SetpointStep::Up10, SetpointStep::Up10],
    );

    engine.dispatch(clean(1000, 26.0), &mut relay, &store, &mut sink);
    let after_kick = relay.calls.len();

    // Demand stays strictly inside (0, 100): apply() must stay quiet.
    for i in 2..10 {
        engine.dispatch(clean(i * 1000, 26.0), &mut relay, &store, &mut sink);
    }
    assert_eq!(relay.calls.len(), after_kick);
}

// ── Fault handling ────────────────────────────────────────────

#[test]
fn persistent_fault_deactivates_until_cleared() {
    let store = MockStore::Fixed(Tunings {
        p: 5.0,
        ..Tunings::default()
    });
    let (mut engine, mut relay, mut sink) = started_engine(SystemConfig::default(), &store);
    step_setpoint(
        &mut engine,
        &mut relay,
        &store,
        &mut sink,
        &[SetpointStep::Up100],
    );

    engine.dispatch(clean(0, 20.0), &mut relay, &store, &mut sink);
    assert_eq!(engine.power(), 100.0);

    // Faulted samples within the 11 s grace: output keeps running on the
    // stale mean.
    for ts in [1000, 5000, 11_000] {
        engine.dispatch(faulted(ts), &mut relay, &store, &mut sink);
        assert_eq!(engine.power(), 100.0, "still live at {ts}");
    }

    // Past the grace period (fault began at t=1000): deactivated, forced
    // off, and it stays off.
    engine.dispatch(faulted(12_500), &mut relay, &store, &mut sink);
    assert_eq!(engine.power(), 0.0);
    assert_eq!(relay.last_call(), Some(&RelayCall::SetState(false)));
    assert_eq!(sink.count(|e| matches!(e, EngineEvent::Deactivated)), 1);

    engine.dispatch(faulted(13_000), &mut relay, &store, &mut sink);
    assert_eq!(engine.power(), 0.0);

    // One clean reading recovers immediately.
    engine.dispatch(clean(14_000, 20.0), &mut relay, &store, &mut sink);
    assert_eq!(engine.power(), 100.0);
    assert_eq!(sink.count(|e| matches!(e, EngineEvent::Recovered)), 1);
}

#[test]
fn faulted_samples_do_not_pollute_the_mean() {
    let store = MockStore::Fixed(Tunings {
        p: 2.0,
        ..Tunings::default()
    });
    let config = SystemConfig {
        smoothing_window: 1, // make the mean the instantaneous value
        ..SystemConfig::default()
    };
    let (mut engine, mut relay, mut sink) = started_engine(config, &store);
    step_setpoint(
        &mut engine,
        &mut relay,
        &store,
        &mut sink,
        &[SetpointStep::Up10, SetpointStep::Up10, SetpointStep::Up10],
    );

    engine.dispatch(clean(1000, 26.0), &mut relay, &store, &mut sink);
    assert!((engine.power() - 8.0).abs() < 1e-9);

    // A faulted sample inside the grace window carries garbage temperature;
    // the PID must keep seeing 26.
    engine.dispatch(faulted(2000), &mut relay, &store, &mut sink);
    assert!((engine.power() - 8.0).abs() < 1e-9);
}

#[test]
fn instantaneous_policy_forces_off_per_faulted_cycle() {
    let store = MockStore::Fixed(Tunings {
        p: 2.0,
        ..Tunings::default()
    });
    let config = SystemConfig {
        fault_grace_ms: None,
        ..SystemConfig::default()
    };
    let (mut engine, mut relay, mut sink) = started_engine(config, &store);
    step_setpoint(
        &mut engine,
        &mut relay,
        &store,
        &mut sink,
        &[SetpointStep::Up10, SetpointStep::Up10, SetpointStep::Up10],
    );

    engine.dispatch(clean(1000, 26.0), &mut relay, &store, &mut sink);
    assert!(engine.power() > 0.0);

    engine.dispatch(faulted(2000), &mut relay, &store, &mut sink);
    assert_eq!(engine.power(), 0.0);

    engine.dispatch(clean(3000, 26.0), &mut relay, &store, &mut sink);
    assert!(engine.power() > 0.0);
}

// ── Tuning store degradation ──────────────────────────────────

#[test]
fn absent_tuning_store_runs_with_zero_gains() {
    let store = MockStore::Absent;
    let config = SystemConfig {
        tuning_mode: true,
        ..SystemConfig::default()
    };
    let (mut engine, mut relay, mut sink) = started_engine(config, &store);
    step_setpoint(
        &mut engine,
        &mut relay,
        &store,
        &mut sink,
        &[SetpointStep::Up100],
    );

    engine.dispatch(clean(1000, 20.0), &mut relay, &store, &mut sink);
    assert_eq!(engine.power(), 0.0, "zero gains demand zero power");
    assert!(engine.is_running(), "absence must not be fatal");
    assert!(sink
        .events
        .iter()
        .any(|e| matches!(e, EngineEvent::Iteration(s) if s.power_pct == 0.0)));
}

#[test]
fn malformed_tuning_store_keeps_previous_gains() {
    let good = MockStore::Fixed(Tunings {
        p: 2.0,
        ..Tunings::default()
    });
    let config = SystemConfig {
        tuning_mode: true,
        ..SystemConfig::default()
    };
    let (mut engine, mut relay, mut sink) = started_engine(config, &good);
    step_setpoint(
        &mut engine,
        &mut relay,
        &good,
        &mut sink,
        &[SetpointStep::Up10, SetpointStep::Up10, SetpointStep::Up10],
    );

    // The store breaks mid-session; the gains loaded at start survive.
    let broken = MockStore::Broken;
    for i in 1..=5 {
        engine.dispatch(clean(i * 1000, 26.0), &mut relay, &broken, &mut sink);
    }
    assert!((engine.power() - 8.0).abs() < 1e-9);
}

#[test]
fn pushed_tunings_take_effect_next_iteration() {
    let store = MockStore::Absent;
    let (mut engine, mut relay, mut sink) = started_engine(SystemConfig::default(), &store);
    step_setpoint(
        &mut engine,
        &mut relay,
        &store,
        &mut sink,
        &[SetpointStep::Up10, SetpointStep::Up10, SetpointStep::Up10],
    );

    engine.dispatch(
        Event::TuningsReloaded(Tunings {
            p: 2.0,
            ..Tunings::default()
        }),
        &mut relay,
        &store,
        &mut sink,
    );
    for i in 1..=5 {
        engine.dispatch(clean(i * 1000, 26.0), &mut relay, &store, &mut sink);
    }
    assert!((engine.power() - 8.0).abs() < 1e-9);
}

// ── Actuator fault retry ──────────────────────────────────────

#[test]
fn failed_kick_is_retried_on_next_iteration() {
    let store = MockStore::Fixed(Tunings {
        p: 2.0,
        ..Tunings::default()
    });
    let (mut engine, mut relay, mut sink) = started_engine(SystemConfig::default(), &store);
    step_setpoint(
        &mut engine,
        &mut relay,
        &store,
        &mut sink,
        &[SetpointStep::Up10, SetpointStep::Up10, SetpointStep::Up10],
    );

    // Both kick commands (forced-off + zero flop) fail.
    relay.fail_next = 2;
    engine.dispatch(clean(1000, 26.0), &mut relay, &store, &mut sink);
    assert!(relay.monoflops().is_empty());

    // Next iteration re-kicks the cycle instead of assuming it is alive.
    engine.dispatch(clean(2000, 26.0), &mut relay, &store, &mut sink);
    assert_eq!(
        relay.monoflops(),
        [RelayCall::Monoflop {
            on: false,
            duration_ms: 0
        }]
    );
}

// ── Unregulated mode ──────────────────────────────────────────

#[test]
fn unregulated_session_is_operator_driven() {
    let store = MockStore::Absent;
    let config = SystemConfig {
        regulated: false,
        smoothing_window: 1,
        fault_grace_ms: None,
        ..SystemConfig::default()
    };
    let (mut engine, mut relay, mut sink) = started_engine(config, &store);

    engine.dispatch(Event::PowerChanged(PowerStep::Up10), &mut relay, &store, &mut sink);
    assert_eq!(engine.power(), 10.0);
    // Stepping out of FULL_OFF kicked the flop loop.
    assert_eq!(
        relay.monoflops(),
        [RelayCall::Monoflop {
            on: false,
            duration_ms: 0
        }]
    );

    engine.dispatch(Event::FlopCompleted, &mut relay, &store, &mut sink);
    assert_eq!(
        relay.last_call(),
        Some(&RelayCall::Monoflop {
            on: true,
            duration_ms: 100
        })
    );

    // Samples update telemetry but never the power.
    engine.dispatch(clean(1000, 400.0), &mut relay, &store, &mut sink);
    assert_eq!(engine.power(), 10.0);

    // Stepping back to zero parks the relay OFF.
    engine.dispatch(Event::PowerChanged(PowerStep::Down10), &mut relay, &store, &mut sink);
    assert_eq!(engine.power(), 0.0);
    assert_eq!(relay.last_call(), Some(&RelayCall::SetState(false)));
}

// ── Shutdown ──────────────────────────────────────────────────

#[test]
fn shutdown_releases_relay_before_stopping() {
    let store = MockStore::Fixed(Tunings {
        p: 100.0,
        ..Tunings::default()
    });
    let (mut engine, mut relay, mut sink) = started_engine(SystemConfig::default(), &store);
    step_setpoint(
        &mut engine,
        &mut relay,
        &store,
        &mut sink,
        &[SetpointStep::Up100],
    );
    engine.dispatch(clean(1000, 20.0), &mut relay, &store, &mut sink);
    assert!(engine.relay_active());

    engine.dispatch(Event::Shutdown, &mut relay, &store, &mut sink);
    assert!(!engine.is_running());
    assert_eq!(relay.last_call(), Some(&RelayCall::SetState(false)));
    assert!(sink.events.iter().any(|e| matches!(e, EngineEvent::Stopped)));
}
