//! Kilnctl — simulated-rig entry point.
//!
//! Wires the control engine to the simulated relay and thermal plant and
//! runs a scripted session: ramp the setpoint, regulate, ride through an
//! injected sensor fault, cool down, shut down. The hardware transport
//! binds to the same ports in the real installation.

use anyhow::Result;
use log::info;

use kilnctl::adapters::data_log::CsvDataLogger;
use kilnctl::adapters::display::LogDisplay;
use kilnctl::adapters::tuning_file::JsonTuningStore;
use kilnctl::app::commands::SetpointStep;
use kilnctl::app::ports::TuningStore;
use kilnctl::app::service::ControlEngine;
use kilnctl::config::SystemConfig;
use kilnctl::control::pid::Tunings;
use kilnctl::events::{Event, EventQueue, FaultFlags, Sample};
use kilnctl::sim::{SimRelay, ThermalModel};

/// Simulation step (one rig clock tick).
const STEP_MS: u64 = 10;
/// Scripted session length.
const END_MS: u64 = 600_000;
/// Injected sensor fault window — long enough to trip the grace period.
const FAULT_WINDOW_MS: std::ops::Range<u64> = 300_000..320_000;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = SystemConfig::default();
    let store = JsonTuningStore::new(config.tuning_path.clone());
    let data_log = config
        .logging_mode
        .then(|| CsvDataLogger::create(&config.data_log_path));
    let mut sink = (LogDisplay::new(), data_log);

    let mut engine = ControlEngine::new(config.clone());
    let mut relay = SimRelay::new();
    let mut queue = EventQueue::new();
    let mut plant = ThermalModel::new(config.seed_temp_c);

    engine.start(&mut relay, &store, &mut sink);

    // With no tuning document on disk the engine runs with fail-safe zero
    // gains; push a workable set so the simulated rig actually regulates.
    if matches!(store.load(), Ok(None)) {
        queue.push(Event::TuningsReloaded(Tunings {
            p: 2.0,
            i: 0.05,
            d: 20.0,
            ..Tunings::default()
        }));
    }

    let sensor_period = u64::from(config.sensor_period_ms);
    let mut now_ms: u64 = 0;

    while engine.is_running() {
        // Scripted operator input.
        if now_ms == 0 {
            queue.push(Event::SetpointChanged(SetpointStep::Up100));
            queue.push(Event::SetpointChanged(SetpointStep::Up10));
            queue.push(Event::SetpointChanged(SetpointStep::Up10));
        } else if now_ms == 580_000 {
            queue.push(Event::SetpointChanged(SetpointStep::Down100));
        } else if now_ms == END_MS {
            queue.push(Event::Shutdown);
        }

        // Rig clocks: monoflop deadline and the periodic thermocouple.
        if relay.advance_to(now_ms) {
            queue.push(Event::FlopCompleted);
        }
        if now_ms > 0 && now_ms % sensor_period == 0 {
            let faulted = FAULT_WINDOW_MS.contains(&now_ms);
            queue.push(Event::SampleArrived(Sample {
                timestamp_ms: now_ms,
                temp_centi: if faulted { 0 } else { plant.temp_centi() },
                faults: FaultFlags {
                    open_circuit: faulted,
                    ..FaultFlags::default()
                },
            }));
        }

        queue.drain(|event| engine.dispatch(event, &mut relay, &store, &mut sink));

        plant.step(relay.is_on(), STEP_MS as f64 / 1000.0);
        now_ms += STEP_MS;
    }

    info!(
        "session complete: {} control iterations, final plant temp {:.1} degC",
        engine.iterations(),
        plant.temp_c(),
    );
    Ok(())
}
