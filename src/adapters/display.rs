//! Log-backed display sink.
//!
//! The physical panel (tabs, buttons, trend graph) is a separate
//! collaborator outside this crate; this adapter renders the same
//! information as structured log lines so an engine without a panel is
//! still observable. A future panel adapter implements the same trait.

use log::info;

use crate::app::events::EngineEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`EngineEvent`] to the console.
pub struct LogDisplay;

impl LogDisplay {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogDisplay {
    fn emit(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::Iteration(s) => {
                if s.deactivated {
                    info!(
                        "PANEL | T: ERR! | S: {:.0}degC | Power: {:5.1}%",
                        s.setpoint_c, s.power_pct,
                    );
                } else {
                    info!(
                        "PANEL | T: {:6.2}degC (avg {:6.2}) | S: {:.0}degC | Power: {:5.1}%",
                        s.temp_c, s.smoothed_c, s.setpoint_c, s.power_pct,
                    );
                }
            }
            EngineEvent::Started { regulated } => {
                info!(
                    "START | mode={}",
                    if *regulated { "regulated" } else { "unregulated" }
                );
            }
            EngineEvent::Deactivated => info!("FAULT | output deactivated"),
            EngineEvent::Recovered => info!("FAULT | cleared, control resumed"),
            EngineEvent::SetpointChanged { setpoint_c } => {
                info!("INPUT | setpoint -> {setpoint_c:.0}degC");
            }
            EngineEvent::PowerChanged { power_pct } => {
                info!("INPUT | manual power -> {power_pct:.0}%");
            }
            EngineEvent::Stopped => info!("STOP  | relay released OFF"),
        }
    }
}
