//! Append-only CSV data log, one record per control iteration.
//!
//! Column set matches what the tuning workflow expects to plot:
//! timestamp, temperature, setpoint, power, the three gains, and the PID
//! term breakdown. Write failures are logged and dropped — the data log
//! must never block or fail the control path.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::Local;
use log::warn;

use crate::app::events::EngineEvent;
use crate::app::ports::EventSink;

const HEADER: &str =
    "Timestamp, Temp (degC), Setpoint (degC), Power (%), Kp, Ki, Kd, Cp, Ci, Cd";
const TIMESTAMP_FMT: &str = "%d/%m/%Y %H:%M:%S";

/// CSV-appending [`EventSink`].
pub struct CsvDataLogger {
    /// `None` after an unrecoverable open failure — the logger degrades to
    /// a no-op rather than taking the controller down.
    file: Option<File>,
}

impl CsvDataLogger {
    /// Open (or create) the log file and write the header.
    pub fn create(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut f| {
                writeln!(f, "{HEADER}")?;
                Ok(f)
            });

        match file {
            Ok(f) => Self { file: Some(f) },
            Err(e) => {
                warn!("data log '{}' unavailable ({e}); logging disabled", path.display());
                Self { file: None }
            }
        }
    }

    fn append(&mut self, line: &str) {
        if let Some(f) = self.file.as_mut() {
            if let Err(e) = writeln!(f, "{line}") {
                warn!("data log write failed ({e}); record dropped");
            }
        }
    }
}

impl EventSink for CsvDataLogger {
    fn emit(&mut self, event: &EngineEvent) {
        let EngineEvent::Iteration(s) = event else {
            return;
        };
        let timestamp = Local::now().format(TIMESTAMP_FMT);
        let line = format!(
            "{}, {}, {}, {}, {}, {}, {}, {}, {}, {}",
            timestamp,
            s.temp_c,
            s.setpoint_c,
            s.power_pct,
            s.tunings.p,
            s.tunings.i,
            s.tunings.d,
            s.components.proportional,
            s.components.integral,
            s.components.derivative,
        );
        self.append(&line);
    }
}
