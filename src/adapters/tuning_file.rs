//! JSON tuning-file store.
//!
//! The tuning document is a small JSON object,
//! `{"p": .., "i": .., "d": .., "bias": .., "proportional_on_measurement": ..}`,
//! every key optional. It lives next to the process so an operator can edit
//! gains live while the engine runs in tuning mode. Absence is not an
//! error — a fresh install simply has no tunings yet.

use std::path::PathBuf;

use crate::app::ports::TuningStore;
use crate::control::pid::Tunings;
use crate::error::ConfigError;

pub struct JsonTuningStore {
    path: PathBuf,
}

impl JsonTuningStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TuningStore for JsonTuningStore {
    fn load(&self) -> Result<Option<Tunings>, ConfigError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&self.path).map_err(|_| ConfigError::Unreadable)?;
        let tunings = serde_json::from_str(&data).map_err(|_| ConfigError::Malformed)?;
        Ok(Some(tunings))
    }
}
