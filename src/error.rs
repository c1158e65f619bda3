//! Unified error types for the heater controller.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! dispatch loop's error handling uniform. All variants are `Copy` so they
//! can be cheaply carried through events without allocation.
//!
//! Sensor fault *conditions* (over/under-voltage, open circuit) are not
//! errors — they are a first-class control state handled by the smoother.
//! `SensorFault` exists so adapters can report them in a typed way.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor reported a fault condition.
    Sensor(SensorFault),
    /// A relay command failed.
    Actuator(ActuatorError),
    /// The tuning store is unreadable or malformed.
    Config(ConfigError),
    /// The link to a collaborator failed (retried with backoff, never fatal).
    Transport(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Transport(msg) => write!(f, "transport: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor fault conditions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorFault {
    /// Thermocouple input voltage out of range.
    OverUnderVoltage,
    /// Thermocouple circuit is open (broken or disconnected probe).
    OpenCircuit,
}

impl fmt::Display for SensorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OverUnderVoltage => write!(f, "over/under voltage"),
            Self::OpenCircuit => write!(f, "open circuit"),
        }
    }
}

impl From<SensorFault> for Error {
    fn from(e: SensorFault) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// An immediate relay state write failed.
    SetStateFailed,
    /// Scheduling a timed relay state (monoflop) failed.
    MonoflopFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetStateFailed => write!(f, "relay state write failed"),
            Self::MonoflopFailed => write!(f, "monoflop schedule failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The tuning document exists but could not be read.
    Unreadable,
    /// The tuning document exists but is not valid JSON.
    Malformed,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable => write!(f, "tuning document unreadable"),
            Self::Malformed => write!(f, "tuning document malformed"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
