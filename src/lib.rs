//! Kilnctl controller library.
//!
//! Closed-loop temperature control for a resistive heating element behind
//! an on/off relay: sample smoothing with fault gating, PID with
//! hot-reloadable tunings, and software PWM built on the relay's monoflop
//! primitive. Everything I/O-shaped sits behind port traits, so the whole
//! control path runs against mocks in tests and against the simulated rig
//! in the binary.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control;
pub mod events;
pub mod sim;

mod error;

pub use error::{ActuatorError, ConfigError, Error, Result, SensorFault};

pub mod adapters;
