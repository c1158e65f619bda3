//! The application core: operator commands in, engine events out, port
//! traits at the boundary, and the [`service::ControlEngine`] orchestrating
//! smoother, PID, and PWM actuator per incoming event.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
