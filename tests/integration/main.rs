//! Integration tests for the event → engine → relay pipeline.
//!
//! These run against the recording mock relay and verify the full dispatch
//! chain from an inbound event down to the relay command stream, without
//! any real transport.

mod engine_tests;
mod mock_relay;
