//! Resilience domain: per-model circuit breaking
//!
//! The state machine is pure: callers pass the current instant, which keeps
//! it deterministic under test and independent of any runtime clock.

pub mod circuit;

pub use circuit::{BreakerPolicy, BreakerState, CircuitState};
