//! Process-wide services shared by every run
//!
//! Each guards its own state with fine-grained `std::sync` locks that are
//! never held across an `.await`.

pub mod cache;
pub mod circuit_breaker;
pub mod registry;
