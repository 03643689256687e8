//! In-process event publication

pub mod hub;

pub use hub::{EventHub, EventStream};
