//! Application-level configuration.
//!
//! - [`PipelineSettings`]: timeouts, selection size, request defaults,
//!   cache and aggregation tunables of the orchestrator

pub mod pipeline_settings;

pub use pipeline_settings::PipelineSettings;
