//! Application layer for llm-council
//!
//! This crate contains use cases, shared services, port definitions and
//! application configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod services;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::PipelineSettings;
pub use ports::{
    events::EventPublisher,
    model_backend::{BackendError, ModelBackend},
};
pub use services::{
    cache::ResultCache,
    circuit_breaker::CircuitBreakerBank,
    registry::{ModelRegistry, RegistryError},
};
pub use use_cases::execute_stage::{StageCall, StageExecutor, StageLimits};
pub use use_cases::run_pipeline::{PipelineError, RunPipelineUseCase};
