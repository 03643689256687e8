//! Infrastructure layer for llm-council
//!
//! This crate contains the adapters behind the application's ports:
//! HTTP provider clients with a routing backend, the in-process event
//! hub, and configuration file loading.

pub mod config;
pub mod events;
pub mod providers;

// Re-export commonly used types
pub use config::{ConfigError, ConfigIssue, ConfigLoader, FileConfig, Severity};
pub use events::{EventHub, EventStream};
pub use providers::{
    AnthropicAdapter, OpenAiCompatibleAdapter, ProviderAdapter, RoutingBackend, build_backend,
};
