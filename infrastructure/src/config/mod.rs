//! Configuration loading for llm-council
//!
//! Sources are merged in this order (later wins):
//!
//! 1. Built-in defaults
//! 2. Global: `$XDG_CONFIG_HOME/llm-council/config.toml`
//! 3. Project root: `./council.toml` or `./.council.toml`
//! 4. `--config <path>` specified file
//! 5. `COUNCIL_*` environment variables

mod error;
mod file_config;
mod loader;

pub use file_config::{
    ConfigIssue, ConfigIssueCode, FileAnthropicConfig, FileCacheConfig,
    FileCircuitBreakerConfig, FileCompatibleConfig, FileConfig, FileModelEntry, FileOpenAiConfig,
    FilePipelineConfig, FileProvidersConfig, FileRegistryConfig, Severity, parse_models,
};
pub use error::ConfigError;
pub use loader::ConfigLoader;
