use council_application::BackendError;
use thiserror::Error;

/// Errors turning a loaded configuration into live adapters
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to set up provider '{provider}': {source}")]
    Provider {
        provider: String,
        #[source]
        source: BackendError,
    },
}
