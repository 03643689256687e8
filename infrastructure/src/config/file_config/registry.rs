//! Registry configuration from TOML (`[registry]` section)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRegistryConfig {
    /// Probe every model once before the first run
    pub probe_on_start: bool,
    /// Seconds between background health probes; 0 disables them
    pub refresh_interval_secs: u64,
}

impl Default for FileRegistryConfig {
    fn default() -> Self {
        Self {
            probe_on_start: true,
            refresh_interval_secs: 300,
        }
    }
}
