//! Stream configuration from TOML (`[stream]` section)

use serde::{Deserialize, Serialize};
use streamchat_application::config::stream_settings::DEFAULT_INACTIVITY_TIMEOUT_SECS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStreamConfig {
    /// Seconds to wait for the stream to open and between events.
    pub inactivity_timeout_secs: u64,
}

impl Default for FileStreamConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout_secs: DEFAULT_INACTIVITY_TIMEOUT_SECS,
        }
    }
}
