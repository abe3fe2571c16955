//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into domain and
//! application types by the accessors on [`FileConfig`].

mod logging;
mod modes;
mod provider;
mod repl;
mod stream;

pub use logging::FileLoggingConfig;
pub use provider::FileProviderConfig;
pub use repl::FileReplConfig;
pub use stream::FileStreamConfig;

use crate::http::HttpGatewayConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use streamchat_application::StreamSettings;
use streamchat_domain::{ConfigIssue, ConfigIssueCode, DomainError, ModeCatalog};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Mode used when none is selected on the command line
    pub default_mode: String,
    /// Mode key → backend model identifier
    pub modes: BTreeMap<String, String>,
    /// Inference endpoint settings
    pub provider: FileProviderConfig,
    /// Streaming settings
    pub stream: FileStreamConfig,
    /// REPL settings
    pub repl: FileReplConfig,
    /// Conversation log settings
    pub logging: FileLoggingConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            default_mode: modes::default_mode_key(),
            modes: modes::default_modes(),
            provider: FileProviderConfig::default(),
            stream: FileStreamConfig::default(),
            repl: FileReplConfig::default(),
            logging: FileLoggingConfig::default(),
        }
    }
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = modes::validate_modes(&self.modes, &self.default_mode);

        if self.stream.inactivity_timeout_secs == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroTimeout,
                "stream.inactivity_timeout_secs cannot be 0",
            ));
        }

        let base_url = self.provider.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidBaseUrl,
                format!(
                    "provider.base_url: '{}' must start with http:// or https://",
                    self.provider.base_url
                ),
            ));
        }

        if self.provider.resolve_api_key().is_none() {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::MissingApiKey,
                format!(
                    "no API key: set provider.api_key or the {} environment variable",
                    self.provider.api_key_env
                ),
            ));
        }

        issues
    }

    /// Build the mode catalog from `[modes]` and `default_mode`.
    pub fn mode_catalog(&self) -> Result<ModeCatalog, DomainError> {
        modes::build_catalog(&self.modes, &self.default_mode)
    }

    pub fn stream_settings(&self) -> StreamSettings {
        StreamSettings::default()
            .with_inactivity_timeout(Duration::from_secs(self.stream.inactivity_timeout_secs))
    }

    pub fn gateway_config(&self) -> HttpGatewayConfig {
        HttpGatewayConfig {
            base_url: self.provider.base_url.clone(),
            path: self.provider.path.clone(),
            api_key: self.provider.resolve_api_key(),
            connect_timeout: Duration::from_secs(self.provider.connect_timeout_secs),
        }
    }
}
