//! Structured configuration issues.
//!
//! The infrastructure loader turns a merged configuration into a list of
//! [`ConfigIssue`]s. `Error` issues abort startup, `Warning` issues are
//! printed and ignored.

use std::fmt;

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// `[modes]` has no entries.
    EmptyCatalog,
    /// A mode key is blank.
    EmptyModeKey,
    /// A mode maps to a blank model identifier.
    EmptyModelIdentifier,
    /// `default_mode` is not a key in `[modes]`.
    UnknownDefaultMode,
    /// `stream.inactivity_timeout_secs` is zero.
    ZeroTimeout,
    /// `provider.base_url` is not an http(s) URL.
    InvalidBaseUrl,
    /// Neither `provider.api_key` nor the variable named by
    /// `provider.api_key_env` is set.
    MissingApiKey,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}", label, self.message)
    }
}
