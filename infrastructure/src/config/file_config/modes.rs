//! Mode catalog configuration from TOML (`default_mode` + `[modes]` table)

use std::collections::BTreeMap;
use streamchat_domain::{ConfigIssue, ConfigIssueCode, DomainError, ModeCatalog};

/// Built-in mode table used when no file overrides it.
pub fn default_modes() -> BTreeMap<String, String> {
    [
        ("default", "gpt-4o"),
        ("fast", "gpt-4o-mini"),
        ("precise", "o3-mini"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

pub fn default_mode_key() -> String {
    "default".to_string()
}

/// Build the runtime catalog from the raw table.
pub fn build_catalog(
    modes: &BTreeMap<String, String>,
    default_mode: &str,
) -> Result<ModeCatalog, DomainError> {
    ModeCatalog::new(
        modes.iter().map(|(k, v)| (k.clone(), v.clone())),
        default_mode,
    )
}

/// Report every problem in the table, not just the first one.
pub fn validate_modes(modes: &BTreeMap<String, String>, default_mode: &str) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();

    if modes.is_empty() {
        issues.push(ConfigIssue::error(
            ConfigIssueCode::EmptyCatalog,
            "[modes] must define at least one mode",
        ));
        return issues;
    }

    for (key, model) in modes {
        if key.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::EmptyModeKey,
                "modes: mode key cannot be empty",
            ));
        }
        if model.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::EmptyModelIdentifier,
                format!("modes.{}: model identifier cannot be empty", key),
            ));
        }
    }

    if !modes.contains_key(default_mode) {
        issues.push(ConfigIssue::error(
            ConfigIssueCode::UnknownDefaultMode,
            format!(
                "default_mode: '{}' is not defined in [modes] (available: {})",
                default_mode,
                modes.keys().cloned().collect::<Vec<_>>().join(", ")
            ),
        ));
    }

    issues
}
