//! Mode catalog value objects

use crate::core::error::DomainError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A mode key known to be present in the catalog it was resolved from.
///
/// Only [`ModeCatalog::resolve`] creates these, so holding a `ModeKey` means
/// validation already happened.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ModeKey(String);

impl ModeKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A catalog lookup result: the validated key and its backend model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMode {
    pub key: ModeKey,
    pub model_identifier: String,
}

/// Immutable mapping from human-readable mode keys to backend model
/// identifiers, loaded from configuration before any turn is sent.
///
/// # Examples
///
/// ```
/// use streamchat_domain::ModeCatalog;
///
/// let catalog = ModeCatalog::new(
///     [("default", "gpt-4o"), ("fast", "gpt-4o-mini")],
///     "default",
/// )
/// .unwrap();
///
/// let fast = catalog.resolve("fast").unwrap();
/// assert_eq!(fast.model_identifier, "gpt-4o-mini");
/// assert!(catalog.resolve("turbo").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeCatalog {
    entries: BTreeMap<String, String>,
    default_mode: String,
}

impl ModeCatalog {
    /// Build a catalog, rejecting blank keys, blank model identifiers, an
    /// empty mapping, or a default mode that is not in the mapping.
    pub fn new<K, V>(
        entries: impl IntoIterator<Item = (K, V)>,
        default_mode: impl Into<String>,
    ) -> Result<Self, DomainError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (key, model) in entries {
            let key = key.into();
            let model = model.into();
            if key.trim().is_empty() {
                return Err(DomainError::InvalidCatalog(
                    "mode key cannot be empty".to_string(),
                ));
            }
            if model.trim().is_empty() {
                return Err(DomainError::InvalidCatalog(format!(
                    "mode '{}' has an empty model identifier",
                    key
                )));
            }
            map.insert(key, model);
        }

        if map.is_empty() {
            return Err(DomainError::InvalidCatalog(
                "at least one mode must be configured".to_string(),
            ));
        }

        let default_mode = default_mode.into();
        if !map.contains_key(&default_mode) {
            return Err(DomainError::InvalidCatalog(format!(
                "default mode '{}' is not defined",
                default_mode
            )));
        }

        Ok(Self {
            entries: map,
            default_mode,
        })
    }

    /// Look up a mode key. Unknown keys fail with [`DomainError::UnknownMode`].
    pub fn resolve(&self, key: &str) -> Result<ResolvedMode, DomainError> {
        self.entries
            .get_key_value(key)
            .map(|(k, model)| ResolvedMode {
                key: ModeKey(k.clone()),
                model_identifier: model.clone(),
            })
            .ok_or_else(|| DomainError::UnknownMode(key.to_string()))
    }

    /// The configured default mode.
    pub fn default_mode(&self) -> ResolvedMode {
        ResolvedMode {
            key: ModeKey(self.default_mode.clone()),
            model_identifier: self.entries[&self.default_mode].clone(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Mode keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// `(key, model identifier)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
