//! Policy registry: static mapping from logical key name to retention policy.
//!
//! Loaded once at process start and read-only afterwards, so it has no
//! concurrency concerns. Keys without a registry entry can still be written
//! when the caller supplies a complete per-write override.

use std::collections::HashMap;
use std::time::Duration;

use stratum_core::{ConfigError, Policy};

/// Read-only name -> [`Policy`] table.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    policies: HashMap<String, Policy>,
}

impl PolicyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pre-built policy for a key name.
    pub fn with_policy(mut self, name: impl Into<String>, policy: Policy) -> Self {
        self.policies.insert(name.into(), policy);
        self
    }

    /// Build a registry from a configuration table of
    /// `(name, freshness_window, priority, sensitivity)` rows.
    ///
    /// Class names are parsed strictly: only `Low|Normal|High` and
    /// `NonCritical|Normal|Critical` are recognized; anything else, or a
    /// zero freshness window, is a configuration error at startup.
    pub fn from_table<'a, I>(rows: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, Duration, &'a str, &'a str)>,
    {
        let mut registry = Self::new();
        for (name, window, priority, sensitivity) in rows {
            if window.is_zero() {
                return Err(ConfigError::InvalidFreshnessWindow {
                    key: name.to_string(),
                });
            }
            let policy = Policy::new(window, priority.parse()?, sensitivity.parse()?);
            registry.policies.insert(name.to_string(), policy);
        }
        Ok(registry)
    }

    /// Look up the policy for a key name.
    pub fn lookup(&self, name: &str) -> Option<&Policy> {
        self.policies.get(name)
    }

    /// Number of registered policies.
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// True when no policies are registered.
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}
