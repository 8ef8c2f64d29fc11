//! Retention policies for cached entries.
//!
//! A [`Policy`] declares how long a value stays fresh and how strongly the
//! cache should retain it under capacity pressure. Policies are defined once
//! at process start (see the registry in the engine crate) and may be
//! overridden per individual write with a [`PolicyOverride`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

// ============================================================================
// CLASSIFICATION ENUMS
// ============================================================================

/// Retention weight used during eviction, independent of expiration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Normal,
    High,
}

/// Domain-importance classification of a cached value.
///
/// Used both for retention weighting and for selecting warmup candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sensitivity {
    NonCritical,
    Normal,
    Critical,
}

impl Priority {
    /// Scalar rank used by the eviction score: Low=0, Normal=1, High=2.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Low => 0,
            Priority::Normal => 1,
            Priority::High => 2,
        }
    }
}

impl Sensitivity {
    /// Scalar rank used by the eviction score: NonCritical=0, Normal=1, Critical=2.
    pub fn rank(&self) -> u8 {
        match self {
            Sensitivity::NonCritical => 0,
            Sensitivity::Normal => 1,
            Sensitivity::Critical => 2,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Priority::Low => "Low",
            Priority::Normal => "Normal",
            Priority::High => "High",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for Priority {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(Priority::Low),
            "Normal" => Ok(Priority::Normal),
            "High" => Ok(Priority::High),
            _ => Err(ConfigError::UnknownPriority {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Sensitivity::NonCritical => "NonCritical",
            Sensitivity::Normal => "Normal",
            Sensitivity::Critical => "Critical",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for Sensitivity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NonCritical" => Ok(Sensitivity::NonCritical),
            "Normal" => Ok(Sensitivity::Normal),
            "Critical" => Ok(Sensitivity::Critical),
            _ => Err(ConfigError::UnknownSensitivity {
                value: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// POLICY
// ============================================================================

/// Per-key retention policy: freshness window plus classification.
///
/// Immutable once loaded into the registry. The window must be positive;
/// registry loading rejects zero windows with
/// [`ConfigError::InvalidFreshnessWindow`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Duration after creation during which an entry is considered valid.
    pub freshness_window: Duration,
    /// Retention weight under capacity pressure.
    pub priority: Priority,
    /// Domain-importance classification.
    pub sensitivity: Sensitivity,
}

impl Policy {
    /// Create a new policy.
    pub fn new(freshness_window: Duration, priority: Priority, sensitivity: Sensitivity) -> Self {
        Self {
            freshness_window,
            priority,
            sensitivity,
        }
    }
}

/// Per-write override of a registry policy.
///
/// Only the populated fields replace the base policy; a fully populated
/// override can stand alone for keys with no registry entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyOverride {
    pub freshness_window: Option<Duration>,
    pub priority: Option<Priority>,
    pub sensitivity: Option<Sensitivity>,
}

impl PolicyOverride {
    /// Create an empty override.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the freshness window.
    pub fn with_window(mut self, window: Duration) -> Self {
        self.freshness_window = Some(window);
        self
    }

    /// Override the priority class.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Override the sensitivity class.
    pub fn with_sensitivity(mut self, sensitivity: Sensitivity) -> Self {
        self.sensitivity = Some(sensitivity);
        self
    }

    /// Apply this override on top of a base policy.
    pub fn apply(&self, base: &Policy) -> Policy {
        Policy {
            freshness_window: self.freshness_window.unwrap_or(base.freshness_window),
            priority: self.priority.unwrap_or(base.priority),
            sensitivity: self.sensitivity.unwrap_or(base.sensitivity),
        }
    }

    /// Convert into a standalone policy, if all three fields are populated.
    ///
    /// Returns `None` for partial overrides, which are only meaningful on
    /// top of a registry entry.
    pub fn into_policy(self) -> Option<Policy> {
        Some(Policy {
            freshness_window: self.freshness_window?,
            priority: self.priority?,
            sensitivity: self.sensitivity?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ranks() {
        assert_eq!(Priority::Low.rank(), 0);
        assert_eq!(Priority::Normal.rank(), 1);
        assert_eq!(Priority::High.rank(), 2);
    }

    #[test]
    fn test_sensitivity_ranks() {
        assert_eq!(Sensitivity::NonCritical.rank(), 0);
        assert_eq!(Sensitivity::Normal.rank(), 1);
        assert_eq!(Sensitivity::Critical.rank(), 2);
    }

    #[test]
    fn test_priority_parse_roundtrip() {
        for priority in [Priority::Low, Priority::Normal, Priority::High] {
            let parsed: Priority = priority.to_string().parse().expect("parse should succeed");
            assert_eq!(parsed, priority);
        }
    }

    #[test]
    fn test_sensitivity_parse_roundtrip() {
        for sensitivity in [
            Sensitivity::NonCritical,
            Sensitivity::Normal,
            Sensitivity::Critical,
        ] {
            let parsed: Sensitivity = sensitivity
                .to_string()
                .parse()
                .expect("parse should succeed");
            assert_eq!(parsed, sensitivity);
        }
    }

    #[test]
    fn test_unknown_priority_is_config_error() {
        let err = "Urgent".parse::<Priority>().expect_err("parse should fail");
        assert_eq!(
            err,
            ConfigError::UnknownPriority {
                value: "Urgent".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_sensitivity_is_config_error() {
        let err = "Secret"
            .parse::<Sensitivity>()
            .expect_err("parse should fail");
        assert_eq!(
            err,
            ConfigError::UnknownSensitivity {
                value: "Secret".to_string()
            }
        );
    }

    #[test]
    fn test_case_sensitive_parse() {
        // Only the exact configuration spellings are valid.
        assert!("low".parse::<Priority>().is_err());
        assert!("noncritical".parse::<Sensitivity>().is_err());
    }

    #[test]
    fn test_override_apply_partial() {
        let base = Policy::new(
            Duration::from_secs(60),
            Priority::Normal,
            Sensitivity::Normal,
        );
        let resolved = PolicyOverride::new()
            .with_priority(Priority::High)
            .apply(&base);

        assert_eq!(resolved.freshness_window, Duration::from_secs(60));
        assert_eq!(resolved.priority, Priority::High);
        assert_eq!(resolved.sensitivity, Sensitivity::Normal);
    }

    #[test]
    fn test_override_into_policy_requires_all_fields() {
        let partial = PolicyOverride::new().with_priority(Priority::Low);
        assert!(partial.into_policy().is_none());

        let full = PolicyOverride::new()
            .with_window(Duration::from_millis(500))
            .with_priority(Priority::Low)
            .with_sensitivity(Sensitivity::NonCritical);
        let policy = full.into_policy().expect("full override should convert");
        assert_eq!(policy.freshness_window, Duration::from_millis(500));
    }
}
