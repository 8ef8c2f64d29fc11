//! Cached entry: a value plus its retention metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::policy::{Policy, Priority, Sensitivity};
use crate::Timestamp;

/// A cached value together with the metadata both tiers need to manage it.
///
/// Entries cross tier boundaries by value; no entry is shared by reference
/// between the fast and durable tiers. The serialized form round-trips all
/// five fields exactly, including the three priority and three sensitivity
/// values.
///
/// Invariant: `expires_at > created_at`. An entry with `expires_at <= now`
/// is expired and must never be returned to a caller, regardless of which
/// tier holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry<T> {
    /// Opaque payload, owned by the entry.
    pub data: T,
    /// Creation instant.
    pub created_at: Timestamp,
    /// Absolute expiration instant: `created_at + freshness_window`.
    pub expires_at: Timestamp,
    /// Retention weight under capacity pressure.
    pub priority: Priority,
    /// Domain-importance classification.
    pub sensitivity: Sensitivity,
}

impl<T> Entry<T> {
    /// Build an entry from a resolved policy, stamped at `Utc::now()`.
    pub fn new(data: T, policy: &Policy) -> Self {
        Self::with_created_at(data, policy, Utc::now())
    }

    /// Build an entry with an explicit creation instant.
    ///
    /// Zero windows are rejected at registry load; the clamp below guards
    /// pathological per-call overrides so the expiry invariant still holds.
    pub fn with_created_at(data: T, policy: &Policy, created_at: Timestamp) -> Self {
        let window = policy.freshness_window.max(Duration::from_millis(1));
        let ttl = chrono::Duration::from_std(window).unwrap_or(chrono::TimeDelta::MAX);
        let expires_at = created_at
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            data,
            created_at,
            expires_at,
            priority: policy.priority,
            sensitivity: policy.sensitivity,
        }
    }

    /// Check whether this entry is expired as of the given instant.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at <= now
    }

    /// Remaining freshness as of the given instant, zero if expired.
    pub fn remaining(&self, now: Timestamp) -> Duration {
        if now >= self.expires_at {
            Duration::ZERO
        } else {
            (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
        }
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn priority_strategy() -> impl Strategy<Value = Priority> {
        prop_oneof![
            Just(Priority::Low),
            Just(Priority::Normal),
            Just(Priority::High),
        ]
    }

    fn sensitivity_strategy() -> impl Strategy<Value = Sensitivity> {
        prop_oneof![
            Just(Sensitivity::NonCritical),
            Just(Sensitivity::Normal),
            Just(Sensitivity::Critical),
        ]
    }

    proptest! {
        /// Property: the serialized record preserves all five fields exactly
        /// for every priority and sensitivity combination.
        #[test]
        fn prop_serde_roundtrip(
            data in ".*",
            window_ms in 1u64..=86_400_000,
            priority in priority_strategy(),
            sensitivity in sensitivity_strategy(),
        ) {
            let policy = Policy::new(Duration::from_millis(window_ms), priority, sensitivity);
            let entry = Entry::new(data, &policy);

            let bytes = serde_json::to_vec(&entry).expect("serialize should succeed");
            let decoded: Entry<String> =
                serde_json::from_slice(&bytes).expect("deserialize should succeed");

            prop_assert_eq!(decoded, entry);
        }

        /// Property: entries are always created unexpired.
        #[test]
        fn prop_new_entry_is_fresh(
            window_ms in 1u64..=86_400_000,
            priority in priority_strategy(),
            sensitivity in sensitivity_strategy(),
        ) {
            let policy = Policy::new(Duration::from_millis(window_ms), priority, sensitivity);
            let entry = Entry::new(0u8, &policy);

            prop_assert!(entry.expires_at > entry.created_at);
            prop_assert!(!entry.is_expired(entry.created_at));
        }
    }
}
