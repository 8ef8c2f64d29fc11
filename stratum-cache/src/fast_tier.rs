//! Bounded in-memory fast tier.
//!
//! The fast tier is the sole owner of its entry copies; it never holds
//! references into the durable tier. Expiration is NOT checked here - the
//! facade and the sweeper decide what "expired" means for their paths.

use std::collections::HashMap;

use stratum_core::{Entry, Timestamp};

use crate::eviction;

/// A fast-tier resident: the entry plus its insertion sequence number,
/// used as the deterministic eviction tie-break.
#[derive(Debug, Clone)]
pub(crate) struct Resident<T> {
    pub(crate) entry: Entry<T>,
    pub(crate) seq: u64,
}

/// Capacity-bounded mapping from key to entry.
///
/// Not internally synchronized: the facade wraps it in a single RwLock,
/// which is the one shared mutable resource of the cache.
#[derive(Debug)]
pub struct FastTier<T> {
    map: HashMap<String, Resident<T>>,
    capacity: usize,
    next_seq: u64,
    evictions: u64,
}

impl<T> FastTier<T> {
    /// Create an empty tier with the given capacity bound.
    pub fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity + 1),
            capacity,
            next_seq: 0,
            evictions: 0,
        }
    }

    /// Pure lookup; no expiration check is performed here.
    pub fn get(&self, key: &str) -> Option<&Entry<T>> {
        self.map.get(key).map(|resident| &resident.entry)
    }

    /// Insert or overwrite an entry.
    ///
    /// If the resulting size exceeds capacity, a batch of the lowest-scoring
    /// residents is evicted before returning. The evicted keys are returned:
    /// eviction of *other* keys is an observable side effect of `insert`,
    /// not just accounting for the inserted one.
    pub fn insert(&mut self, key: String, entry: Entry<T>) -> Vec<String> {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.map.insert(key, Resident { entry, seq });

        if self.map.len() <= self.capacity {
            return Vec::new();
        }

        let victims = eviction::select_victims(&self.map, eviction::batch_size(self.capacity));
        for victim in &victims {
            self.map.remove(victim);
        }
        self.evictions += victims.len() as u64;
        victims
    }

    /// Remove and return the entry under `key`, if any.
    pub fn remove(&mut self, key: &str) -> Option<Entry<T>> {
        self.map.remove(key).map(|resident| resident.entry)
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Keys of every resident entry with `expires_at <= now`.
    pub fn expired_keys(&self, now: Timestamp) -> Vec<String> {
        self.map
            .iter()
            .filter(|(_, resident)| resident.entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when no entries are resident.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The configured capacity bound.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cumulative number of capacity evictions since construction.
    pub fn evictions(&self) -> u64 {
        self.evictions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;
    use stratum_core::{Policy, Priority, Sensitivity};

    fn policy(priority: Priority, sensitivity: Sensitivity) -> Policy {
        Policy::new(Duration::from_secs(60), priority, sensitivity)
    }

    fn normal_entry(data: u32) -> Entry<u32> {
        Entry::new(data, &policy(Priority::Normal, Sensitivity::Normal))
    }

    #[test]
    fn test_insert_get_remove() {
        let mut tier = FastTier::new(10);

        assert!(tier.insert("a".to_string(), normal_entry(1)).is_empty());
        assert_eq!(tier.get("a").map(|e| e.data), Some(1));
        assert_eq!(tier.len(), 1);

        assert_eq!(tier.remove("a").map(|e| e.data), Some(1));
        assert!(tier.get("a").is_none());
        assert!(tier.remove("a").is_none());
    }

    #[test]
    fn test_overwrite_does_not_grow() {
        let mut tier = FastTier::new(10);
        tier.insert("a".to_string(), normal_entry(1));
        tier.insert("a".to_string(), normal_entry(2));

        assert_eq!(tier.len(), 1);
        assert_eq!(tier.get("a").map(|e| e.data), Some(2));
    }

    #[test]
    fn test_overflow_evicts_batch_of_ten_at_capacity_fifty() {
        let mut tier = FastTier::new(50);

        for i in 0..50 {
            assert!(tier
                .insert(format!("key{}", i), normal_entry(i))
                .is_empty());
        }
        assert_eq!(tier.len(), 50);

        let evicted = tier.insert("overflow".to_string(), normal_entry(999));
        assert_eq!(evicted.len(), 10);
        assert_eq!(tier.len(), 41);
        assert_eq!(tier.evictions(), 10);
    }

    #[test]
    fn test_sixty_inserts_settle_at_fifty() {
        let mut tier = FastTier::new(50);

        for i in 0..60 {
            tier.insert(format!("key{}", i), normal_entry(i));
            assert!(tier.len() <= 50, "size exceeded capacity after insert");
        }

        assert_eq!(tier.len(), 50);
    }

    #[test]
    fn test_evicted_scores_bounded_by_retained_scores() {
        let mut tier = FastTier::new(50);

        let classes = [
            (Priority::Low, Sensitivity::NonCritical),
            (Priority::Normal, Sensitivity::Normal),
            (Priority::High, Sensitivity::Critical),
            (Priority::Low, Sensitivity::Critical),
            (Priority::High, Sensitivity::NonCritical),
        ];

        for i in 0..51u32 {
            let (priority, sensitivity) = classes[i as usize % classes.len()];
            tier.insert(
                format!("key{}", i),
                Entry::new(i, &policy(priority, sensitivity)),
            );
        }

        // The 51st insert triggered the eviction; verify the batch was the
        // lowest-scoring one.
        let mut evicted_scores = Vec::new();
        let mut retained_scores = Vec::new();
        for i in 0..51u32 {
            let (priority, sensitivity) = classes[i as usize % classes.len()];
            let score = crate::eviction::retention_score(priority, sensitivity);
            if tier.get(&format!("key{}", i)).is_some() {
                retained_scores.push(score);
            } else {
                evicted_scores.push(score);
            }
        }

        assert_eq!(evicted_scores.len(), 10);
        let max_evicted = evicted_scores.iter().max().expect("batch is non-empty");
        let min_retained = retained_scores.iter().min().expect("some are retained");
        assert!(max_evicted <= min_retained);
    }

    #[test]
    fn test_high_critical_survives_pressure() {
        let mut tier = FastTier::new(10);

        tier.insert(
            "protected".to_string(),
            Entry::new(0, &policy(Priority::High, Sensitivity::Critical)),
        );
        for i in 1..=30u32 {
            tier.insert(format!("filler{}", i), normal_entry(i));
        }

        assert!(tier.get("protected").is_some());
    }

    #[test]
    fn test_expired_keys() {
        let mut tier = FastTier::new(10);
        let now = Utc::now();

        let fresh = Entry::with_created_at(
            1,
            &policy(Priority::Normal, Sensitivity::Normal),
            now,
        );
        let stale = Entry::with_created_at(
            2,
            &policy(Priority::Normal, Sensitivity::Normal),
            now - chrono::Duration::seconds(120),
        );

        tier.insert("fresh".to_string(), fresh);
        tier.insert("stale".to_string(), stale);

        let expired = tier.expired_keys(now);
        assert_eq!(expired, vec!["stale".to_string()]);
    }

    #[test]
    fn test_clear() {
        let mut tier = FastTier::new(10);
        tier.insert("a".to_string(), normal_entry(1));
        tier.insert("b".to_string(), normal_entry(2));

        tier.clear();
        assert!(tier.is_empty());
        assert_eq!(tier.capacity(), 10);
    }
}
