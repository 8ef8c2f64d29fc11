//! Score-based batch eviction for the fast tier.
//!
//! When the fast tier exceeds its capacity, the lowest-scoring
//! `max(1, capacity / 5)` residents are evicted in one batch, trading
//! eviction frequency for amortized cost. High-priority, high-sensitivity
//! entries survive capacity pressure longer than transient ones.

use std::collections::HashMap;

use stratum_core::{Priority, Sensitivity};

use crate::fast_tier::Resident;

/// Retention score: sum of the priority and sensitivity ranks.
///
/// The two scales are deliberately summed without normalization, so a
/// Low/Critical entry (0+2) and a Normal/Normal entry (1+1) score the same;
/// among equal scores the oldest insertion is evicted first.
pub fn retention_score(priority: Priority, sensitivity: Sensitivity) -> u8 {
    priority.rank() + sensitivity.rank()
}

/// Number of entries to evict per batch: `max(1, capacity / 5)`.
pub(crate) fn batch_size(capacity: usize) -> usize {
    (capacity / 5).max(1)
}

/// Select the keys of the `count` lowest-scoring residents.
///
/// Ordering is ascending score, then ascending insertion sequence, which
/// keeps selection deterministic within one evaluation regardless of map
/// iteration order.
pub(crate) fn select_victims<T>(residents: &HashMap<String, Resident<T>>, count: usize) -> Vec<String> {
    let mut candidates: Vec<(u8, u64, &String)> = residents
        .iter()
        .map(|(key, resident)| {
            (
                retention_score(resident.entry.priority, resident.entry.sensitivity),
                resident.seq,
                key,
            )
        })
        .collect();

    candidates.sort_unstable();

    candidates
        .into_iter()
        .take(count)
        .map(|(_, _, key)| key.clone())
        .collect()
}
