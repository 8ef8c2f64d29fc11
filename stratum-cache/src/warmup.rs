//! Cold-start warmup: pre-populate the fast tier from the durable tier.
//!
//! Runs once inside `TieredCache::start`, before the cache is considered
//! ready. Only a fixed list of sensitivity-critical keys is loaded; each
//! read is bounded by the adapter's timeout, and per-key failures are
//! logged and skipped so warmup never blocks indefinitely or aborts.

use chrono::Utc;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use stratum_core::{Priority, Sensitivity};

use crate::durable::DurableTier;
use crate::fast_tier::FastTier;
use crate::store::KeyValueStore;

/// Load the configured warmup keys into the fast tier.
///
/// Persisted entries that are present and unexpired are promoted with
/// `priority=High, sensitivity=Critical`, overriding whatever classes were
/// persisted. Returns the number of entries loaded.
pub(crate) async fn warm_fast_tier<T, S>(
    keys: &[String],
    durable: &DurableTier<S>,
    fast: &RwLock<FastTier<T>>,
) -> usize
where
    T: DeserializeOwned,
    S: KeyValueStore,
{
    let now = Utc::now();
    let mut loaded = 0;

    for key in keys {
        match durable.read::<T>(key).await {
            Ok(Some(mut entry)) => {
                if entry.is_expired(now) {
                    tracing::debug!(key = %key, "Skipping expired entry during warmup");
                    continue;
                }
                entry.priority = Priority::High;
                entry.sensitivity = Sensitivity::Critical;
                let _ = fast.write().await.insert(key.clone(), entry);
                loaded += 1;
            }
            Ok(None) => {
                tracing::debug!(key = %key, "No persisted entry for warmup key");
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Warmup read failed, skipping key");
            }
        }
    }

    loaded
}
