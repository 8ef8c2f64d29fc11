//! Cache facade: the public two-tier cache operations.
//!
//! [`TieredCache`] orchestrates the fast tier, the durable tier adapter,
//! the policy registry, warmup, and the expiration sweeper behind
//! `set`/`get`/`remove`/`clear`/`stats` plus an explicit `start`/`stop`
//! lifecycle. The cache is an explicitly constructed, explicitly owned
//! object - there is no process-wide singleton.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;

use stratum_core::{CacheError, ConfigError, Entry, Policy, PolicyOverride};

use crate::durable::DurableTier;
use crate::fast_tier::FastTier;
use crate::policy::PolicyRegistry;
use crate::store::KeyValueStore;
use crate::sweeper::{self, SweeperMetrics};
use crate::warmup;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Default fast-tier capacity, in entries.
pub const DEFAULT_CAPACITY: usize = 50;

/// Default sweep interval: 10 minutes.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 600;

/// Default bound on individual durable-tier operations.
pub const DEFAULT_OP_TIMEOUT_SECS: u64 = 2;

/// Default durable-tier key namespace.
pub const DEFAULT_NAMESPACE: &str = "stratum";

/// Configuration for a [`TieredCache`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of fast-tier entries.
    pub capacity: usize,
    /// How often the expiration sweeper runs.
    pub sweep_interval: Duration,
    /// Bound on each durable-tier read/write/delete.
    pub op_timeout: Duration,
    /// Namespace prefix for durable-tier keys.
    pub namespace: String,
    /// Keys pre-populated from the durable tier at startup, promoted with
    /// `priority=High, sensitivity=Critical`.
    pub warmup_keys: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            op_timeout: Duration::from_secs(DEFAULT_OP_TIMEOUT_SECS),
            namespace: DEFAULT_NAMESPACE.to_string(),
            warmup_keys: Vec::new(),
        }
    }
}

impl CacheConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fast-tier capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Set the durable operation timeout.
    pub fn with_op_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = timeout;
        self
    }

    /// Set the durable-tier namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the warmup key list.
    pub fn with_warmup_keys(mut self, keys: Vec<String>) -> Self {
        self.warmup_keys = keys;
        self
    }
}

// ============================================================================
// STATISTICS
// ============================================================================

/// Read-only snapshot for telemetry collaborators to poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries currently resident in the fast tier.
    pub fast_tier_size: usize,
    /// Number of `get` calls that returned a value, from either tier.
    pub hits: u64,
    /// Number of `get` calls that returned `None`.
    pub misses: u64,
    /// Cumulative capacity evictions.
    pub evictions: u64,
    /// Cumulative entries reaped by the expiration sweeper.
    pub expired_swept: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// ============================================================================
// FACADE
// ============================================================================

/// Marker trait for payloads the cache can hold.
///
/// Blanket-implemented: any clonable, serde-capable, thread-safe type
/// qualifies. Callers with heterogeneous values use an enum payload.
pub trait CacheValue: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> CacheValue for T where T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

/// Two-tier, priority-aware cache.
///
/// # Type Parameters
///
/// - `T`: the payload type stored under every key of this cache
/// - `S`: the durable key-value store implementation
///
/// # Concurrency
///
/// The fast tier behind one `RwLock` is the single shared mutable resource.
/// No durable I/O happens while the lock is held, so fast-path readers never
/// wait on storage. Every durable operation is timeout-bounded; failures
/// degrade to memory-only operation.
pub struct TieredCache<T, S> {
    fast: Arc<RwLock<FastTier<T>>>,
    durable: DurableTier<S>,
    registry: PolicyRegistry,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    sweeper_metrics: Arc<SweeperMetrics>,
    shutdown_tx: watch::Sender<bool>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl<T, S> TieredCache<T, S>
where
    T: CacheValue,
    S: KeyValueStore + 'static,
{
    /// Create a cache over a durable store. The cache is not ready until
    /// [`start`](Self::start) has run.
    pub fn new(
        store: Arc<S>,
        registry: PolicyRegistry,
        config: CacheConfig,
    ) -> Result<Self, ConfigError> {
        if config.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        let (shutdown_tx, _) = watch::channel(false);
        let durable = DurableTier::new(store, config.namespace.clone(), config.op_timeout);

        Ok(Self {
            fast: Arc::new(RwLock::new(FastTier::new(config.capacity))),
            durable,
            registry,
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sweeper_metrics: Arc::new(SweeperMetrics::new()),
            shutdown_tx,
            sweeper: Mutex::new(None),
        })
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Run warmup, then spawn the expiration sweeper.
    ///
    /// Calling `start` on an already-started cache is a logged no-op.
    pub async fn start(&self) {
        let mut slot = self.sweeper.lock().await;
        if slot.is_some() {
            tracing::warn!("Cache already started");
            return;
        }

        if !self.config.warmup_keys.is_empty() {
            let loaded =
                warmup::warm_fast_tier(&self.config.warmup_keys, &self.durable, &self.fast).await;
            tracing::info!(
                loaded,
                requested = self.config.warmup_keys.len(),
                "Warmup complete"
            );
        }

        // Reset the signal so a stopped cache can be started again.
        let _ = self.shutdown_tx.send(false);
        let handle = tokio::spawn(sweeper::sweep_task(
            Arc::clone(&self.fast),
            self.durable.clone(),
            self.config.sweep_interval,
            Arc::clone(&self.sweeper_metrics),
            self.shutdown_tx.subscribe(),
        ));
        *slot = Some(handle);
    }

    /// Signal the sweeper to shut down and join it.
    ///
    /// Deterministic: when `stop` returns, no scheduled work remains.
    /// Stopping a cache that is not running is a no-op.
    pub async fn stop(&self) {
        let handle = self.sweeper.lock().await.take();
        if let Some(handle) = handle {
            let _ = self.shutdown_tx.send(true);
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Sweeper task failed to join");
            }
        }
    }

    /// Store a value under `key`.
    ///
    /// The policy is resolved from the registry plus the optional override;
    /// a key with neither fails with [`CacheError::MissingPolicy`]. The
    /// fast-tier write always happens; the durable write is best-effort and
    /// its error is deliberately discarded after logging - the fast-tier
    /// state is never rolled back on durable failure.
    pub async fn set(
        &self,
        key: &str,
        value: T,
        policy_override: Option<PolicyOverride>,
    ) -> Result<(), CacheError> {
        let policy = self.resolve_policy(key, policy_override)?;
        let entry = Entry::new(value, &policy);

        let evicted = {
            let mut tier = self.fast.write().await;
            tier.insert(key.to_string(), entry.clone())
        };
        if !evicted.is_empty() {
            tracing::debug!(
                key,
                evicted = evicted.len(),
                "Capacity eviction triggered by insert"
            );
        }

        if let Err(e) = self.durable.write(key, &entry).await {
            tracing::warn!(key, error = %e, "Durable write failed; entry is memory-only");
        }

        Ok(())
    }

    /// Retrieve the value under `key`, if present and unexpired in either
    /// tier.
    ///
    /// Fast-tier fresh hits return immediately. On a miss or an expired
    /// resident, the durable tier is consulted: a fresh record is promoted
    /// into the fast tier and returned; an expired record is removed from
    /// both tiers. An expired entry is never returned, regardless of which
    /// tier holds it.
    pub async fn get(&self, key: &str) -> Option<T> {
        let now = Utc::now();

        let had_expired_resident = {
            let tier = self.fast.read().await;
            match tier.get(key) {
                Some(entry) if !entry.is_expired(now) => {
                    let data = entry.data.clone();
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(data);
                }
                Some(_) => true,
                None => false,
            }
        };

        if had_expired_resident {
            self.fast.write().await.remove(key);
        }

        match self.durable.read::<T>(key).await {
            Ok(Some(entry)) if !entry.is_expired(now) => {
                let data = entry.data.clone();
                let evicted = {
                    let mut tier = self.fast.write().await;
                    tier.insert(key.to_string(), entry)
                };
                if !evicted.is_empty() {
                    tracing::debug!(
                        key,
                        evicted = evicted.len(),
                        "Capacity eviction triggered by promotion"
                    );
                }
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(data)
            }
            Ok(Some(_)) => {
                // Expired wherever it was found: purge the durable copy too.
                if let Err(e) = self.durable.delete(key).await {
                    tracing::warn!(key, error = %e, "Failed to delete expired durable record");
                }
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Ok(None) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "Durable read failed; treating as miss");
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Remove `key` from both tiers. Idempotent: removing an absent key is
    /// a no-op.
    pub async fn remove(&self, key: &str) {
        self.fast.write().await.remove(key);
        if let Err(e) = self.durable.delete(key).await {
            tracing::warn!(key, error = %e, "Durable delete failed");
        }
    }

    /// Empty the fast tier and delete every durable key under this cache's
    /// namespace.
    pub async fn clear(&self) {
        self.fast.write().await.clear();
        let deleted = self.durable.clear().await;
        tracing::info!(deleted, "Cache cleared");
    }

    /// Read-only statistics snapshot.
    pub async fn stats(&self) -> CacheStats {
        let tier = self.fast.read().await;
        CacheStats {
            fast_tier_size: tier.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: tier.evictions(),
            expired_swept: self
                .sweeper_metrics
                .entries_expired
                .load(Ordering::Relaxed),
        }
    }

    fn resolve_policy(
        &self,
        key: &str,
        policy_override: Option<PolicyOverride>,
    ) -> Result<Policy, CacheError> {
        match (self.registry.lookup(key), policy_override) {
            (Some(base), Some(overrides)) => Ok(overrides.apply(base)),
            (Some(base), None) => Ok(base.clone()),
            (None, Some(overrides)) => {
                overrides
                    .into_policy()
                    .ok_or_else(|| CacheError::MissingPolicy {
                        key: key.to_string(),
                    })
            }
            (None, None) => Err(CacheError::MissingPolicy {
                key: key.to_string(),
            }),
        }
    }
}

impl<T, S> Drop for TieredCache<T, S> {
    fn drop(&mut self) {
        // Best-effort signal in case the cache is dropped without `stop`;
        // the deterministic path is `stop`, which also joins the task.
        let _ = self.shutdown_tx.send(true);
    }
}
