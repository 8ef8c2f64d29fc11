//! Expiration Sweeper background task.
//!
//! A periodic task that scans the fast tier for expired entries, removes
//! them, and issues matching deletes against the durable tier. Durable-only
//! entries that were never promoted are reaped lazily at the next `get`
//! instead.
//!
//! The task runs until the shutdown signal is received; `TieredCache::stop`
//! sends the signal and joins the handle, so no timer outlives the cache.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{watch, RwLock};
use tokio::time::{interval, MissedTickBehavior};

use crate::durable::DurableTier;
use crate::fast_tier::FastTier;
use crate::store::KeyValueStore;

// ============================================================================
// METRICS
// ============================================================================

/// Counters for sweeper activity, pollable by telemetry collaborators.
#[derive(Debug, Default)]
pub struct SweeperMetrics {
    /// Total sweep cycles completed since startup.
    pub sweep_cycles: AtomicU64,

    /// Total entries removed because they were expired.
    pub entries_expired: AtomicU64,

    /// Total durable deletes that failed during sweeps.
    pub delete_errors: AtomicU64,
}

impl SweeperMetrics {
    /// Create a new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of all counters.
    pub fn snapshot(&self) -> SweeperSnapshot {
        SweeperSnapshot {
            sweep_cycles: self.sweep_cycles.load(Ordering::Relaxed),
            entries_expired: self.entries_expired.load(Ordering::Relaxed),
            delete_errors: self.delete_errors.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of sweeper metrics at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweeperSnapshot {
    pub sweep_cycles: u64,
    pub entries_expired: u64,
    pub delete_errors: u64,
}

// ============================================================================
// BACKGROUND TASK
// ============================================================================

/// Run the sweep loop until the shutdown signal flips to `true`.
pub(crate) async fn sweep_task<T, S>(
    fast: std::sync::Arc<RwLock<FastTier<T>>>,
    durable: DurableTier<S>,
    period: Duration,
    metrics: std::sync::Arc<SweeperMetrics>,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    T: Send + Sync + 'static,
    S: KeyValueStore,
{
    let mut tick = interval(period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        period_secs = period.as_secs(),
        "Expiration sweeper started"
    );

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    tracing::info!("Expiration sweeper shutting down");
                    break;
                }
            }

            _ = tick.tick() => {
                sweep_once(&fast, &durable, &metrics).await;
            }
        }
    }

    let snapshot = metrics.snapshot();
    tracing::info!(
        sweep_cycles = snapshot.sweep_cycles,
        entries_expired = snapshot.entries_expired,
        delete_errors = snapshot.delete_errors,
        "Expiration sweeper stopped"
    );
}

/// Perform one sweep cycle. Returns the number of entries reaped.
///
/// Expired keys are collected and removed under the fast-tier lock; the
/// matching durable deletes happen only after the lock is released, so
/// fast-path readers never wait on storage.
pub(crate) async fn sweep_once<T, S>(
    fast: &RwLock<FastTier<T>>,
    durable: &DurableTier<S>,
    metrics: &SweeperMetrics,
) -> usize
where
    S: KeyValueStore,
{
    metrics.sweep_cycles.fetch_add(1, Ordering::Relaxed);

    let now = Utc::now();
    let expired: Vec<String> = {
        let mut tier = fast.write().await;
        let keys = tier.expired_keys(now);
        for key in &keys {
            tier.remove(key);
        }
        keys
    };

    if expired.is_empty() {
        tracing::trace!("Sweep cycle found no expired entries");
        return 0;
    }

    for key in &expired {
        if let Err(e) = durable.delete(key).await {
            tracing::warn!(key = %key, error = %e, "Durable delete failed during sweep");
            metrics.delete_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    metrics
        .entries_expired
        .fetch_add(expired.len() as u64, Ordering::Relaxed);
    tracing::debug!(count = expired.len(), "Swept expired entries");

    expired.len()
}
