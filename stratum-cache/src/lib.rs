//! Stratum - a two-tier, priority-aware cache.
//!
//! This crate coordinates a bounded in-memory fast tier and a durable
//! key-value tier behind a single facade, with time-based expiration,
//! score-based batch eviction, a periodic expiration sweeper, and cold-start
//! warmup for a fixed set of critical keys.
//!
//! # Design Philosophy
//!
//! The durable tier is a collaborator, not a dependency: every durable
//! failure degrades to a cache miss or a no-op write plus a diagnostic log
//! line, so the cache stays usable memory-only when storage is unavailable.
//! The only hard error a caller ever sees is [`stratum_core::CacheError::MissingPolicy`]
//! on `set`.
//!
//! # Example
//!
//! ```ignore
//! let registry = PolicyRegistry::new().with_policy(
//!     "emergencyContacts",
//!     Policy::new(Duration::from_secs(86_400), Priority::High, Sensitivity::Critical),
//! );
//! let store = Arc::new(LmdbStore::new("/var/lib/app/cache", 64)?);
//! let cache: TieredCache<Contacts, _> =
//!     TieredCache::new(store, registry, CacheConfig::default())?;
//!
//! cache.start().await; // warmup, then the sweeper spawns
//! cache.set("emergencyContacts", contacts, None).await?;
//! let hit = cache.get("emergencyContacts").await;
//! cache.stop().await; // joins the sweeper deterministically
//! ```

pub mod cache;
pub mod durable;
pub mod eviction;
pub mod fast_tier;
pub mod lmdb;
pub mod policy;
pub mod store;
pub mod sweeper;
pub(crate) mod warmup;

pub use cache::{CacheConfig, CacheStats, CacheValue, TieredCache};
pub use durable::DurableTier;
pub use eviction::retention_score;
pub use fast_tier::FastTier;
pub use lmdb::{LmdbStore, LmdbStoreError};
pub use policy::PolicyRegistry;
pub use store::{KeyValueStore, MemoryStore};
pub use sweeper::{SweeperMetrics, SweeperSnapshot};
