//! Stratum Core - Cache Data Types
//!
//! Pure data structures with no behavior. The cache engine crate depends on
//! this. This crate contains ONLY data types - no tiers, no tasks, no I/O.

use chrono::{DateTime, Utc};

pub mod entry;
pub mod error;
pub mod policy;

pub use entry::Entry;
pub use error::{CacheError, ConfigError, StorageError};
pub use policy::{Policy, PolicyOverride, Priority, Sensitivity};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;
