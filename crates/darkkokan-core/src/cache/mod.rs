//! Offline response caching.
//!
//! This module provides `OfflineCache`, a `Network` that serves responses
//! from a single versioned bucket and passes misses through to the wrapped
//! network. Its lifecycle mirrors a service worker:
//!
//! - install: populate the current bucket from a fixed manifest (all or nothing)
//! - activate: delete every bucket whose label is not the current version
//! - fetch: cache-first lookup, no revalidation
//!
//! Buckets are persisted through the `CacheStorage` trait, either on disk
//! (`DiskStorage`) or in memory (`MemoryStorage`).

pub mod bucket;
pub mod error;
pub mod manager;
pub mod storage;

pub use bucket::{Bucket, CachedData};
pub use error::CacheError;
pub use manager::{ActivateReport, CachePhase, OfflineCache, RegisterOutcome};
pub use storage::{CacheStorage, DiskStorage, MemoryStorage};
