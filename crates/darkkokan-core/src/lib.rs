//! Core library for the Dark Kokan story catalog.
//!
//! Two subsystems live here and never call each other directly:
//!
//! - [`cache::OfflineCache`]: a versioned response cache that sits in front
//!   of the real network (install / activate / fetch lifecycle).
//! - [`content::ContentController`]: per-section lazy loading and the timed
//!   unlock gate for the audio section.
//!
//! They are composed only through the [`api::Network`] trait: the front end
//! hands the controller an `OfflineCache` wrapping an [`api::ApiClient`].

pub mod api;
pub mod cache;
pub mod config;
pub mod content;
pub mod models;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiClient, ApiError, Network, Request, Response};
pub use cache::{CacheError, DiskStorage, MemoryStorage, OfflineCache};
pub use config::{Config, Theme};
pub use content::{ContentController, LoadOutcome, Renderer, RetryHandle};
pub use models::{ContentItem, Section};
