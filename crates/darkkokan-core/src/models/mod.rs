//! Data models for catalog content.
//!
//! - `Section`: the fixed set of content categories shown as tabs
//! - `ContentItem`: one story record as served from `/data/<section>.json`

pub mod content;
pub mod section;

pub use content::ContentItem;
pub use section::{EmptyState, ParseSectionError, Section};
