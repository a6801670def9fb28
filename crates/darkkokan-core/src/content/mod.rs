//! Section content loading and the unlock gate.
//!
//! `ContentController` owns one `SectionState` per section and loads each
//! section's data at most once per session. It also owns the `UnlockGate`
//! deciding whether locked audio items are playable. All UI concerns go
//! through the `Renderer` trait.

pub mod controller;
pub mod fallback;
pub mod gate;
pub mod render;

pub use controller::{ContentController, LoadOutcome, SectionState};
pub use gate::{is_playable, UnlockGate, GRANT_DURATION};
pub use render::{Renderer, RetryHandle};
