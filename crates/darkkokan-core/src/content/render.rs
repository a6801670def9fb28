use std::fmt;
use std::sync::Weak;

use crate::api::ApiError;
use crate::models::{ContentItem, Section};

use super::{ContentController, LoadOutcome};

/// Receives section state changes. Owns all presentation concerns.
///
/// Calls arrive from whichever task is running the load, so implementations
/// should hand work off (e.g. over a channel) rather than draw directly.
pub trait Renderer: Send + Sync {
    fn show_loading(&self, section: Section);

    fn show_content(&self, section: Section, items: &[ContentItem]);

    fn show_empty(&self, section: Section);

    fn show_error(&self, section: Section, error: &ApiError, retry: RetryHandle);

    /// The unlock gate flipped; already loaded items should be redrawn
    fn gate_changed(&self, section: Section, items: &[ContentItem], unlocked: bool);
}

/// Re-invokes the load for one section. Does not keep the controller alive.
#[derive(Clone)]
pub struct RetryHandle {
    controller: Weak<ContentController>,
    section: Section,
}

impl RetryHandle {
    pub(crate) fn new(controller: Weak<ContentController>, section: Section) -> Self {
        Self {
            controller,
            section,
        }
    }

    pub fn section(&self) -> Section {
        self.section
    }

    /// Returns `None` if the controller has been dropped
    pub async fn retry(&self) -> Option<LoadOutcome> {
        let controller = self.controller.upgrade()?;
        Some(controller.retry(self.section).await)
    }
}

impl fmt::Debug for RetryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryHandle")
            .field("section", &self.section)
            .finish_non_exhaustive()
    }
}
