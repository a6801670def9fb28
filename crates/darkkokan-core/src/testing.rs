//! In-memory fakes shared by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::api::{ApiError, Network, Request, Response};
use crate::content::{Renderer, RetryHandle};
use crate::models::{ContentItem, Section};

/// Network answering from a fixed route table keyed by URL. Unknown URLs
/// get a 404.
#[derive(Default)]
pub(crate) struct StubNetwork {
    routes: Mutex<HashMap<String, Result<Response, ApiError>>>,
    calls: Mutex<HashMap<String, usize>>,
    delay: Option<Duration>,
}

impl StubNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every response is held back for `delay` (use with a paused clock)
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn respond(&self, url: &str, response: Response) {
        self.routes.lock().unwrap().insert(url.to_string(), Ok(response));
    }

    pub fn fail(&self, url: &str, error: ApiError) {
        self.routes.lock().unwrap().insert(url.to_string(), Err(error));
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn send(&self, request: &Request) -> Result<Response, ApiError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(request.url.clone())
            .or_insert(0) += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let route = self.routes.lock().unwrap().get(&request.url).cloned();
        route.unwrap_or_else(|| Ok(Response::new(404, "not found")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RenderCall {
    Loading(Section),
    Content(Section, usize),
    Empty(Section),
    Error(Section),
    Gate(Section, bool),
}

/// Renderer that records every signal it receives.
#[derive(Default)]
pub(crate) struct RecordingRenderer {
    calls: Mutex<Vec<RenderCall>>,
    retry: Mutex<Option<RetryHandle>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<RenderCall> {
        self.calls.lock().unwrap().last().cloned()
    }

    pub fn take_retry(&self) -> Option<RetryHandle> {
        self.retry.lock().unwrap().take()
    }

    fn push(&self, call: RenderCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Renderer for RecordingRenderer {
    fn show_loading(&self, section: Section) {
        self.push(RenderCall::Loading(section));
    }

    fn show_content(&self, section: Section, items: &[ContentItem]) {
        self.push(RenderCall::Content(section, items.len()));
    }

    fn show_empty(&self, section: Section) {
        self.push(RenderCall::Empty(section));
    }

    fn show_error(&self, section: Section, _error: &ApiError, retry: RetryHandle) {
        self.push(RenderCall::Error(section));
        *self.retry.lock().unwrap() = Some(retry);
    }

    fn gate_changed(&self, section: Section, _items: &[ContentItem], unlocked: bool) {
        self.push(RenderCall::Gate(section, unlocked));
    }
}

pub(crate) fn items_json(section: Section, count: usize) -> Response {
    let items: Vec<ContentItem> = (0..count)
        .map(|i| ContentItem {
            id: format!("{}-{}", section.id(), i),
            title: format!("Story {}", i),
            description: "A story".to_string(),
            thumbnail: None,
            duration: Some("10:00".to_string()),
            category: section.id().to_string(),
            locked: section.is_gated(),
            access_url: section
                .is_gated()
                .then(|| format!("https://open.spotify.com/episode/{}", i)),
        })
        .collect();
    Response::ok_json(serde_json::to_vec(&items).unwrap())
}
