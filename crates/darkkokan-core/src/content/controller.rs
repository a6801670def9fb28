use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Duration, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::api::{ApiError, Network, Request};
use crate::models::{ContentItem, Section};

use super::gate::{self, UnlockGate, GRANT_DURATION};
use super::{fallback, Renderer, RetryHandle};

/// Per-section load state.
#[derive(Debug, Clone, Default)]
pub struct SectionState {
    pub loaded: bool,
    /// A fetch is outstanding; further calls must not start another
    pub in_flight: bool,
    pub items: Vec<ContentItem>,
}

/// What a call to `ensure_section_loaded` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Section was loaded earlier; nothing happened
    AlreadyLoaded,
    /// Another call is fetching this section right now
    InFlight,
    Loaded(usize),
    /// Loaded successfully, and the section is intentionally empty
    Empty,
    /// Endpoint unreachable; built-in items were used instead
    Fallback(usize),
    /// Fetch or parse failed; the section stays unloaded
    Failed(ApiError),
}

/// Owns section load state and the unlock gate for one session.
///
/// Must be used inside a Tokio runtime: granting an unlock spawns the
/// revert timer.
pub struct ContentController {
    network: Arc<dyn Network>,
    renderer: Arc<dyn Renderer>,
    sections: Mutex<HashMap<Section, SectionState>>,
    gate: Mutex<UnlockGate>,
    /// Pending revert and the grant generation it belongs to
    revert_task: Mutex<Option<(u64, JoinHandle<()>)>>,
}

/// Clears a section's `in_flight` flag if a load is dropped mid-fetch.
struct InFlightGuard<'a> {
    controller: &'a ContentController,
    section: Section,
    armed: bool,
}

impl InFlightGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!(section = %self.section, "Load cancelled before it finished");
            self.controller.finish_failed(self.section);
        }
    }
}

impl ContentController {
    pub fn new(network: Arc<dyn Network>, renderer: Arc<dyn Renderer>) -> Arc<Self> {
        let sections = Section::ALL
            .into_iter()
            .map(|section| (section, SectionState::default()))
            .collect();

        Arc::new(Self {
            network,
            renderer,
            sections: Mutex::new(sections),
            gate: Mutex::new(UnlockGate::new()),
            revert_task: Mutex::new(None),
        })
    }

    fn sections(&self) -> MutexGuard<'_, HashMap<Section, SectionState>> {
        self.sections.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn gate(&self) -> MutexGuard<'_, UnlockGate> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Section loading
    // =========================================================================

    /// Load a section's items the first time it is visited.
    ///
    /// Once a section is loaded this returns immediately without touching
    /// the network. Failures leave it unloaded so a retry can fetch again.
    pub async fn ensure_section_loaded(self: &Arc<Self>, section: Section) -> LoadOutcome {
        {
            let mut sections = self.sections();
            let state = sections.entry(section).or_default();
            if state.loaded {
                return LoadOutcome::AlreadyLoaded;
            }
            if state.in_flight {
                debug!(section = %section, "Load already in flight");
                return LoadOutcome::InFlight;
            }
            state.in_flight = true;
        }
        let mut guard = InFlightGuard {
            controller: self,
            section,
            armed: true,
        };

        info!(section = %section, "Loading section content");
        self.renderer.show_loading(section);

        let (items, used_fallback) = match self.fetch_items(section).await {
            Ok(items) => (items, false),
            Err(e) if e.is_unreachable() => {
                warn!(
                    section = %section,
                    error = %e,
                    "Data endpoint unreachable, using built-in items"
                );
                (fallback::items(section), true)
            }
            Err(e) => {
                self.finish_failed(section);
                guard.disarm();
                error!(section = %section, error = %e, "Failed to load section content");
                self.renderer.show_error(section, &e, self.retry_handle(section));
                return LoadOutcome::Failed(e);
            }
        };

        guard.disarm();
        if !self.store(section, &items) {
            return LoadOutcome::AlreadyLoaded;
        }

        info!(
            section = %section,
            count = items.len(),
            fallback = used_fallback,
            "Section content loaded"
        );
        if items.is_empty() {
            self.renderer.show_empty(section);
            LoadOutcome::Empty
        } else {
            self.renderer.show_content(section, &items);
            if used_fallback {
                LoadOutcome::Fallback(items.len())
            } else {
                LoadOutcome::Loaded(items.len())
            }
        }
    }

    /// Explicit, caller-triggered reload after a failure. A no-op once loaded.
    pub async fn retry(self: &Arc<Self>, section: Section) -> LoadOutcome {
        debug!(section = %section, "Retrying section load");
        self.ensure_section_loaded(section).await
    }

    pub fn retry_handle(self: &Arc<Self>, section: Section) -> RetryHandle {
        RetryHandle::new(Arc::downgrade(self), section)
    }

    async fn fetch_items(&self, section: Section) -> Result<Vec<ContentItem>, ApiError> {
        let request = Request::get(section.data_path());
        let response = self.network.send(&request).await?;

        if !response.is_success() {
            return Err(ApiError::from_status(response.status, &response.text()));
        }

        let mut items: Vec<ContentItem> = response.json()?;
        for item in items.iter_mut().filter(|item| item.category.is_empty()) {
            item.category = section.id().to_string();
        }
        Ok(items)
    }

    /// Record a successful load. Never overwrites a section that is
    /// already loaded; returns false in that case.
    fn store(&self, section: Section, items: &[ContentItem]) -> bool {
        let mut sections = self.sections();
        let state = sections.entry(section).or_default();
        state.in_flight = false;
        if state.loaded {
            return false;
        }
        state.items = items.to_vec();
        state.loaded = true;
        true
    }

    fn finish_failed(&self, section: Section) {
        if let Some(state) = self.sections().get_mut(&section) {
            state.in_flight = false;
        }
    }

    pub fn is_loaded(&self, section: Section) -> bool {
        self.sections()
            .get(&section)
            .map(|state| state.loaded)
            .unwrap_or(false)
    }

    pub fn is_loading(&self, section: Section) -> bool {
        self.sections()
            .get(&section)
            .map(|state| state.in_flight)
            .unwrap_or(false)
    }

    /// Snapshot of a section's loaded items (empty until loaded)
    pub fn section_items(&self, section: Section) -> Vec<ContentItem> {
        self.sections()
            .get(&section)
            .map(|state| state.items.clone())
            .unwrap_or_default()
    }

    // =========================================================================
    // Unlock gate
    // =========================================================================

    /// Unlock locked items for `GRANT_DURATION`.
    ///
    /// Granting again while unlocked restarts the clock; only the latest
    /// grant's revert is allowed to lock the gate.
    pub fn grant_unlock(self: &Arc<Self>) {
        // Held across grant and spawn so the stored task is always the newest generation's
        let mut revert_task = self.revert_task.lock().unwrap_or_else(PoisonError::into_inner);

        let generation = self.gate().grant(Utc::now());
        info!(generation, minutes = GRANT_DURATION.as_secs() / 60, "Unlock granted");

        let controller = Arc::downgrade(self);
        let task = tokio::spawn(async move {
            tokio::time::sleep(GRANT_DURATION).await;
            if let Some(controller) = controller.upgrade() {
                controller.expire_unlock(generation);
            }
        });

        if let Some((superseded, previous)) = revert_task.replace((generation, task)) {
            debug!(generation = superseded, "Cancelling superseded unlock revert");
            previous.abort();
        }
        drop(revert_task);

        self.rerender_gated();
    }

    fn expire_unlock(&self, generation: u64) {
        if self.gate().expire(generation) {
            info!(generation, "Unlock expired");
            self.rerender_gated();
        } else {
            debug!(generation, "Ignoring superseded unlock revert");
        }
    }

    fn rerender_gated(&self) {
        let unlocked = self.is_unlocked();
        for section in Section::ALL.into_iter().filter(Section::is_gated) {
            let items = {
                let sections = self.sections();
                match sections.get(&section) {
                    Some(state) if state.loaded => state.items.clone(),
                    _ => continue,
                }
            };
            self.renderer.gate_changed(section, &items, unlocked);
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.gate().is_unlocked()
    }

    pub fn is_playable(&self, item: &ContentItem) -> bool {
        gate::is_playable(item, self.is_unlocked())
    }

    /// Time left on the current grant, if unlocked
    pub fn unlock_remaining(&self) -> Option<Duration> {
        self.gate().time_until_expiry(Utc::now())
    }
}

impl Drop for ContentController {
    fn drop(&mut self) {
        if let Some((_, task)) = self
            .revert_task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use super::*;
    use crate::api::Response;
    use crate::cache::{MemoryStorage, OfflineCache};
    use crate::testing::{items_json, RecordingRenderer, RenderCall, StubNetwork};

    fn controller_with(
        network: Arc<StubNetwork>,
    ) -> (Arc<ContentController>, Arc<RecordingRenderer>) {
        let renderer = Arc::new(RecordingRenderer::new());
        let controller = ContentController::new(network, renderer.clone());
        (controller, renderer)
    }

    fn network_with_all_sections() -> Arc<StubNetwork> {
        let network = StubNetwork::new();
        network.respond("/data/horror.json", items_json(Section::Horror, 3));
        network.respond("/data/mysterious.json", items_json(Section::Mysterious, 2));
        network.respond("/data/spotify.json", items_json(Section::Spotify, 2));
        Arc::new(network)
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_load_twice_fetches_once() {
        let network = network_with_all_sections();
        let (controller, renderer) = controller_with(network.clone());

        assert_eq!(controller.ensure_section_loaded(Section::Horror).await, LoadOutcome::Loaded(3));
        assert_eq!(
            controller.ensure_section_loaded(Section::Horror).await,
            LoadOutcome::AlreadyLoaded
        );

        assert_eq!(network.calls_for("/data/horror.json"), 1);
        assert_eq!(
            renderer.calls(),
            vec![RenderCall::Loading(Section::Horror), RenderCall::Content(Section::Horror, 3)]
        );
    }

    #[tokio::test]
    async fn test_loaded_section_never_refetches() {
        let network = network_with_all_sections();
        let (controller, _) = controller_with(network.clone());

        controller.ensure_section_loaded(Section::Mysterious).await;
        let visits = [Section::Horror, Section::Mysterious, Section::Spotify, Section::Mysterious];
        for section in visits {
            controller.ensure_section_loaded(section).await;
        }
        controller.grant_unlock();
        controller.ensure_section_loaded(Section::Mysterious).await;

        assert_eq!(network.calls_for("/data/mysterious.json"), 1);
        assert_eq!(controller.section_items(Section::Mysterious).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_first_calls_share_one_fetch() {
        let network = StubNetwork::with_delay(StdDuration::from_secs(1));
        network.respond("/data/horror.json", items_json(Section::Horror, 1));
        let network = Arc::new(network);
        let (controller, _) = controller_with(network.clone());

        let (first, second) = tokio::join!(
            controller.ensure_section_loaded(Section::Horror),
            controller.ensure_section_loaded(Section::Horror),
        );

        assert_eq!(first, LoadOutcome::Loaded(1));
        assert_eq!(second, LoadOutcome::InFlight);
        assert_eq!(network.calls_for("/data/horror.json"), 1);
        assert!(controller.is_loaded(Section::Horror));
        assert!(!controller.is_loading(Section::Horror));
    }

    #[tokio::test]
    async fn test_empty_payload_is_loaded_not_error() {
        let network = StubNetwork::new();
        network.respond("/data/mysterious.json", Response::ok_json("[]"));
        let network = Arc::new(network);
        let (controller, renderer) = controller_with(network.clone());

        assert_eq!(controller.ensure_section_loaded(Section::Mysterious).await, LoadOutcome::Empty);
        assert!(controller.is_loaded(Section::Mysterious));
        assert_eq!(renderer.last(), Some(RenderCall::Empty(Section::Mysterious)));
        assert!(renderer.take_retry().is_none());

        controller.ensure_section_loaded(Section::Mysterious).await;
        assert_eq!(network.calls_for("/data/mysterious.json"), 1);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_uses_fallback() {
        let network = StubNetwork::new();
        network.fail("/data/horror.json", ApiError::Unreachable("connection refused".into()));
        let (controller, renderer) = controller_with(Arc::new(network));

        let outcome = controller.ensure_section_loaded(Section::Horror).await;

        assert_eq!(outcome, LoadOutcome::Fallback(1));
        assert!(controller.is_loaded(Section::Horror));
        assert_eq!(controller.section_items(Section::Horror), fallback::items(Section::Horror));
        assert_eq!(renderer.last(), Some(RenderCall::Content(Section::Horror, 1)));
    }

    #[tokio::test]
    async fn test_error_status_leaves_section_unloaded() {
        let network = StubNetwork::new();
        network.respond("/data/spotify.json", Response::new(500, "boom"));
        let (controller, renderer) = controller_with(Arc::new(network));

        let outcome = controller.ensure_section_loaded(Section::Spotify).await;

        assert!(matches!(outcome, LoadOutcome::Failed(ApiError::ServerError(_))));
        assert!(!controller.is_loaded(Section::Spotify));
        assert!(!controller.is_loading(Section::Spotify));
        assert_eq!(renderer.last(), Some(RenderCall::Error(Section::Spotify)));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_an_error() {
        let network = StubNetwork::new();
        network.respond("/data/horror.json", Response::ok_json("{\"not\": \"a list\"}"));
        let (controller, _) = controller_with(Arc::new(network));

        let outcome = controller.ensure_section_loaded(Section::Horror).await;

        assert!(matches!(outcome, LoadOutcome::Failed(ApiError::MalformedPayload(_))));
        assert!(!controller.is_loaded(Section::Horror));
    }

    #[tokio::test]
    async fn test_retry_handle_reloads_after_failure() {
        let network = StubNetwork::new();
        network.respond("/data/horror.json", Response::new(503, "busy"));
        let network = Arc::new(network);
        let (controller, renderer) = controller_with(network.clone());

        controller.ensure_section_loaded(Section::Horror).await;
        let retry = renderer.take_retry().expect("error carries a retry handle");
        assert_eq!(retry.section(), Section::Horror);

        network.respond("/data/horror.json", items_json(Section::Horror, 2));
        assert_eq!(retry.retry().await, Some(LoadOutcome::Loaded(2)));
        assert_eq!(network.calls_for("/data/horror.json"), 2);

        // Once loaded the same handle no longer fetches
        assert_eq!(retry.retry().await, Some(LoadOutcome::AlreadyLoaded));
        assert_eq!(network.calls_for("/data/horror.json"), 2);
    }

    #[tokio::test]
    async fn test_retry_handle_outliving_controller() {
        let network = StubNetwork::new();
        network.respond("/data/horror.json", Response::new(503, "busy"));
        let (controller, renderer) = controller_with(Arc::new(network));

        controller.ensure_section_loaded(Section::Horror).await;
        let retry = renderer.take_retry().expect("retry handle");
        drop(controller);

        assert_eq!(retry.retry().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_load_can_be_retried() {
        let network = StubNetwork::with_delay(StdDuration::from_secs(1));
        network.respond("/data/horror.json", items_json(Section::Horror, 1));
        let network = Arc::new(network);
        let (controller, _) = controller_with(network.clone());

        let cancelled = tokio::time::timeout(
            StdDuration::from_millis(10),
            controller.ensure_section_loaded(Section::Horror),
        )
        .await;
        assert!(cancelled.is_err());
        assert!(!controller.is_loading(Section::Horror));
        assert!(!controller.is_loaded(Section::Horror));

        assert_eq!(controller.ensure_section_loaded(Section::Horror).await, LoadOutcome::Loaded(1));
        assert_eq!(network.calls_for("/data/horror.json"), 2);
    }

    #[tokio::test]
    async fn test_missing_category_defaults_to_section() {
        let network = StubNetwork::new();
        network.respond(
            "/data/spotify.json",
            Response::ok_json(r#"[{"id":"a","title":"t","description":"d","locked":true,"accessUrl":"https://open.spotify.com/episode/a"}]"#),
        );
        let (controller, _) = controller_with(Arc::new(network));

        controller.ensure_section_loaded(Section::Spotify).await;

        let items = controller.section_items(Section::Spotify);
        assert_eq!(items[0].category, "spotify");
    }

    // -------------------------------------------------------------------------
    // Through the offline cache
    // -------------------------------------------------------------------------

    async fn installed_cache(network: Arc<StubNetwork>) -> Arc<OfflineCache> {
        let manifest = vec!["/".to_string(), "/data/horror.json".to_string()];
        let cache = OfflineCache::new("v1", manifest, network, Arc::new(MemoryStorage::new()))
            .expect("valid label");
        cache.register().await.expect("register");
        Arc::new(cache)
    }

    #[tokio::test]
    async fn test_cached_section_survives_network_failure() {
        let network = StubNetwork::new();
        network.respond("/", Response::new(200, "<html></html>"));
        network.respond("/data/horror.json", items_json(Section::Horror, 3));
        let network = Arc::new(network);
        let cache = installed_cache(network.clone()).await;

        network.fail("/data/horror.json", ApiError::Unreachable("offline".into()));
        let renderer = Arc::new(RecordingRenderer::new());
        let controller = ContentController::new(cache, renderer);

        assert_eq!(controller.ensure_section_loaded(Section::Horror).await, LoadOutcome::Loaded(3));
        assert_eq!(controller.section_items(Section::Horror)[0].id, "horror-0");
        // Only the install ever reached the network
        assert_eq!(network.calls_for("/data/horror.json"), 1);
    }

    #[tokio::test]
    async fn test_uncached_section_goes_to_network() {
        let network = StubNetwork::new();
        network.respond("/", Response::new(200, "<html></html>"));
        network.respond("/data/horror.json", items_json(Section::Horror, 3));
        network.respond("/data/mysterious.json", items_json(Section::Mysterious, 2));
        let network = Arc::new(network);
        let cache = installed_cache(network.clone()).await;

        let renderer = Arc::new(RecordingRenderer::new());
        let controller = ContentController::new(cache, renderer);

        assert_eq!(
            controller.ensure_section_loaded(Section::Mysterious).await,
            LoadOutcome::Loaded(2)
        );
        assert_eq!(network.calls_for("/data/mysterious.json"), 1);
    }

    // -------------------------------------------------------------------------
    // Unlock gate
    // -------------------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_grant_unlocks_then_reverts_after_duration() {
        let (controller, _) = controller_with(network_with_all_sections());
        let locked = fallback::items(Section::Spotify).remove(0);
        assert!(!controller.is_playable(&locked));

        controller.grant_unlock();
        assert!(controller.is_playable(&locked));

        tokio::time::sleep(GRANT_DURATION - StdDuration::from_millis(1)).await;
        assert!(controller.is_playable(&locked), "must not revert early");

        tokio::time::sleep(StdDuration::from_millis(2)).await;
        tokio::task::yield_now().await;
        assert!(!controller.is_playable(&locked));
        assert!(!controller.is_unlocked());
    }

    #[tokio::test(start_paused = true)]
    async fn test_regrant_supersedes_earlier_revert() {
        let (controller, _) = controller_with(network_with_all_sections());
        let ten_secs = StdDuration::from_secs(10);

        controller.grant_unlock();
        tokio::time::sleep(ten_secs).await;
        controller.grant_unlock();

        // t = duration + 1ms: the first grant's revert would have fired here
        tokio::time::sleep(GRANT_DURATION - ten_secs + StdDuration::from_millis(1)).await;
        tokio::task::yield_now().await;
        assert!(controller.is_unlocked());

        // t = 10s + duration + 2ms
        tokio::time::sleep(ten_secs + StdDuration::from_millis(1)).await;
        tokio::task::yield_now().await;
        assert!(!controller.is_unlocked());
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_changes_rerender_loaded_gated_section_only() {
        let network = network_with_all_sections();
        let (controller, renderer) = controller_with(network.clone());

        // Nothing loaded yet: grant has nothing to redraw
        controller.grant_unlock();
        assert!(!renderer.calls().iter().any(|c| matches!(c, RenderCall::Gate(..))));

        controller.ensure_section_loaded(Section::Spotify).await;
        controller.ensure_section_loaded(Section::Horror).await;
        controller.grant_unlock();
        assert_eq!(renderer.last(), Some(RenderCall::Gate(Section::Spotify, true)));

        tokio::time::sleep(GRANT_DURATION + StdDuration::from_millis(1)).await;
        tokio::task::yield_now().await;
        assert_eq!(renderer.last(), Some(RenderCall::Gate(Section::Spotify, false)));

        // Gate changes never trigger a fetch
        assert_eq!(network.calls_for("/data/spotify.json"), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_grants_keep_newest_revert() {
        let (controller, _) = controller_with(network_with_all_sections());
        let grants_per_task: u64 = 50;

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let controller = controller.clone();
                tokio::spawn(async move {
                    for _ in 0..grants_per_task {
                        controller.grant_unlock();
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        // The one revert left pending must belong to the last grant handed out
        let pending = controller.revert_task.lock().unwrap();
        let (generation, task) = pending.as_ref().expect("revert scheduled");
        assert_eq!(*generation, 8 * grants_per_task);
        assert!(!task.is_finished());
    }

    #[tokio::test]
    async fn test_unlock_remaining() {
        let (controller, _) = controller_with(network_with_all_sections());
        assert!(controller.unlock_remaining().is_none());

        controller.grant_unlock();
        let remaining = controller.unlock_remaining().expect("unlocked");
        assert!(remaining.num_minutes() >= 29 && remaining.num_minutes() <= 30);
    }
}
