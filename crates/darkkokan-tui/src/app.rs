//! Application state management for the Dark Kokan terminal front end.
//!
//! `App` owns UI state and the per-section views. Everything that happens in
//! the background (section loads, the offline cache lifecycle, gate changes)
//! reports back over one mpsc channel that is drained every tick.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use darkkokan_core::cache::{CacheError, OfflineCache, RegisterOutcome};
use darkkokan_core::{
    ApiError, Config, ContentController, ContentItem, Network, Renderer, RetryHandle, Section,
};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

// ============================================================================
// Constants
// ============================================================================

/// Length of the stub ad that must finish before audio is unlocked
pub const AD_DURATION_SECS: u64 = 5;

/// How long a status bar message stays visible
const STATUS_MESSAGE_SECS: u64 = 4;

/// Number of items to scroll on page up/down
pub const PAGE_SCROLL_SIZE: usize = 5;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    /// Player modal for `App::player`
    ShowingPlayer,
    /// Asking whether to watch an ad for `App::pending_unlock`
    ConfirmingUnlock,
    WatchingAd,
    ConfirmingQuit,
    Quitting,
}

/// What the main panel shows for one section
#[derive(Debug, Clone, Default)]
pub enum SectionView {
    #[default]
    Loading,
    Content(Vec<ContentItem>),
    Empty,
    Error { message: String, retry: RetryHandle },
}

/// Offline cache lifecycle as seen by the status bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    Pending,
    Ready,
    Failed(String),
}

// ============================================================================
// Background Events
// ============================================================================

/// Signals from the content controller, forwarded by `ChannelRenderer`
#[derive(Debug, Clone)]
pub enum RenderEvent {
    Loading(Section),
    Content(Section, Vec<ContentItem>),
    Empty(Section),
    Error {
        section: Section,
        message: String,
        retry: RetryHandle,
    },
    GateChanged {
        section: Section,
        items: Vec<ContentItem>,
        unlocked: bool,
    },
}

#[derive(Debug)]
pub enum AppEvent {
    Render(RenderEvent),
    CacheRegistered(Result<RegisterOutcome, CacheError>),
}

/// `Renderer` that hands every signal to the UI thread through a channel.
pub struct ChannelRenderer {
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl ChannelRenderer {
    pub fn new(tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: RenderEvent) {
        if self.tx.send(AppEvent::Render(event)).is_err() {
            debug!("UI channel closed, dropping render event");
        }
    }
}

impl Renderer for ChannelRenderer {
    fn show_loading(&self, section: Section) {
        self.send(RenderEvent::Loading(section));
    }

    fn show_content(&self, section: Section, items: &[ContentItem]) {
        self.send(RenderEvent::Content(section, items.to_vec()));
    }

    fn show_empty(&self, section: Section) {
        self.send(RenderEvent::Empty(section));
    }

    fn show_error(&self, section: Section, error: &ApiError, retry: RetryHandle) {
        self.send(RenderEvent::Error {
            section,
            message: error.to_string(),
            retry,
        });
    }

    fn gate_changed(&self, section: Section, items: &[ContentItem], unlocked: bool) {
        self.send(RenderEvent::GateChanged {
            section,
            items: items.to_vec(),
            unlocked,
        });
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub config: Config,
    pub cache: Arc<OfflineCache>,
    pub controller: Arc<ContentController>,

    // UI State
    pub state: AppState,
    pub current_section: Section,
    pub views: HashMap<Section, SectionView>,
    selections: HashMap<Section, usize>,

    /// Item open in the player modal
    pub player: Option<ContentItem>,
    /// Locked item the user asked to play
    pub pending_unlock: Option<ContentItem>,
    ad_started_at: Option<Instant>,

    pub cache_status: CacheStatus,
    /// Last gate state seen, to notice expiry
    unlocked: bool,

    // Status message
    pub status_message: Option<String>,
    status_set_at: Option<Instant>,

    // Background event channel
    event_rx: mpsc::UnboundedReceiver<AppEvent>,
    event_tx: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(config: Config, cache: Arc<OfflineCache>, initial_section: Section) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let renderer = Arc::new(ChannelRenderer::new(event_tx.clone()));
        let network: Arc<dyn Network> = cache.clone();
        let controller = ContentController::new(network, renderer);

        Self {
            config,
            cache,
            controller,
            state: AppState::Normal,
            current_section: initial_section,
            views: Section::ALL
                .into_iter()
                .map(|section| (section, SectionView::default()))
                .collect(),
            selections: HashMap::new(),
            player: None,
            pending_unlock: None,
            ad_started_at: None,
            cache_status: CacheStatus::Pending,
            unlocked: false,
            status_message: None,
            status_set_at: None,
            event_rx,
            event_tx,
        }
    }

    /// Kick off the offline cache lifecycle and the first section load.
    ///
    /// Whatever is already cached starts serving before any load is spawned,
    /// so an offline start shows cached sections rather than fallbacks.
    pub fn start(&mut self) {
        match self.cache.resume() {
            Ok(Some(label)) => info!(label = %label, "Serving offline cache from disk"),
            Ok(None) => debug!("No offline cache on disk yet"),
            Err(e) => warn!(error = %e, "Failed to resume offline cache"),
        }

        let cache = self.cache.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = cache.register().await;
            let _ = tx.send(AppEvent::CacheRegistered(result));
        });

        self.load_current_section();
    }

    // =========================================================================
    // Sections
    // =========================================================================

    pub fn view(&self, section: Section) -> &SectionView {
        &self.views[&section]
    }

    pub fn current_view(&self) -> &SectionView {
        self.view(self.current_section)
    }

    pub fn current_items(&self) -> &[ContentItem] {
        match self.current_view() {
            SectionView::Content(items) => items,
            _ => &[],
        }
    }

    pub fn selection(&self) -> usize {
        self.selections
            .get(&self.current_section)
            .copied()
            .unwrap_or(0)
    }

    pub fn selected_item(&self) -> Option<&ContentItem> {
        self.current_items().get(self.selection())
    }

    pub fn select_section(&mut self, section: Section) {
        if section == self.current_section {
            return;
        }
        debug!(section = %section, "Switching section");
        self.current_section = section;
        self.config.last_section = Some(section);
        self.load_current_section();
    }

    /// Spawn a load for the current section unless it is already loaded.
    /// Repeat calls while a load is in flight are absorbed by the controller.
    fn load_current_section(&self) {
        let section = self.current_section;
        if self.controller.is_loaded(section) {
            return;
        }
        let controller = self.controller.clone();
        tokio::spawn(async move {
            let outcome = controller.ensure_section_loaded(section).await;
            debug!(section = %section, ?outcome, "Section load finished");
        });
    }

    /// Retry the current section if it is showing an error
    pub fn retry_current(&mut self) {
        let retry = match self.current_view() {
            SectionView::Error { retry, .. } => retry.clone(),
            _ => return,
        };
        info!(section = %retry.section(), "Retrying section");
        tokio::spawn(async move {
            retry.retry().await;
        });
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.current_items().len();
        if len == 0 {
            return;
        }
        let current = self.selection() as isize;
        let next = (current + delta).clamp(0, len as isize - 1) as usize;
        self.selections.insert(self.current_section, next);
    }

    // =========================================================================
    // Player and unlock flow
    // =========================================================================

    /// Open the selected item, or ask to unlock it if it is locked
    pub fn activate_selected(&mut self) {
        let Some(item) = self.selected_item().cloned() else {
            return;
        };
        if self.controller.is_playable(&item) {
            debug!(id = %item.id, "Opening player");
            self.player = Some(item);
            self.state = AppState::ShowingPlayer;
        } else {
            debug!(id = %item.id, "Item locked, prompting for unlock");
            self.pending_unlock = Some(item);
            self.state = AppState::ConfirmingUnlock;
        }
    }

    pub fn close_player(&mut self) {
        self.player = None;
        self.state = AppState::Normal;
    }

    pub fn start_ad(&mut self) {
        info!("Starting unlock ad");
        self.ad_started_at = Some(Instant::now());
        self.state = AppState::WatchingAd;
    }

    pub fn cancel_unlock(&mut self) {
        self.ad_started_at = None;
        self.pending_unlock = None;
        self.state = AppState::Normal;
    }

    /// Seconds left on the stub ad, if one is playing
    pub fn ad_remaining_secs(&self) -> Option<u64> {
        let started = self.ad_started_at?;
        let total = Duration::from_secs(AD_DURATION_SECS);
        let remaining = total.saturating_sub(started.elapsed());
        Some(remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0))
    }

    fn update_ad_countdown(&mut self) {
        let Some(started) = self.ad_started_at else {
            return;
        };
        if started.elapsed() < Duration::from_secs(AD_DURATION_SECS) {
            return;
        }

        self.ad_started_at = None;
        self.controller.grant_unlock();
        self.unlocked = true;

        let minutes = darkkokan_core::content::GRANT_DURATION.as_secs() / 60;
        self.set_status(format!("Audio stories unlocked for {} minutes", minutes));

        match self.pending_unlock.take() {
            Some(item) if self.controller.is_playable(&item) => {
                self.player = Some(item);
                self.state = AppState::ShowingPlayer;
            }
            _ => self.state = AppState::Normal,
        }
    }

    fn update_gate(&mut self) {
        let unlocked = self.controller.is_unlocked();
        if self.unlocked && !unlocked {
            info!("Audio unlock expired");
            self.set_status("Audio unlock expired. Watch another ad to listen.".to_string());
        }
        self.unlocked = unlocked;
    }

    // =========================================================================
    // Preferences
    // =========================================================================

    pub fn toggle_theme(&mut self) {
        self.config.theme = self.config.theme.toggle();
        self.persist_config();
        self.set_status(format!("Switched to {} theme", self.config.theme.label()));
    }

    pub fn persist_config(&self) {
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }

    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
        self.status_set_at = Some(Instant::now());
    }

    fn expire_status(&mut self) {
        if let Some(set_at) = self.status_set_at {
            if set_at.elapsed() >= Duration::from_secs(STATUS_MESSAGE_SECS) {
                self.status_message = None;
                self.status_set_at = None;
            }
        }
    }

    // =========================================================================
    // Background events
    // =========================================================================

    /// Drain the event channel and advance timers. Called once per tick.
    pub fn check_background_tasks(&mut self) {
        let mut events = Vec::new();
        while let Ok(event) = self.event_rx.try_recv() {
            events.push(event);
        }
        for event in events {
            self.process_event(event);
        }

        self.update_ad_countdown();
        self.update_gate();
        self.expire_status();
    }

    fn process_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Render(event) => self.process_render_event(event),
            AppEvent::CacheRegistered(Ok(outcome)) => {
                info!(?outcome, "Offline cache ready");
                self.cache_status = CacheStatus::Ready;
            }
            AppEvent::CacheRegistered(Err(e)) => {
                warn!(error = %e, "Offline cache install failed");
                self.cache_status = CacheStatus::Failed(e.to_string());
            }
        }
    }

    fn process_render_event(&mut self, event: RenderEvent) {
        match event {
            RenderEvent::Loading(section) => {
                self.views.insert(section, SectionView::Loading);
            }
            RenderEvent::Content(section, items)
            | RenderEvent::GateChanged { section, items, .. } => {
                let len = items.len();
                self.views.insert(section, SectionView::Content(items));
                if let Some(selection) = self.selections.get_mut(&section) {
                    *selection = (*selection).min(len.saturating_sub(1));
                }
            }
            RenderEvent::Empty(section) => {
                self.views.insert(section, SectionView::Empty);
            }
            RenderEvent::Error {
                section,
                message,
                retry,
            } => {
                self.views.insert(section, SectionView::Error { message, retry });
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
