//! Dark Kokan - a terminal catalog of horror and mystery stories.
//!
//! Browses three story sections, keeps a versioned offline cache of the
//! site's resources, and gates audio stories behind a short timed unlock.

mod app;
mod ui;
mod utils;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use darkkokan_core::cache::RegisterOutcome;
use darkkokan_core::{ApiClient, Config, DiskStorage, Network, OfflineCache, Section};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file prefix inside `<cache_dir>/logs`
const LOG_FILE_PREFIX: &str = "darkkokan.log";

/// Parsed command line flags
#[derive(Debug, Default, PartialEq, Eq)]
struct CliArgs {
    section: Option<Section>,
    install_only: bool,
}

impl CliArgs {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--install-only" => parsed.install_only = true,
                "--section" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow::anyhow!("--section needs a value"))?;
                    parsed.section = Some(value.parse()?);
                }
                other => anyhow::bail!("Unknown argument: {}", other),
            }
        }
        Ok(parsed)
    }
}

/// Initialize the tracing subscriber for logging.
///
/// The terminal is in raw mode while the app runs, so logs go to a daily
/// rolling file. Use RUST_LOG to control the level (e.g. RUST_LOG=debug).
fn init_tracing(log_dir: &Path) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    guard
}

fn load_config() -> Config {
    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config ({:#}), using defaults", e);
            Config::default()
        }
    };
    config.apply_env_overrides();
    config
}

fn build_cache(config: &Config, cache_dir: PathBuf) -> Result<Arc<OfflineCache>> {
    let api: Arc<dyn Network> = Arc::new(ApiClient::new(&config.base_url)?);
    let storage = Arc::new(DiskStorage::new(cache_dir)?);
    let cache = OfflineCache::new(
        config.cache_version.clone(),
        config.manifest.clone(),
        api,
        storage,
    )?;
    Ok(Arc::new(cache))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = CliArgs::parse(std::env::args().skip(1))?;
    let config = load_config();

    let cache_dir = config
        .cache_dir()
        .unwrap_or_else(|_| PathBuf::from("./cache"));
    let _log_guard = init_tracing(&cache_dir.join("logs"));
    info!(base_url = %config.base_url, version = %config.cache_version, "Dark Kokan starting");

    let cache = build_cache(&config, cache_dir).context("Failed to set up offline cache")?;

    if args.install_only {
        return install_only(&cache).await;
    }

    let initial_section = args
        .section
        .or(config.last_section)
        .unwrap_or_default();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, cache, initial_section);
    app.start();

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    app.persist_config();

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("Dark Kokan shutting down");
    Ok(())
}

/// Run the offline cache lifecycle once and print what happened
async fn install_only(cache: &OfflineCache) -> Result<()> {
    eprintln!(
        "Installing offline cache {} ({} resources)...",
        cache.version(),
        cache.manifest().len()
    );

    match cache.register().await {
        Ok(RegisterOutcome::Installed(report)) => {
            println!("Installed offline cache {}", cache.version());
            if !report.removed.is_empty() {
                println!("Removed old caches: {}", report.removed.join(", "));
            }
            if !report.failed.is_empty() {
                println!("Could not remove: {}", report.failed.join(", "));
            }
            Ok(())
        }
        Ok(RegisterOutcome::AlreadyInstalled(_)) => {
            println!("Offline cache {} is already installed", cache.version());
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Offline cache install failed");
            if let Some(previous) = cache.serving_version() {
                eprintln!("Install failed; offline cache {} is still serving", previous);
            }
            Err(e).context("Offline cache install failed")
        }
    }
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        // Drain background results and advance timers
        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
