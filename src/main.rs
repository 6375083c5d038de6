//! CALLSIGHT — Covered-Call ROI Overlay Agent
//!
//! Entry point. Loads configuration, initialises structured logging,
//! wires the host page, data provider, dashboard, and engine together,
//! and runs the watch loop with graceful shutdown.

use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

use callsight::config;
use callsight::dashboard;
use callsight::dashboard::routes::DashboardState;
use callsight::engine::Engine;
use callsight::page::live::LivePage;
use callsight::page::HostPage;
use callsight::provider::fmp::FmpClient;
use callsight::provider::QuoteProvider;
use callsight::storage::{SummaryHub, SummaryStore};
use callsight::watch;

const BANNER: &str = r#"
   ____    _    _     _     ____ ___ ____ _   _ _____
  / ___|  / \  | |   | |   / ___|_ _/ ___| | | |_   _|
 | |     / _ \ | |   | |   \___ \| | |  _| |_| | | |
 | |___ / ___ \| |___| |___ ___) | | |_| |  _  | | |
  \____/_/   \_\_____|_____|____/___\____|_| |_| |_|

  Covered-Call ROI Overlay
  v0.1.0 — Watch Agent
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = config::AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        agent_name = %cfg.agent.name,
        page_url = %cfg.page.url,
        location_poll_ms = cfg.watch.location_poll_ms,
        "CALLSIGHT starting up"
    );

    // -- Initialise components -------------------------------------------

    // Data provider (requests degrade to "no data" without a key)
    let api_key = config::AppConfig::resolve_env(&cfg.provider.api_key_env).unwrap_or_default();
    if api_key.is_empty() {
        warn!(
            env = %cfg.provider.api_key_env,
            "No provider API key configured — expect empty profile/dividend data"
        );
    }
    let provider: Arc<dyn QuoteProvider> = Arc::new(FmpClient::new(
        cfg.provider.base_url.clone(),
        SecretString::from(api_key),
    )?);

    // Host page
    let page: Arc<dyn HostPage> = Arc::new(LivePage::new(cfg.page.url.clone())?);

    // Summary store with update notifications
    let store = SummaryStore::new(cfg.storage.summary_path.clone(), SummaryHub::new());

    // Engine
    let mut engine = Engine::new(
        Arc::clone(&page),
        provider,
        store.clone(),
        cfg.watch.clone(),
    );

    // Dashboard (the popup-view counterpart)
    if cfg.dashboard.enabled {
        let state = Arc::new(DashboardState::new(
            store.load().unwrap_or(None),
            engine.results_handle(),
        ));
        dashboard::spawn_dashboard(state, store.clone(), cfg.dashboard.port)?;
    }

    // -- Watch loop --------------------------------------------------------

    let (tx, mut rx) = mpsc::channel(32);
    let poller = watch::spawn_page_poller(
        Arc::clone(&page),
        Duration::from_millis(cfg.watch.location_poll_ms),
        tx,
    );

    info!("Entering watch loop. Press Ctrl+C to stop.");

    tokio::select! {
        _ = engine.run_events(&mut rx) => {
            warn!("Page event stream closed");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received.");
        }
    }

    poller.abort();
    match engine.context() {
        Some(context) => info!(context = %context, "CALLSIGHT shut down cleanly."),
        None => info!("CALLSIGHT shut down cleanly."),
    }

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("callsight=info"));

    let json_logging = std::env::var("CALLSIGHT_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
