//! Dashboard — Axum web server, the counterpart of the extension popup.
//!
//! Serves the persisted summary record and the latest ROI projections as
//! a REST API plus a self-contained HTML page. Strictly read-only: it
//! never drives the engine. CORS enabled for local development.

pub mod routes;

use anyhow::Result;
use axum::{
    http::{header, HeaderValue, Method},
    response::Html,
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::storage::SummaryStore;
use routes::AppState;

/// The embedded dashboard HTML (compiled into the binary).
const DASHBOARD_HTML: &str = include_str!("templates/index.html");

/// Start the dashboard web server plus the summary refresher.
///
/// Spawns background tasks — doesn't block. The refresher subscribes to
/// the store's update notifications and reloads the displayed record on
/// every broadcast, so the view follows runs in real time.
pub fn spawn_dashboard(state: AppState, store: SummaryStore, port: u16) -> Result<()> {
    let app = build_router(state.clone());

    tokio::spawn(async move {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
        info!(port, "Dashboard server starting on http://localhost:{port}");

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("Failed to bind dashboard port");

        axum::serve(listener, app)
            .await
            .expect("Dashboard server error");
    });

    tokio::spawn(async move {
        let mut updates = store.subscribe();
        while let Ok(update) = updates.recv().await {
            debug!(ticker = %update.ticker, "Summary update received");
            match store.load() {
                Ok(Some(summary)) => state.set_summary(summary),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Failed to reload summary"),
            }
        }
    });

    Ok(())
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin("*".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        // API routes
        .route("/api/summary", get(routes::get_summary))
        .route("/api/roi", get(routes::get_roi))
        .route("/api/roi/:row/:scenario", get(routes::get_roi_detail))
        .route("/health", get(routes::health))
        // Dashboard HTML
        .route("/", get(serve_dashboard))
        .layer(cors)
        .with_state(state)
}

/// Serve the embedded HTML dashboard.
async fn serve_dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
