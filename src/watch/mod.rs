//! Change detection.
//!
//! The host page is a client-routed application that re-renders its
//! tables asynchronously and never announces changes, so everything here
//! is active observation: a snapshot poller that funnels address changes
//! and content mutations into one event stream, a debouncer that
//! coalesces mutation bursts, and a bounded wait for the calls table to
//! first appear.
//!
//! The `PageEvent` channel doubles as the subscription hook for
//! programmatic navigation: any adapter that *does* learn about changes
//! directly can push events into it alongside the poller.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::page::dom::{Dom, NodeId};
use crate::page::{html, locator, HostPage, PageSnapshot};
use crate::types::CallsightError;

// ---------------------------------------------------------------------------
// Events & configuration
// ---------------------------------------------------------------------------

/// A detected change on the host page.
#[derive(Debug, Clone)]
pub enum PageEvent {
    /// The address changed without a document load (client-side routing).
    Navigated(PageSnapshot),
    /// The page content changed under the same address.
    Mutated(PageSnapshot),
}

/// Watch cadences. Defaults mirror the host page's observed rendering
/// behavior: sub-second mutation churn, ~30s worst-case table readiness.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSettings {
    #[serde(default = "default_table_poll_attempts")]
    pub table_poll_attempts: u32,
    #[serde(default = "default_table_poll_ms")]
    pub table_poll_ms: u64,
    #[serde(default = "default_mutation_debounce_ms")]
    pub mutation_debounce_ms: u64,
    #[serde(default = "default_location_poll_ms")]
    pub location_poll_ms: u64,
}

fn default_table_poll_attempts() -> u32 {
    60
}
fn default_table_poll_ms() -> u64 {
    500
}
fn default_mutation_debounce_ms() -> u64 {
    150
}
fn default_location_poll_ms() -> u64 {
    600
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            table_poll_attempts: default_table_poll_attempts(),
            table_poll_ms: default_table_poll_ms(),
            mutation_debounce_ms: default_mutation_debounce_ms(),
            location_poll_ms: default_location_poll_ms(),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot poller
// ---------------------------------------------------------------------------

/// Poll the host page, emitting `Navigated` on address changes and
/// `Mutated` on content changes. The first successful poll is reported
/// as a navigation so the orchestrator runs once at startup. Fetch
/// failures are logged and skipped; the poller never dies of them.
pub fn spawn_page_poller(
    page: Arc<dyn HostPage>,
    poll_interval: Duration,
    tx: mpsc::Sender<PageEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_path: Option<String> = None;
        let mut last_hash: Option<u64> = None;
        let mut poll = tokio::time::interval(poll_interval);

        loop {
            poll.tick().await;

            let snapshot = match page.fetch().await {
                Ok(s) => s,
                Err(e) => {
                    warn!(page = page.name(), error = %e, "Page poll failed");
                    continue;
                }
            };

            let hash = content_hash(&snapshot.html);
            let path_changed = last_path.as_deref() != Some(snapshot.path.as_str());
            let content_changed = last_hash != Some(hash);
            last_path = Some(snapshot.path.clone());
            last_hash = Some(hash);

            let event = if path_changed {
                debug!(path = %snapshot.path, "Address changed");
                PageEvent::Navigated(snapshot)
            } else if content_changed {
                PageEvent::Mutated(snapshot)
            } else {
                continue;
            };

            if tx.send(event).await.is_err() {
                // Receiver dropped — the run is over.
                break;
            }
        }
    })
}

fn content_hash(html: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    html.hash(&mut hasher);
    hasher.finish()
}

// ---------------------------------------------------------------------------
// Debouncer
// ---------------------------------------------------------------------------

/// Coalesces mutation bursts: every push re-arms the timer, and the
/// latest snapshot wins once the page has been quiet for the window.
///
/// Designed for `tokio::select!`:
/// ```ignore
/// tokio::select! {
///     _ = debouncer.ready(), if debouncer.is_armed() => {
///         let snapshot = debouncer.take().unwrap();
///         // handle the settled mutation
///     }
///     // ... other branches push into the debouncer
/// }
/// ```
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
    pending: Option<PageSnapshot>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
            pending: None,
        }
    }

    /// Record a mutation and re-arm the quiet-period timer.
    pub fn push(&mut self, snapshot: PageSnapshot) {
        self.pending = Some(snapshot);
        self.deadline = Some(Instant::now() + self.window);
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolves once the quiet period has elapsed. Only sensible behind
    /// an `is_armed` guard; unarmed it pends forever.
    pub async fn ready(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    }

    /// Disarm and yield the coalesced snapshot.
    pub fn take(&mut self) -> Option<PageSnapshot> {
        self.deadline = None;
        self.pending.take()
    }
}

// ---------------------------------------------------------------------------
// Bounded table wait
// ---------------------------------------------------------------------------

/// A freshly located calls table together with the document it lives in.
#[derive(Debug)]
pub struct LocatedTable {
    pub dom: Dom,
    pub table: NodeId,
    pub snapshot: PageSnapshot,
}

/// Poll until the calls table first appears, up to `attempts` fetches
/// `delay` apart. Exhaustion reports `TableNotFound` — the caller ends
/// the run without touching previously injected UI.
pub async fn wait_for_table(
    page: &dyn HostPage,
    attempts: u32,
    delay: Duration,
) -> Result<LocatedTable, CallsightError> {
    for attempt in 0..attempts {
        if let Ok(snapshot) = page.fetch().await {
            let dom = html::parse_document(&snapshot.html);
            if let Some(table) = locator::find_calls_table(&dom) {
                return Ok(LocatedTable {
                    dom,
                    table,
                    snapshot,
                });
            }
        }
        if attempt % 6 == 0 {
            debug!(attempt, "Still waiting for calls table");
        }
        tokio::time::sleep(delay).await;
    }
    Err(CallsightError::TableNotFound { attempts })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
