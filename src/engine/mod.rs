//! Core engine — keeps computed ROI projections attached to the page.
//!
//! Sequences the pipeline: resolve page context → fetch provider data →
//! wait for the calls table → extract rows → compute scenarios → inject.
//! Consumes the watcher's event stream and decides, per event, between a
//! cheap re-injection of cached results and a full recomputation.
//!
//! Everything runs on one task; each suspension point re-validates the
//! page context before results are committed, so a late-arriving response
//! for one ticker can never overwrite a newer context.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::inject::Overlay;
use crate::page::dom::Dom;
use crate::page::{self, html, locator, HostPage, PageSnapshot};
use crate::provider::QuoteProvider;
use crate::roi::{self, dividends};
use crate::storage::SummaryStore;
use crate::types::{CallsightError, PageContext, ResultSet, StockSummary, Underlying};
use crate::watch::{self, Debouncer, LocatedTable, PageEvent, WatchSettings};

/// Shared read handle on the most recent result set (dashboard side).
pub type ResultsHandle = Arc<RwLock<Option<ResultSet>>>;

pub struct Engine {
    page: Arc<dyn HostPage>,
    provider: Arc<dyn QuoteProvider>,
    store: SummaryStore,
    settings: WatchSettings,
    overlay: Overlay,
    /// The owned document the current overlay lives in.
    dom: Option<Dom>,
    /// Context the cached results were computed for.
    context: Option<PageContext>,
    results: ResultsHandle,
    run_seq: u64,
}

impl Engine {
    pub fn new(
        page: Arc<dyn HostPage>,
        provider: Arc<dyn QuoteProvider>,
        store: SummaryStore,
        settings: WatchSettings,
    ) -> Self {
        Self {
            page,
            provider,
            store,
            settings,
            overlay: Overlay::new(),
            dom: None,
            context: None,
            results: Arc::new(RwLock::new(None)),
            run_seq: 0,
        }
    }

    /// Handle for read-only consumers of the latest result set.
    pub fn results_handle(&self) -> ResultsHandle {
        Arc::clone(&self.results)
    }

    pub fn context(&self) -> Option<&PageContext> {
        self.context.as_ref()
    }

    pub fn current_dom(&self) -> Option<&Dom> {
        self.dom.as_ref()
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    /// Drain the page event stream until it closes. Navigation runs
    /// immediately; mutation bursts settle through the debouncer first.
    /// A failed run is logged and previously injected UI persists.
    pub async fn run_events(&mut self, rx: &mut mpsc::Receiver<PageEvent>) {
        let mut debouncer =
            Debouncer::new(Duration::from_millis(self.settings.mutation_debounce_ms));

        loop {
            tokio::select! {
                maybe_event = rx.recv() => match maybe_event {
                    Some(PageEvent::Navigated(snapshot)) => {
                        if let Err(e) = self.refresh(snapshot, true).await {
                            warn!(error = %e, "Run failed — keeping previous state");
                        }
                    }
                    Some(PageEvent::Mutated(snapshot)) => debouncer.push(snapshot),
                    None => {
                        // Stream closed: flush any settled-but-unhandled
                        // mutation before winding down.
                        if let Some(snapshot) = debouncer.take() {
                            if let Err(e) = self.handle_mutation(snapshot).await {
                                warn!(error = %e, "Mutation handling failed");
                            }
                        }
                        break;
                    }
                },
                _ = debouncer.ready(), if debouncer.is_armed() => {
                    if let Some(snapshot) = debouncer.take() {
                        if let Err(e) = self.handle_mutation(snapshot).await {
                            warn!(error = %e, "Mutation handling failed");
                        }
                    }
                }
            }
        }
    }

    /// Full pass: recompute the result set from scratch and re-inject.
    ///
    /// Without `force`, an unchanged ticker/expiration context skips the
    /// run entirely.
    pub async fn refresh(&mut self, snapshot: PageSnapshot, force: bool) -> Result<()> {
        let ticker = page::ticker_from_path(&snapshot.path).ok_or_else(|| {
            CallsightError::TickerUndetectable {
                path: snapshot.path.clone(),
            }
        })?;
        let expiration = html::selected_expiration(&html::parse_document(&snapshot.html));
        let context = PageContext { ticker, expiration };

        if !force && self.context.as_ref() == Some(&context) {
            debug!(context = %context, "Context unchanged, skipping run");
            return Ok(());
        }

        self.run_seq += 1;
        let token = self.run_seq;
        info!(context = %context, run = token, "Starting run");

        // Both provider requests in flight at once, joined before use.
        let (profile, history) = tokio::join!(
            self.provider.profile(&context.ticker),
            self.provider.dividend_history(&context.ticker),
        );

        let annualized = dividends::annualized(&history);
        let summary = StockSummary {
            ticker: context.ticker.clone(),
            price: profile
                .as_ref()
                .and_then(|p| p.price)
                .filter(|p| p.is_finite()),
            dividend: annualized,
            frequency: dividends::frequency(&history),
            last_dividend: dividends::most_recent(&history),
            updated_at: Utc::now(),
        };
        if let Err(e) = self.store.save(&summary) {
            warn!(error = %e, "Failed to persist summary");
        }

        if !page::is_options_path(&snapshot.path) {
            debug!(path = %snapshot.path, "Not an options page — skipping injection");
            self.context = Some(context);
            return Ok(());
        }

        let located = watch::wait_for_table(
            self.page.as_ref(),
            self.settings.table_poll_attempts,
            Duration::from_millis(self.settings.table_poll_ms),
        )
        .await?;

        // The table may have arrived after the viewer moved on.
        if token != self.run_seq || !commit_allowed(&context, &located) {
            warn!(context = %context, "Context changed mid-run, discarding results");
            return Ok(());
        }

        let rows = page::extract::contract_rows(&located.dom, located.table);
        let underlying = Underlying {
            price: profile.as_ref().map(|p| p.price_or_zero()).unwrap_or(0.0),
            annualized_dividend: annualized,
        };
        let results = roi::project_rows(
            &rows,
            &underlying,
            &context.ticker,
            context.expiration.clone(),
        );
        info!(rows = results.len(), context = %context, "Computed result set");

        let mut dom = located.dom;
        if results.is_empty() {
            self.overlay.cleanup(&mut dom);
        } else {
            self.overlay
                .inject(&mut dom, located.table, &results, &context.ticker);
        }
        self.dom = Some(dom);
        *self.results.write().unwrap() = Some(results);
        self.context = Some(context);
        Ok(())
    }

    /// A settled mutation batch: relocate the table and decide between
    /// re-injecting cached results and recomputing.
    pub async fn handle_mutation(&mut self, snapshot: PageSnapshot) -> Result<()> {
        let mut dom = html::parse_document(&snapshot.html);

        // Expiration selection changes arrive as plain mutations.
        let expiration = html::selected_expiration(&dom);
        if let Some(context) = &self.context {
            if expiration != context.expiration {
                debug!(
                    old = context.expiration.as_deref().unwrap_or("-"),
                    new = expiration.as_deref().unwrap_or("-"),
                    "Expiration selection changed — recomputing"
                );
                return self.refresh(snapshot, true).await;
            }
        }

        let Some(table) = locator::find_calls_table(&dom) else {
            debug!("Mutation settled without a locatable calls table");
            return Ok(());
        };

        // Same element instance the overlay already lives in.
        if self.overlay.injected_table() == Some(table) {
            return Ok(());
        }

        let cached = self.results.read().unwrap().clone();
        match cached {
            Some(results) if !results.is_empty() => {
                let table_rows = dom.body_rows(table).len();
                if !results.matches_row_count(table_rows) {
                    warn!(
                        results = results.len(),
                        table_rows,
                        "Re-render changed the row count; cached results may be misaligned"
                    );
                }
                info!(ticker = %results.ticker, "Table replaced — re-injecting cached results");
                self.overlay
                    .inject(&mut dom, table, &results, &results.ticker);
                self.dom = Some(dom);
                Ok(())
            }
            _ => self.refresh(snapshot, true).await,
        }
    }
}

/// Whether the page, at table-location time, still shows the context the
/// run started for.
fn commit_allowed(context: &PageContext, located: &LocatedTable) -> bool {
    let current_ticker = page::ticker_from_path(&located.snapshot.path);
    let current_expiration = html::selected_expiration(&located.dom);
    current_ticker.as_deref() == Some(context.ticker.as_str())
        && current_expiration == context.expiration
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
