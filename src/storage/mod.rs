//! Persistence layer.
//!
//! Saves and loads the per-ticker summary record to/from a JSON file —
//! overwritten on every successful run, read-only everywhere else — and
//! broadcasts a notification after each save so the dashboard view can
//! refresh without polling the disk.

use anyhow::{Context, Result};
use std::path::Path;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::types::StockSummary;

/// Default summary file path.
const DEFAULT_SUMMARY_FILE: &str = "callsight_summary.json";

/// Save the summary record to a JSON file.
pub fn save_summary(summary: &StockSummary, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_SUMMARY_FILE);
    let json = serde_json::to_string_pretty(summary)
        .context("Failed to serialise stock summary")?;

    std::fs::write(path, &json)
        .context(format!("Failed to write summary to {path}"))?;

    debug!(path, ticker = %summary.ticker, "Summary saved");
    Ok(())
}

/// Load the summary record from a JSON file.
/// Returns None if the file doesn't exist (no run has completed yet).
pub fn load_summary(path: Option<&str>) -> Result<Option<StockSummary>> {
    let path = path.unwrap_or(DEFAULT_SUMMARY_FILE);

    if !Path::new(path).exists() {
        debug!(path, "No saved summary found");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)
        .context(format!("Failed to read summary from {path}"))?;

    let summary: StockSummary = serde_json::from_str(&json)
        .context(format!("Failed to parse summary from {path}"))?;

    Ok(Some(summary))
}

/// Delete the summary file (for testing or reset).
pub fn delete_summary(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_SUMMARY_FILE);
    if Path::new(path).exists() {
        std::fs::remove_file(path)
            .context(format!("Failed to delete summary file {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Update notifications
// ---------------------------------------------------------------------------

/// Broadcast payload announcing a fresh summary.
#[derive(Debug, Clone)]
pub struct SummaryUpdate {
    pub ticker: String,
}

/// Fan-out hub for "summary changed" notifications. Cheap to clone;
/// lagging or absent listeners never block a save.
#[derive(Debug, Clone)]
pub struct SummaryHub {
    tx: broadcast::Sender<SummaryUpdate>,
}

impl SummaryHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SummaryUpdate> {
        self.tx.subscribe()
    }

    pub fn notify(&self, ticker: &str) {
        // Err just means nobody is listening right now.
        let _ = self.tx.send(SummaryUpdate {
            ticker: ticker.to_string(),
        });
    }
}

impl Default for SummaryHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary persistence plus notification, as one handle the engine owns.
#[derive(Debug, Clone)]
pub struct SummaryStore {
    path: Option<String>,
    hub: SummaryHub,
}

impl SummaryStore {
    pub fn new(path: Option<String>, hub: SummaryHub) -> Self {
        Self { path, hub }
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Subscribe to "summary changed" notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SummaryUpdate> {
        self.hub.subscribe()
    }

    /// Overwrite the record and announce the change.
    pub fn save(&self, summary: &StockSummary) -> Result<()> {
        save_summary(summary, self.path.as_deref())?;
        self.hub.notify(&summary.ticker);
        info!(summary = %summary, "Summary updated");
        Ok(())
    }

    pub fn load(&self) -> Result<Option<StockSummary>> {
        load_summary(self.path.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PayoutFrequency;
    use chrono::Utc;

    fn temp_path() -> String {
        let mut p = std::env::temp_dir();
        p.push(format!("callsight_test_summary_{}.json", uuid::Uuid::new_v4()));
        p.to_string_lossy().to_string()
    }

    fn sample_summary() -> StockSummary {
        StockSummary {
            ticker: "KO".to_string(),
            price: Some(62.5),
            dividend: 2.04,
            frequency: PayoutFrequency::Quarterly,
            last_dividend: Some(0.51),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path();
        save_summary(&sample_summary(), Some(&path)).unwrap();

        let loaded = load_summary(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.ticker, "KO");
        assert_eq!(loaded.frequency, PayoutFrequency::Quarterly);
        assert_eq!(loaded.last_dividend, Some(0.51));

        delete_summary(Some(&path)).unwrap();
    }

    #[test]
    fn test_load_nonexistent() {
        let loaded = load_summary(Some("/tmp/callsight_nonexistent_98765.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_overwrites() {
        let path = temp_path();
        save_summary(&sample_summary(), Some(&path)).unwrap();

        let mut replacement = sample_summary();
        replacement.ticker = "PEP".to_string();
        replacement.price = Some(171.0);
        save_summary(&replacement, Some(&path)).unwrap();

        let loaded = load_summary(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.ticker, "PEP");

        delete_summary(Some(&path)).unwrap();
    }

    #[test]
    fn test_delete_nonexistent_ok() {
        assert!(delete_summary(Some("/tmp/callsight_does_not_exist_xyz.json")).is_ok());
    }

    #[tokio::test]
    async fn test_store_save_notifies_subscribers() {
        let path = temp_path();
        let hub = SummaryHub::new();
        let mut rx = hub.subscribe();
        let store = SummaryStore::new(Some(path.clone()), hub);

        store.save(&sample_summary()).unwrap();

        let update = rx.recv().await.unwrap();
        assert_eq!(update.ticker, "KO");

        delete_summary(Some(&path)).unwrap();
    }

    #[test]
    fn test_notify_without_subscribers_is_fine() {
        let hub = SummaryHub::new();
        hub.notify("AAPL");
    }
}
