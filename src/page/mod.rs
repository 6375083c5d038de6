//! Host page access.
//!
//! Defines the `HostPage` trait — the uncontrolled third-party page the
//! agent augments — plus the owned page model and the read heuristics
//! that operate on it:
//! - `dom` — arena document tree the overlay engine mutates
//! - `locator` — finds the "Calls" table among sibling tables
//! - `extract` — reads contract rows out of the located table
//! - `html` — scraper-backed adapter from third-party markup to the model
//! - `live` — reqwest implementation of `HostPage`

pub mod dom;
pub mod extract;
pub mod html;
pub mod live;
pub mod locator;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;

/// One observation of the host page: the current address path and the
/// rendered markup.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub path: String,
    pub html: String,
}

/// Abstraction over the uncontrolled host page.
///
/// The live implementation polls a quote page over HTTP; tests supply
/// scripted sequences of snapshots. The page never notifies of changes —
/// change detection is the watcher's job.
#[async_trait]
pub trait HostPage: Send + Sync {
    /// Fetch the current state of the page.
    async fn fetch(&self) -> Result<PageSnapshot>;

    /// Page source name for logging.
    fn name(&self) -> &str;
}

/// Extract the active ticker from an address path, e.g.
/// `/quote/AAPL/options` → `AAPL`. Uppercased. None when the path does
/// not match the quote layout.
pub fn ticker_from_path(path: &str) -> Option<String> {
    let re = Regex::new(r"/quote/([^/?#]+)").expect("static regex");
    re.captures(path)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_uppercase())
}

/// Whether the path points at an options chain page (the only place the
/// overlay is injected).
pub fn is_options_path(path: &str) -> bool {
    let re = Regex::new(r"/quote/[^/]+/options").expect("static regex");
    re.is_match(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
