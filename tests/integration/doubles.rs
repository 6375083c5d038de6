//! Deterministic doubles for integration testing.
//!
//! Provides a scripted `HostPage` (a queue of snapshots, repeating the
//! last once drained) and an in-memory `QuoteProvider` with per-ticker
//! data and call counting — all fully controllable from test code.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use callsight::page::{HostPage, PageSnapshot};
use callsight::provider::{CompanyProfile, QuoteProvider};
use callsight::storage::{SummaryHub, SummaryStore};
use callsight::types::DividendRecord;

// ---------------------------------------------------------------------------
// Page double
// ---------------------------------------------------------------------------

/// A host page that serves a scripted sequence of snapshots.
pub struct ScriptedPage {
    states: Mutex<VecDeque<PageSnapshot>>,
    last: Mutex<Option<PageSnapshot>>,
}

impl ScriptedPage {
    pub fn new(states: Vec<PageSnapshot>) -> Self {
        Self {
            states: Mutex::new(states.into()),
            last: Mutex::new(None),
        }
    }

    /// Serve the same snapshot forever.
    pub fn repeating(snapshot: PageSnapshot) -> Self {
        Self {
            states: Mutex::new(VecDeque::new()),
            last: Mutex::new(Some(snapshot)),
        }
    }
}

#[async_trait]
impl HostPage for ScriptedPage {
    async fn fetch(&self) -> Result<PageSnapshot> {
        let mut states = self.states.lock().unwrap();
        if let Some(next) = states.pop_front() {
            *self.last.lock().unwrap() = Some(next.clone());
            return Ok(next);
        }
        self.last
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow!("no snapshot scripted"))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn snapshot(path: &str, html: impl Into<String>) -> PageSnapshot {
    PageSnapshot {
        path: path.to_string(),
        html: html.into(),
    }
}

/// An options page for one ticker with the standard column layout.
pub fn options_page(heading: &str, expiration: &str, body_rows: &[(&str, f64, f64, f64)]) -> String {
    let rows: String = body_rows
        .iter()
        .map(|(name, strike, bid, ask)| {
            format!(
                "<tr><td>{name}</td><td>10:15</td><td>{strike:.2}</td>\
                 <td>-</td><td>{bid:.2}</td><td>{ask:.2}</td><td>+0.5%</td></tr>"
            )
        })
        .collect();
    format!(
        r#"<body>
          <select name="expirationDate">
            <option value="{expiration}" selected>{expiration}</option>
          </select>
          <section><h3>{heading}</h3><table>
            <thead><tr>
              <th>Contract Name</th><th>Last Trade</th><th>Strike</th>
              <th>Last Price</th><th>Bid</th><th>Ask</th><th>% Change</th>
            </tr></thead>
            <tbody>{rows}</tbody>
          </table></section>
        </body>"#
    )
}

// ---------------------------------------------------------------------------
// Provider double
// ---------------------------------------------------------------------------

/// An in-memory provider with per-ticker prices and quarterly dividend
/// history. Tracks how many profile fetches each ticker received.
pub struct StaticProvider {
    prices: HashMap<String, f64>,
    dividend: f64,
    calls: Arc<Mutex<Vec<String>>>,
}

impl StaticProvider {
    pub fn new(prices: &[(&str, f64)], dividend: f64) -> Self {
        Self {
            prices: prices
                .iter()
                .map(|(t, p)| (t.to_string(), *p))
                .collect(),
            dividend,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Tickers the provider was asked to profile, in order.
    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl QuoteProvider for StaticProvider {
    async fn profile(&self, ticker: &str) -> Option<CompanyProfile> {
        self.calls.lock().unwrap().push(ticker.to_string());
        self.prices.get(ticker).map(|&price| CompanyProfile {
            symbol: Some(ticker.to_string()),
            company_name: None,
            price: Some(price),
        })
    }

    async fn dividend_history(&self, _ticker: &str) -> Vec<DividendRecord> {
        // Two payments 91 days apart: quarterly cadence.
        vec![
            DividendRecord {
                date: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
                dividend: self.dividend,
            },
            DividendRecord {
                date: NaiveDate::from_ymd_opt(2025, 3, 16).unwrap(),
                dividend: self.dividend,
            },
        ]
    }

    fn name(&self) -> &str {
        "static"
    }
}

// ---------------------------------------------------------------------------
// Storage helper
// ---------------------------------------------------------------------------

/// A summary store backed by a unique temp file.
pub fn temp_store() -> (SummaryStore, String) {
    let mut p = std::env::temp_dir();
    p.push(format!("callsight_it_{}.json", uuid::Uuid::new_v4()));
    let path = p.to_string_lossy().to_string();
    (
        SummaryStore::new(Some(path.clone()), SummaryHub::new()),
        path,
    )
}
