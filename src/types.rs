//! Shared types for the CALLSIGHT agent.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that page, roi, and engine
//! modules can depend on them without circular references.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Price movement
// ---------------------------------------------------------------------------

/// One of the three fixed price-movement cases a covered-call position is
/// projected under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Movement {
    Down10,
    Flat,
    Up10,
}

impl Movement {
    /// The fixed evaluation order: −10%, 0%, +10%.
    pub const ALL: [Movement; 3] = [Movement::Down10, Movement::Flat, Movement::Up10];

    /// Fractional price offset applied to the underlying.
    pub fn offset(&self) -> f64 {
        match self {
            Movement::Down10 => -0.10,
            Movement::Flat => 0.00,
            Movement::Up10 => 0.10,
        }
    }

    /// Short label used in column headers and the detail view.
    pub fn label(&self) -> &'static str {
        match self {
            Movement::Down10 => "-10%",
            Movement::Flat => "0%",
            Movement::Up10 => "+10%",
        }
    }
}

impl fmt::Display for Movement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Contract row & underlying
// ---------------------------------------------------------------------------

/// One option contract as read out of the calls table.
///
/// Identity is positional: row `i` of the freshly located table corresponds
/// to result `i`. The contract name is carried for diagnostics only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractRow {
    /// Position within the table body at extraction time.
    pub index: usize,
    pub contract_name: String,
    pub strike: f64,
    pub bid: f64,
    pub ask: f64,
}

impl ContractRow {
    /// Mid of bid/ask, the premium received for writing one contract.
    /// Falls back to 0.0 when the mid is not a finite number.
    pub fn call_premium(&self) -> f64 {
        let mid = (self.bid + self.ask) / 2.0;
        if mid.is_finite() {
            mid
        } else {
            0.0
        }
    }
}

impl fmt::Display for ContractRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} strike=${:.2} bid=${:.2} ask=${:.2}",
            self.index, self.contract_name, self.strike, self.bid, self.ask,
        )
    }
}

/// Per-ticker market data, refreshed on every run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Underlying {
    /// Current share price; 0.0 when unavailable.
    pub price: f64,
    /// Yearly dividend per share inferred from payment history.
    pub annualized_dividend: f64,
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

/// Whether the projected price puts the contract in called-away territory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallAway {
    /// Projection exceeded the strike; upside capped.
    Capped,
    /// Projection landed exactly on the strike.
    AtStrike,
    /// Shares keep the full projected move.
    NotCalled,
}

impl fmt::Display for CallAway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallAway::Capped => write!(f, "Called away, capped at strike"),
            CallAway::AtStrike => write!(f, "Called away, at strike"),
            CallAway::NotCalled => write!(f, "Not called away"),
        }
    }
}

/// ROI projection for one contract under one price movement.
///
/// All dollar components are for a 100-share covered lot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Scenario {
    pub movement: Movement,
    pub strike: f64,
    /// Projected share price, capped at the strike when the raw projection
    /// would exceed it.
    pub end_price: f64,
    pub stock_movement: f64,
    pub call_option_income: f64,
    pub dividend_yield: f64,
    pub cost_basis: f64,
    /// 0.0 whenever the computation is not finite (e.g. zero cost basis).
    pub roi_percent: f64,
}

impl Scenario {
    /// The uncapped projected price for this movement.
    pub fn projected_price(&self) -> f64 {
        (self.cost_basis / 100.0) * (1.0 + self.movement.offset())
    }

    /// Called-away status, derived from the raw projection vs the strike.
    pub fn called_away(&self) -> CallAway {
        let projected = self.projected_price();
        if projected > self.strike {
            CallAway::Capped
        } else if projected == self.strike {
            CallAway::AtStrike
        } else {
            CallAway::NotCalled
        }
    }

    /// Share price net of the premium received.
    pub fn net_entry_price(&self) -> f64 {
        (self.cost_basis / 100.0) - (self.call_option_income / 100.0)
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ strike ${:.2}: roi={:.2}% (div=${:.2} move=${:.2} call=${:.2} basis=${:.2})",
            self.movement,
            self.strike,
            self.roi_percent,
            self.dividend_yield,
            self.stock_movement,
            self.call_option_income,
            self.cost_basis,
        )
    }
}

// ---------------------------------------------------------------------------
// Result set
// ---------------------------------------------------------------------------

/// Scenario triple for one table row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowProjection {
    pub contract_name: String,
    pub scenarios: [Scenario; 3],
}

/// Ordered per-row projections, positionally aligned with the table they
/// were computed from. Recomputed on every context change, never merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSet {
    pub ticker: String,
    pub expiration: Option<String>,
    pub rows: Vec<RowProjection>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether this set is still positionally sound for a table with
    /// `row_count` body rows.
    pub fn matches_row_count(&self, row_count: usize) -> bool {
        self.rows.len() == row_count
    }
}

impl fmt::Display for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {} rows",
            self.ticker,
            self.expiration.as_deref().unwrap_or("no expiration"),
            self.rows.len(),
        )
    }
}

// ---------------------------------------------------------------------------
// Dividends
// ---------------------------------------------------------------------------

/// One historical dividend payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DividendRecord {
    pub date: NaiveDate,
    pub dividend: f64,
}

/// Payment cadence inferred from the spacing of the two most recent
/// payments. The data source exposes no explicit cadence, so this is a
/// heuristic and not guaranteed accurate for irregular payers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayoutFrequency {
    Annual,
    Biannual,
    Quarterly,
    Monthly,
}

impl PayoutFrequency {
    /// Classify from the day gap between the two most recent payments.
    pub fn from_gap_days(days: i64) -> Self {
        if days > 340 {
            PayoutFrequency::Annual
        } else if days > 160 {
            PayoutFrequency::Biannual
        } else if days > 60 {
            PayoutFrequency::Quarterly
        } else if days > 20 {
            PayoutFrequency::Monthly
        } else {
            PayoutFrequency::Annual
        }
    }

    /// Payments per year.
    pub fn multiplier(&self) -> f64 {
        match self {
            PayoutFrequency::Annual => 1.0,
            PayoutFrequency::Biannual => 2.0,
            PayoutFrequency::Quarterly => 4.0,
            PayoutFrequency::Monthly => 12.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PayoutFrequency::Annual => "annual",
            PayoutFrequency::Biannual => "biannual",
            PayoutFrequency::Quarterly => "quarterly",
            PayoutFrequency::Monthly => "monthly",
        }
    }
}

impl fmt::Display for PayoutFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Summary record & page context
// ---------------------------------------------------------------------------

/// The persisted per-ticker summary, overwritten on every successful run
/// and displayed read-only by the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockSummary {
    pub ticker: String,
    pub price: Option<f64>,
    /// Annualized dividend per share.
    pub dividend: f64,
    pub frequency: PayoutFrequency,
    pub last_dividend: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Display for StockSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.price {
            Some(p) => write!(
                f,
                "{} ${:.2} | dividend ${:.2}/yr ({})",
                self.ticker, p, self.dividend, self.frequency,
            ),
            None => write!(
                f,
                "{} (no price) | dividend ${:.2}/yr ({})",
                self.ticker, self.dividend, self.frequency,
            ),
        }
    }
}

/// The navigation context a run is computed for: active ticker plus the
/// selected contract expiration. A change to either invalidates cached
/// results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContext {
    pub ticker: String,
    pub expiration: Option<String>,
}

impl fmt::Display for PageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {}",
            self.ticker,
            self.expiration.as_deref().unwrap_or("-"),
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for CALLSIGHT.
#[derive(Debug, thiserror::Error)]
pub enum CallsightError {
    #[error("Provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    #[error("Calls table not found after {attempts} attempts")]
    TableNotFound { attempts: u32 },

    #[error("Ticker not detectable from path: {path}")]
    TickerUndetectable { path: String },

    #[error("Page error: {0}")]
    Page(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
