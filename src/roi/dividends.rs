//! Dividend annualization.
//!
//! The price/dividend provider returns raw payment history with no cadence
//! field, so the yearly dividend is inferred: classify the gap between the
//! two most recent payments, then scale the most recent payment by the
//! implied payments-per-year.

use crate::types::{DividendRecord, PayoutFrequency};

/// Infer the payment cadence from history (most recent first).
/// Fewer than two records defaults to annual.
pub fn frequency(records: &[DividendRecord]) -> PayoutFrequency {
    match records {
        [first, second, ..] => {
            let days = (first.date - second.date).num_days().abs();
            PayoutFrequency::from_gap_days(days)
        }
        _ => PayoutFrequency::Annual,
    }
}

/// Yearly dividend per share: most recent payment × inferred multiplier.
/// Empty or non-finite history degrades to 0.0.
pub fn annualized(records: &[DividendRecord]) -> f64 {
    let last = match most_recent(records) {
        Some(d) => d,
        None => return 0.0,
    };
    last * frequency(records).multiplier()
}

/// The most recent per-share payment, if any. Non-finite amounts are
/// treated as missing.
pub fn most_recent(records: &[DividendRecord]) -> Option<f64> {
    records
        .first()
        .map(|r| r.dividend)
        .filter(|d| d.is_finite())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
