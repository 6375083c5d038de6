//! Covered-call ROI projections.
//!
//! Pure calculation module: maps one contract's market data to the three
//! fixed price-movement scenarios, with upside capped at the strike when
//! the contract would be called away. No I/O, no side effects.

pub mod dividends;

use crate::types::{ContractRow, Movement, ResultSet, RowProjection, Scenario, Underlying};

/// Compute the three ROI scenarios for a single contract.
///
/// Total for any finite inputs: zero or negative prices never panic, they
/// degrade to a `roi_percent` of 0.0 wherever the division is unsafe.
pub fn compute_scenarios(
    price: f64,
    call_premium: f64,
    annualized_dividend: f64,
    strike: f64,
) -> [Scenario; 3] {
    Movement::ALL.map(|movement| {
        let projected = price * (1.0 + movement.offset());
        // The holder cannot participate in upside beyond the strike.
        let end_price = if projected > strike { strike } else { projected };

        let stock_movement = (end_price - price) * 100.0;
        let call_option_income = call_premium * 100.0;
        let dividend_yield = annualized_dividend * 100.0;
        let cost_basis = price * 100.0;

        let roi = 100.0 * (dividend_yield + stock_movement + call_option_income) / cost_basis;
        let roi_percent = if roi.is_finite() { roi } else { 0.0 };

        Scenario {
            movement,
            strike,
            end_price,
            stock_movement,
            call_option_income,
            dividend_yield,
            cost_basis,
            roi_percent,
        }
    })
}

/// Project a whole batch of extracted rows against the underlying.
///
/// One entry per input row, in input order. A row with unparseable quotes
/// (zeros) still produces an entry; it never aborts the batch.
pub fn project_rows(
    rows: &[ContractRow],
    underlying: &Underlying,
    ticker: &str,
    expiration: Option<String>,
) -> ResultSet {
    let projections = rows
        .iter()
        .map(|row| RowProjection {
            contract_name: row.contract_name.clone(),
            scenarios: compute_scenarios(
                underlying.price,
                row.call_premium(),
                underlying.annualized_dividend,
                row.strike,
            ),
        })
        .collect();

    ResultSet {
        ticker: ticker.to_string(),
        expiration,
        rows: projections,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
