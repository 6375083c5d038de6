//! Dashboard API routes and state.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::{Arc, RwLock};

use crate::engine::ResultsHandle;
use crate::types::{ResultSet, StockSummary};

/// Read-only view state shared with the engine.
pub struct DashboardState {
    summary: RwLock<Option<StockSummary>>,
    results: ResultsHandle,
}

pub type AppState = Arc<DashboardState>;

impl DashboardState {
    pub fn new(summary: Option<StockSummary>, results: ResultsHandle) -> Self {
        Self {
            summary: RwLock::new(summary),
            results,
        }
    }

    /// Replace the displayed summary (driven by update notifications).
    pub fn set_summary(&self, summary: StockSummary) {
        *self.summary.write().unwrap() = Some(summary);
    }

    fn results(&self) -> Option<ResultSet> {
        self.results.read().unwrap().clone()
    }
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /api/summary` — the persisted per-ticker record, or a passive
/// "no data" message before the first successful run.
pub async fn get_summary(State(state): State<AppState>) -> Json<Value> {
    match state.summary.read().unwrap().as_ref() {
        Some(summary) => Json(json!({
            "ticker": summary.ticker,
            "price": summary.price,
            "dividend": summary.dividend,
            "frequency": summary.frequency.label(),
            "lastDividend": summary.last_dividend,
            "updatedAt": summary.updated_at,
        })),
        None => Json(json!({
            "message": "No stock data found. Open an options page.",
        })),
    }
}

/// `GET /api/roi` — the latest result set, positionally aligned with the
/// table it was computed from.
pub async fn get_roi(State(state): State<AppState>) -> Json<Value> {
    match state.results() {
        Some(results) => Json(serde_json::to_value(&results).unwrap_or(Value::Null)),
        None => Json(Value::Null),
    }
}

/// `GET /api/roi/{row}/{scenario}` — full breakdown for one scenario,
/// mirroring the on-page detail popup.
pub async fn get_roi_detail(
    State(state): State<AppState>,
    Path((row, scenario)): Path<(usize, usize)>,
) -> Result<Json<Value>, StatusCode> {
    let results = state.results().ok_or(StatusCode::NOT_FOUND)?;
    let projection = results.rows.get(row).ok_or(StatusCode::NOT_FOUND)?;
    let scenario = projection
        .scenarios
        .get(scenario)
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(json!({
        "ticker": results.ticker,
        "contractName": projection.contract_name,
        "movement": scenario.movement.label(),
        "strike": scenario.strike,
        "endPrice": scenario.end_price,
        "stockPrice": scenario.cost_basis / 100.0,
        "netEntryPrice": scenario.net_entry_price(),
        "callIncome": scenario.call_option_income,
        "dividendIncome": scenario.dividend_yield,
        "stockMovement": scenario.stock_movement,
        "costBasis": scenario.cost_basis,
        "calledAway": scenario.called_away().to_string(),
        "roiPercent": scenario.roi_percent,
    })))
}
