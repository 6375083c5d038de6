//! Row extraction.
//!
//! Reads strike/bid/ask out of the located table's body rows. Column
//! positions are fixed by the host page's layout convention — a known
//! external-format dependency, not re-derived dynamically.

use tracing::trace;

use super::dom::{Dom, NodeId};
use crate::types::ContractRow;

/// 0-indexed cell positions within a body row.
const CONTRACT_NAME_CELL: usize = 0;
const STRIKE_CELL: usize = 2;
const BID_CELL: usize = 4;
const ASK_CELL: usize = 5;

/// Extract one `ContractRow` per body row, in table order.
///
/// Unparseable or missing cells default to 0 for that value; a bad row
/// never aborts the batch.
pub fn contract_rows(dom: &Dom, table: NodeId) -> Vec<ContractRow> {
    dom.body_rows(table)
        .iter()
        .enumerate()
        .map(|(index, &row)| {
            let cells = dom.cells(row);
            let text_at = |pos: usize| {
                cells
                    .get(pos)
                    .map(|&cell| dom.text_content(cell))
                    .unwrap_or_default()
            };

            let extracted = ContractRow {
                index,
                contract_name: text_at(CONTRACT_NAME_CELL).trim().to_string(),
                strike: numeric(&text_at(STRIKE_CELL)),
                bid: numeric(&text_at(BID_CELL)),
                ask: numeric(&text_at(ASK_CELL)),
            };
            trace!(row = index, contract = %extracted.contract_name, "Extracted row");
            extracted
        })
        .collect()
}

/// Parse a decimal out of cell text by stripping every character that is
/// not a digit or decimal point. Empty or unparseable input yields 0.0.
pub fn numeric(text: &str) -> f64 {
    let filtered: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    filtered.parse().unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
