//! Overlay engine.
//!
//! Inserts the computed ROI columns into the located calls table and
//! guarantees at most one set of injected UI exists at any time. All
//! injected nodes carry a marker class so cleanup can find them anywhere
//! in the document without bookkeeping. Side effects are confined to the
//! page model — no network or storage access here.

pub mod popup;

use tracing::{debug, warn};

use crate::page::dom::{Dom, NodeId, NodeKind};
use crate::types::{Movement, ResultSet, Scenario};

/// Marker class on injected header cells.
pub const HEADER_MARK: &str = "roi-header";
/// Marker class on injected data cells.
pub const CELL_MARK: &str = "roi-cell";

/// Header text of the column the ROI columns are anchored after.
const CHANGE_COLUMN: &str = "% Change";

const ROW_ATTR: &str = "data-roi-row";
const SCENARIO_ATTR: &str = "data-roi-scenario";

/// The explicit owned handle for everything the agent has put on the
/// page: at most one injected table and at most one open detail popup,
/// both fully torn down before any replacement.
#[derive(Debug, Default)]
pub struct Overlay {
    injected_table: Option<NodeId>,
    open_popup: Option<NodeId>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table the current columns were injected into, if any.
    pub fn injected_table(&self) -> Option<NodeId> {
        self.injected_table
    }

    /// Remove every injected header, cell, and popup from the document.
    /// Idempotent; safe to call when nothing is injected.
    pub fn cleanup(&mut self, dom: &mut Dom) {
        let mut removed = 0usize;
        for mark in [HEADER_MARK, CELL_MARK, popup::POPUP_MARK] {
            for node in dom.nodes_with_class(mark) {
                dom.remove(node);
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(removed, "Cleaned up injected nodes");
        }
        self.injected_table = None;
        self.open_popup = None;
    }

    /// Inject the ROI columns for `results` into `table`.
    ///
    /// Always cleans up first, so repeated injection never accumulates.
    /// Rows beyond the result set get blank cells; a result set whose
    /// length no longer matches the table is injected positionally with a
    /// warning.
    pub fn inject(&mut self, dom: &mut Dom, table: NodeId, results: &ResultSet, ticker: &str) {
        if results.is_empty() || !dom.contains(table) {
            return;
        }
        self.cleanup(dom);

        let body_rows = dom.body_rows(table);
        if !results.matches_row_count(body_rows.len()) {
            warn!(
                results = results.len(),
                table_rows = body_rows.len(),
                ticker,
                "Result set misaligned with table; injecting positionally"
            );
        }

        // Column the new cells go after, resolved once from the header.
        let header_row = dom.header_row(table);
        let anchor_column = header_row.and_then(|row| change_column(dom, row));

        if let Some(row) = header_row {
            let base = insertion_base(dom, row, anchor_column);
            for (offset, movement) in Movement::ALL.iter().enumerate() {
                let th = dom.create(NodeKind::HeaderCell);
                dom.set_text(th, format!("ROI {}", movement.label()));
                dom.set_attr(th, "class", HEADER_MARK);
                dom.insert_child(row, base + offset, th);
            }
        }

        for (index, &row) in body_rows.iter().enumerate() {
            let column = row_anchor_column(dom, row, anchor_column);
            let base = insertion_base(dom, row, column);
            let projection = results.rows.get(index);

            for offset in 0..Movement::ALL.len() {
                let td = dom.create(NodeKind::Cell);
                dom.set_attr(td, "class", CELL_MARK);
                dom.set_attr(td, ROW_ATTR, index.to_string());
                dom.set_attr(td, SCENARIO_ATTR, offset.to_string());
                if let Some(projection) = projection {
                    dom.set_text(td, format_roi(&projection.scenarios[offset]));
                }
                dom.insert_child(row, base + offset, td);
            }
        }

        debug!(
            ticker,
            rows = body_rows.len(),
            results = results.len(),
            "Injected ROI columns"
        );
        self.injected_table = Some(table);
    }

    /// React to a selection of an injected cell: close any open detail
    /// popup and open a new one for that single scenario.
    pub fn activate_cell(
        &mut self,
        dom: &mut Dom,
        cell: NodeId,
        results: &ResultSet,
    ) -> Option<NodeId> {
        let row: usize = dom.attr(cell, ROW_ATTR)?.parse().ok()?;
        let scenario_index: usize = dom.attr(cell, SCENARIO_ATTR)?.parse().ok()?;
        let scenario = *results.rows.get(row)?.scenarios.get(scenario_index)?;

        self.close_popup(dom);
        let popup = popup::open(dom, &scenario, &results.ticker);
        self.open_popup = Some(popup);
        Some(popup)
    }

    /// Close the detail popup if one is open.
    pub fn close_popup(&mut self, dom: &mut Dom) {
        if let Some(popup) = self.open_popup.take() {
            dom.remove(popup);
        }
    }
}

/// Index (within the row's cells) of the `% Change` column, by exact
/// header text match.
fn change_column(dom: &Dom, header_row: NodeId) -> Option<usize> {
    dom.cells(header_row)
        .iter()
        .position(|&cell| dom.text_content(cell).trim() == CHANGE_COLUMN)
}

/// Resolve the anchor column for a body row: header alignment first,
/// then the row's own cell text as an edge-case fallback.
fn row_anchor_column(dom: &Dom, row: NodeId, header_anchor: Option<usize>) -> Option<usize> {
    if header_anchor.is_some() {
        return header_anchor;
    }
    dom.cells(row)
        .iter()
        .position(|&cell| dom.text_content(cell).trim() == CHANGE_COLUMN)
}

/// Child index the first new cell goes to: right after the anchor cell,
/// or the end of the row when no anchor exists.
fn insertion_base(dom: &Dom, row: NodeId, anchor: Option<usize>) -> usize {
    let cells = dom.cells(row);
    match anchor {
        Some(column) if column < cells.len() => {
            let anchor_cell = cells[column];
            dom.children(row)
                .iter()
                .position(|&c| c == anchor_cell)
                .map(|p| p + 1)
                .unwrap_or(dom.children(row).len())
        }
        _ => dom.children(row).len(),
    }
}

/// Fixed two-decimal percentage, blank when the value is not finite.
fn format_roi(scenario: &Scenario) -> String {
    if scenario.roi_percent.is_finite() {
        format!("{:.2}%", scenario.roi_percent)
    } else {
        String::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
