//! Scenario detail popup.
//!
//! Builds the full breakdown for a single scenario: every dollar
//! component, call-away status, and the ROI line. Positioning and visual
//! treatment belong to the hosting environment; this module only shapes
//! the content.

use crate::page::dom::{Dom, NodeId, NodeKind};
use crate::types::Scenario;

/// Marker class on the popup root node.
pub const POPUP_MARK: &str = "roi-popup";

/// Open a detail popup for one scenario, attached to the document root.
/// Callers are responsible for closing any previously open popup first
/// (the overlay handle does this).
pub fn open(dom: &mut Dom, scenario: &Scenario, ticker: &str) -> NodeId {
    let popup = dom.create(NodeKind::Section);
    dom.set_attr(popup, "class", POPUP_MARK);

    let heading = dom.create(NodeKind::Heading);
    dom.set_text(heading, title(scenario, ticker));
    dom.append_child(popup, heading);

    for line in lines(scenario) {
        let block = dom.create(NodeKind::Block);
        dom.set_text(block, line);
        dom.append_child(popup, block);
    }

    let root = dom.root();
    dom.append_child(root, popup);
    popup
}

fn title(scenario: &Scenario, ticker: &str) -> String {
    if ticker.is_empty() {
        format!("ROI Breakdown @ {}", scenario.movement)
    } else {
        format!("ROI Breakdown @ {} ({ticker})", scenario.movement)
    }
}

fn lines(scenario: &Scenario) -> Vec<String> {
    vec![
        format!("Stock Price: {}", money(scenario.cost_basis / 100.0)),
        format!("Net Entry Price: {}", money(scenario.net_entry_price())),
        format!("Strike Price: {}", money(scenario.strike)),
        format!("Call Income: {}", money(scenario.call_option_income)),
        format!("Dividend Income: {}", money(scenario.dividend_yield)),
        format!(
            "Stock Movement: {} ({})",
            money(scenario.stock_movement),
            scenario.called_away(),
        ),
        format!("Cost Basis: {}", money(scenario.cost_basis)),
        format!("ROI: {:.2}%", scenario.roi_percent),
    ]
}

/// Dollar formatting with the sign ahead of the symbol: `-$1000.00`.
fn money(value: f64) -> String {
    if value < 0.0 {
        format!("-${:.2}", -value)
    } else {
        format!("${:.2}", value)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
