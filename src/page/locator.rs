//! Calls-table location.
//!
//! The host page renders calls and puts as sibling tables with no stable
//! machine-readable identifier. Location is a heuristic pattern match
//! against the surrounding markup, re-run after every detected mutation —
//! never cached across re-renders.

use tracing::debug;

use super::dom::{Dom, NodeId, NodeKind};

/// Find the "Calls" options table, never the "Puts" one.
///
/// Two heuristics, in order:
/// 1. a heading within two ancestor containers whose text matches
///    "Calls" (case-insensitive);
/// 2. the header row mentions "Contract Name" or "Strike" AND a preceding
///    sibling's text mentions "Calls".
///
/// Returns the first table satisfying either. A table whose nearest
/// labeling text says "Puts" is rejected outright.
pub fn find_calls_table(dom: &Dom) -> Option<NodeId> {
    let tables = dom.nodes_of_kind(NodeKind::Table);
    debug!(candidates = tables.len(), "Locating calls table");
    tables.into_iter().find(|&table| is_calls_table(dom, table))
}

fn is_calls_table(dom: &Dom, table: NodeId) -> bool {
    // Heuristic 1: heading up to two ancestor containers away.
    for &ancestor in dom.ancestors(table).iter().take(2) {
        if let Some(heading) = dom.find_kind(ancestor, NodeKind::Heading) {
            let text = dom.text_content(heading);
            if contains_ci(&text, "puts") {
                return false;
            }
            if contains_ci(&text, "calls") {
                return true;
            }
        }
    }

    // Heuristic 2: recognizable option-chain header row, labeled by a
    // preceding sibling. Nearest sibling wins, so a puts table sitting
    // after the calls section is never misattributed.
    if !header_mentions_contract_columns(dom, table) {
        return false;
    }
    for sibling in dom.preceding_siblings(table) {
        let text = dom.text_content(sibling);
        if contains_ci(&text, "puts") {
            return false;
        }
        if contains_ci(&text, "calls") {
            return true;
        }
    }
    false
}

fn header_mentions_contract_columns(dom: &Dom, table: NodeId) -> bool {
    let Some(header) = dom.header_row(table) else {
        return false;
    };
    dom.cells(header).iter().any(|&cell| {
        let text = dom.text_content(cell);
        contains_ci(&text, "contract name") || contains_ci(&text, "strike")
    })
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
