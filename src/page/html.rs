//! Markup adapter.
//!
//! Translates third-party HTML into the owned page model. Only the
//! structure the heuristics care about is distinguished — everything else
//! collapses into generic blocks that still contribute text and ancestry.

use scraper::{ElementRef, Html, Node};

use super::dom::{Dom, NodeId, NodeKind};

/// Name of the expiration-date control on the host options page.
const EXPIRATION_CONTROL: &str = "expirationDate";

/// Parse a full HTML document into the owned model.
pub fn parse_document(html: &str) -> Dom {
    let parsed = Html::parse_document(html);
    let mut dom = Dom::new();
    let root = dom.root();
    convert_children(&mut dom, root, parsed.root_element());
    dom
}

/// The value of the expiration-date selection control, if the page has
/// one.
pub fn selected_expiration(dom: &Dom) -> Option<String> {
    dom.nodes_of_kind(NodeKind::Control)
        .into_iter()
        .find(|&node| dom.attr(node, "name") == Some(EXPIRATION_CONTROL))
        .and_then(|node| dom.attr(node, "value"))
        .map(|v| v.to_string())
}

fn kind_for(tag: &str) -> Option<NodeKind> {
    match tag {
        "section" | "article" => Some(NodeKind::Section),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Some(NodeKind::Heading),
        "table" => Some(NodeKind::Table),
        "thead" => Some(NodeKind::TableHead),
        "tbody" | "tfoot" => Some(NodeKind::TableBody),
        "tr" => Some(NodeKind::Row),
        "th" => Some(NodeKind::HeaderCell),
        "td" => Some(NodeKind::Cell),
        "select" => Some(NodeKind::Control),
        "script" | "style" | "noscript" | "template" | "head" => None,
        _ => Some(NodeKind::Block),
    }
}

fn convert_children(dom: &mut Dom, parent: NodeId, element: ElementRef) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    dom.push_text(parent, trimmed);
                }
            }
            Node::Element(_) => {
                let child_el = ElementRef::wrap(child).expect("element node");
                let tag = child_el.value().name();
                let Some(kind) = kind_for(tag) else {
                    continue;
                };

                if kind == NodeKind::Control {
                    convert_select(dom, parent, child_el);
                    continue;
                }

                let node = dom.create(kind);
                for (key, value) in child_el.value().attrs() {
                    dom.set_attr(node, key, value);
                }
                dom.append_child(parent, node);
                convert_children(dom, node, child_el);
            }
            _ => {}
        }
    }
}

/// A `<select>` is flattened into a single control node carrying the
/// selected option's value and label.
fn convert_select(dom: &mut Dom, parent: NodeId, select: ElementRef) {
    let node = dom.create(NodeKind::Control);
    for (key, value) in select.value().attrs() {
        dom.set_attr(node, key, value);
    }

    let options: Vec<ElementRef> = select
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "option")
        .collect();

    let chosen = options
        .iter()
        .find(|el| el.value().attr("selected").is_some())
        .or_else(|| options.first());

    if let Some(option) = chosen {
        let label: String = option.text().collect::<String>().trim().to_string();
        let value = option
            .value()
            .attr("value")
            .map(|v| v.to_string())
            .unwrap_or_else(|| label.clone());
        dom.set_attr(node, "value", value);
        dom.set_text(node, label);
    }

    dom.append_child(parent, node);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
