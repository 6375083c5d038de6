//! Owned page model.
//!
//! A small arena node tree mirroring the slice of host-page structure the
//! agent cares about: sections, headings, tables and their rows/cells, the
//! expiration control, and generic blocks. The host adapter rebuilds this
//! model from third-party markup on every re-render; the overlay engine
//! mutates it.
//!
//! Node ids are drawn from a process-wide counter and never reused, so a
//! table produced by a re-render is a *different instance* from the one it
//! replaced — the identity the change-watcher compares.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique node identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

/// The structural roles the model distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Section,
    Heading,
    Table,
    TableHead,
    TableBody,
    Row,
    HeaderCell,
    Cell,
    /// A form control, e.g. the expiration `<select>`.
    Control,
    /// Anything else that only contributes structure and text.
    Block,
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Text directly owned by this node (not descendants).
    text: String,
    attrs: BTreeMap<String, String>,
}

/// The owned document tree.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: HashMap<NodeId, NodeData>,
    root: NodeId,
}

impl Dom {
    pub fn new() -> Self {
        let root = NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed));
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
                text: String::new(),
                attrs: BTreeMap::new(),
            },
        );
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Create a detached node. It becomes part of the tree once appended
    /// or inserted under a parent.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed));
        self.nodes.insert(
            id,
            NodeData {
                kind,
                parent: None,
                children: Vec::new(),
                text: String::new(),
                attrs: BTreeMap::new(),
            },
        );
        id
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    pub fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.nodes.get(&node).map(|n| n.kind)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(&node)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    // -- mutation ---------------------------------------------------------

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let len = self.children(parent).len();
        self.insert_child(parent, len, child);
    }

    /// Insert `child` at `index` within `parent`'s children (clamped to the
    /// end). A child already attached elsewhere is detached first.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if !self.nodes.contains_key(&parent) || !self.nodes.contains_key(&child) {
            return;
        }
        self.detach(child);
        {
            let siblings = &mut self.nodes.get_mut(&parent).unwrap().children;
            let slot = index.min(siblings.len());
            siblings.insert(slot, child);
        }
        self.nodes.get_mut(&child).unwrap().parent = Some(parent);
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.parent(node) {
            if let Some(data) = self.nodes.get_mut(&parent) {
                data.children.retain(|&c| c != node);
            }
        }
        if let Some(data) = self.nodes.get_mut(&node) {
            data.parent = None;
        }
    }

    /// Detach `node` and drop its entire subtree.
    pub fn remove(&mut self, node: NodeId) {
        if node == self.root {
            return;
        }
        self.detach(node);
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(data) = self.nodes.remove(&id) {
                stack.extend(data.children);
            }
        }
    }

    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) {
        if let Some(data) = self.nodes.get_mut(&node) {
            data.text = text.into();
        }
    }

    pub fn push_text(&mut self, node: NodeId, text: &str) {
        if let Some(data) = self.nodes.get_mut(&node) {
            if !data.text.is_empty() {
                data.text.push(' ');
            }
            data.text.push_str(text);
        }
    }

    pub fn set_attr(&mut self, node: NodeId, key: impl Into<String>, value: impl Into<String>) {
        if let Some(data) = self.nodes.get_mut(&node) {
            data.attrs.insert(key.into(), value.into());
        }
    }

    pub fn attr(&self, node: NodeId, key: &str) -> Option<&str> {
        self.nodes
            .get(&node)
            .and_then(|n| n.attrs.get(key))
            .map(|s| s.as_str())
    }

    // -- queries ----------------------------------------------------------

    /// The node's own text plus all descendant text, in document order.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut parts = Vec::new();
        for id in self.descendants_inclusive(node) {
            if let Some(data) = self.nodes.get(&id) {
                let t = data.text.trim();
                if !t.is_empty() {
                    parts.push(t.to_string());
                }
            }
        }
        parts.join(" ")
    }

    /// Preorder traversal of `node` and everything below it.
    pub fn descendants_inclusive(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if !self.nodes.contains_key(&id) {
                continue;
            }
            out.push(id);
            for &child in self.children(id).iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// All nodes of a given kind, in document order.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> Vec<NodeId> {
        self.descendants_inclusive(self.root)
            .into_iter()
            .filter(|&id| self.kind(id) == Some(kind))
            .collect()
    }

    /// All nodes whose `class` attribute contains `class_name` as a
    /// whitespace-separated token.
    pub fn nodes_with_class(&self, class_name: &str) -> Vec<NodeId> {
        self.descendants_inclusive(self.root)
            .into_iter()
            .filter(|&id| {
                self.attr(id, "class")
                    .map(|c| c.split_whitespace().any(|t| t == class_name))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Ancestors of `node`, nearest first.
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(node);
        while let Some(id) = current {
            out.push(id);
            current = self.parent(id);
        }
        out
    }

    /// Siblings before `node`, nearest first.
    pub fn preceding_siblings(&self, node: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.parent(node) else {
            return Vec::new();
        };
        let siblings = self.children(parent);
        let Some(pos) = siblings.iter().position(|&s| s == node) else {
            return Vec::new();
        };
        siblings[..pos].iter().rev().copied().collect()
    }

    /// First descendant (or self) of the given kind.
    pub fn find_kind(&self, node: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.descendants_inclusive(node)
            .into_iter()
            .find(|&id| self.kind(id) == Some(kind))
    }

    // -- table helpers -----------------------------------------------------

    /// The header row of a table: first row under `TableHead`, falling back
    /// to the first row whose cells are header cells.
    pub fn header_row(&self, table: NodeId) -> Option<NodeId> {
        if let Some(thead) = self
            .children(table)
            .iter()
            .copied()
            .find(|&c| self.kind(c) == Some(NodeKind::TableHead))
        {
            if let Some(row) = self.find_kind(thead, NodeKind::Row) {
                return Some(row);
            }
        }
        self.nodes_of_kind_under(table, NodeKind::Row)
            .into_iter()
            .find(|&row| {
                let cells = self.cells(row);
                !cells.is_empty()
                    && cells
                        .iter()
                        .all(|&c| self.kind(c) == Some(NodeKind::HeaderCell))
            })
    }

    /// Body rows of a table: rows under `TableBody`, or — absent one —
    /// every non-header row.
    pub fn body_rows(&self, table: NodeId) -> Vec<NodeId> {
        if let Some(tbody) = self
            .children(table)
            .iter()
            .copied()
            .find(|&c| self.kind(c) == Some(NodeKind::TableBody))
        {
            return self.nodes_of_kind_under(tbody, NodeKind::Row);
        }
        let header = self.header_row(table);
        self.nodes_of_kind_under(table, NodeKind::Row)
            .into_iter()
            .filter(|&row| Some(row) != header)
            .collect()
    }

    /// The cells of a row (header or data), in order.
    pub fn cells(&self, row: NodeId) -> Vec<NodeId> {
        self.children(row)
            .iter()
            .copied()
            .filter(|&c| {
                matches!(
                    self.kind(c),
                    Some(NodeKind::Cell) | Some(NodeKind::HeaderCell)
                )
            })
            .collect()
    }

    fn nodes_of_kind_under(&self, node: NodeId, kind: NodeKind) -> Vec<NodeId> {
        self.descendants_inclusive(node)
            .into_iter()
            .filter(|&id| id != node && self.kind(id) == Some(kind))
            .collect()
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
