//! Run-scoped history of reconstructed call-tree nodes.
//!
//! The store is append-only-by-merge: re-inserting a path updates the
//! descriptions of existing nodes in place but never duplicates structure or
//! reorders children. Children keep first-seen insertion order, which is what
//! the printer walks.

use indexmap::IndexMap;

use crate::core::calltree::CallNode;
use crate::core::frame::SiteId;

/// One recorded call site: its latest rendering plus the call sites invoked
/// from it.
#[derive(Debug, Default)]
pub struct HistoryNode {
    pub description: Option<String>,
    pub children: IndexMap<SiteId, HistoryNode>,
}

/// History of call-tree paths for one run.
#[derive(Debug, Default)]
pub struct History {
    roots: IndexMap<SiteId, HistoryNode>,
    last_page_object: Vec<CallNode>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a call-tree path. Nodes are found-or-created level by level in
    /// path order; a path node carrying a step summary overwrites the
    /// description at that level. Idempotent under repeated insertion.
    pub fn insert(&mut self, path: &[CallNode]) {
        let mut cursor = &mut self.roots;
        for node in path {
            let entry = cursor.entry(node.id.clone()).or_default();
            if let Some(step) = &node.step {
                entry.description = Some(step.label());
            }
            cursor = &mut entry.children;
        }
    }

    /// Root mapping for read-only traversal by the printer.
    pub fn get(&self) -> &IndexMap<SiteId, HistoryNode> {
        &self.roots
    }

    /// Remember the most recently tracked page-object path; used to seed the
    /// call tree of steps whose stacks lost their grouping frames.
    pub fn record_page_object(&mut self, path: &[CallNode]) {
        self.last_page_object = path.to_vec();
    }

    pub fn last_page_object(&self) -> &[CallNode] {
        &self.last_page_object
    }

    /// Drop all recorded state; called at run boundaries.
    pub fn reset(&mut self) {
        self.roots.clear();
        self.last_page_object.clear();
    }

    /// Indented listing of the recorded tree, for inspection tooling.
    pub fn tree_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        collect_lines(&self.roots, 0, &mut lines);
        lines
    }
}

fn collect_lines(nodes: &IndexMap<SiteId, HistoryNode>, depth: usize, lines: &mut Vec<String>) {
    for (id, node) in nodes {
        let indent = "  ".repeat(depth);
        let label = node.description.as_deref().unwrap_or(id.as_str());
        lines.push(format!("{indent}- {label}"));
        collect_lines(&node.children, depth + 1, lines);
    }
}
