//! Concrete syntax tree produced by the parser adapter
//!
//! Nodes live in an arena `Vec` and reference each other by [`NodeId`], so
//! traversals are explicit worklists rather than recursion (deeply nested
//! input cannot exhaust the call stack). Malformed input never fails the
//! parse; it shows up as `ERROR`-kinded nodes, tree-sitter style.

use std::collections::VecDeque;

/// Unique identifier of a node within its tree.
pub type NodeId = usize;

/// Kind string used for error-marked nodes.
pub const ERROR_KIND: &str = "ERROR";

/// A single node: a statement, a block opener, or an error marker.
#[derive(Debug, Clone)]
pub struct SyntaxNode {
    /// Tree-sitter-style kind, e.g. `function_definition` or `ERROR`.
    pub kind: &'static str,
    /// Captured name, when the kind has one (function name, assigned
    /// variable, call target).
    pub name: Option<String>,
    /// 1-based source line.
    pub line: usize,
    /// 1-based columns of the statement text on its line.
    pub start_column: usize,
    pub end_column: usize,
    /// Trimmed source text of the statement.
    pub text: String,
    pub children: Vec<NodeId>,
}

impl SyntaxNode {
    pub fn is_error(&self) -> bool {
        self.kind == ERROR_KIND
    }

    /// First line of the node's text, for step snippets.
    pub fn snippet(&self) -> &str {
        self.text.lines().next().unwrap_or("").trim()
    }
}

/// An arena-backed syntax tree. The root node always exists and carries the
/// whole-file kind for its language (`module`, `source_file`, ...).
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<SyntaxNode>,
    has_error: bool,
}

impl SyntaxTree {
    pub(crate) fn new(root_kind: &'static str) -> Self {
        SyntaxTree {
            nodes: vec![SyntaxNode {
                kind: root_kind,
                name: None,
                line: 1,
                start_column: 1,
                end_column: 1,
                text: String::new(),
                children: Vec::new(),
            }],
            has_error: false,
        }
    }

    pub fn root_id(&self) -> NodeId {
        0
    }

    pub fn root(&self) -> &SyntaxNode {
        &self.nodes[0]
    }

    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id]
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Native error check maintained while the tree is built.
    pub fn has_error(&self) -> bool {
        self.has_error
    }

    pub(crate) fn push_node(&mut self, parent: NodeId, node: SyntaxNode) -> NodeId {
        if node.is_error() {
            self.has_error = true;
        }
        let id = self.nodes.len();
        self.nodes.push(node);
        self.nodes[parent].children.push(id);
        id
    }

    /// Breadth-first iterator over all node ids, root first.
    pub fn walk(&self) -> TreeWalk<'_> {
        let mut queue = VecDeque::new();
        queue.push_back(self.root_id());
        TreeWalk { tree: self, queue }
    }

    /// Locate the first error-marked node, if any.
    ///
    /// Prefers the native [`has_error`](Self::has_error) flag to skip the
    /// traversal on clean trees, but still falls back to a full breadth-first
    /// search so a builder that failed to maintain the flag cannot hide an
    /// error node. This is the sole syntax gate before execution.
    pub fn find_first_error(&self) -> Option<NodeId> {
        let found = self.walk().find(|&id| self.node(id).is_error());
        debug_assert_eq!(self.has_error, found.is_some());
        found
    }
}

/// Worklist-based breadth-first traversal.
pub struct TreeWalk<'t> {
    tree: &'t SyntaxTree,
    queue: VecDeque<NodeId>,
}

impl Iterator for TreeWalk<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.queue.pop_front()?;
        for &child in &self.tree.node(id).children {
            self.queue.push_back(child);
        }
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(kind: &'static str, line: usize) -> SyntaxNode {
        SyntaxNode {
            kind,
            name: None,
            line,
            start_column: 1,
            end_column: 1,
            text: String::new(),
            children: Vec::new(),
        }
    }

    #[test]
    fn walk_is_breadth_first() {
        let mut tree = SyntaxTree::new("module");
        let a = tree.push_node(0, leaf("a", 1));
        let b = tree.push_node(0, leaf("b", 2));
        tree.push_node(a, leaf("a1", 1));
        tree.push_node(b, leaf("b1", 2));
        let order: Vec<&str> = tree.walk().map(|id| tree.node(id).kind).collect();
        assert_eq!(order, vec!["module", "a", "b", "a1", "b1"]);
    }

    #[test]
    fn find_first_error_uses_flag_and_fallback() {
        let mut tree = SyntaxTree::new("module");
        assert!(tree.find_first_error().is_none());
        let parent = tree.push_node(0, leaf("block", 1));
        let err = tree.push_node(parent, leaf(ERROR_KIND, 3));
        assert!(tree.has_error());
        assert_eq!(tree.find_first_error(), Some(err));
    }
}
