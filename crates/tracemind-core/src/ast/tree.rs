//! Owned, grammar-independent syntax tree.
//!
//! Grammar providers lower whatever concrete tree they produce into a
//! [`SyntaxTree`]: a flat arena of nodes, each carrying its kind, the field
//! name it occupies in its parent, a byte range and start/end points. The
//! extraction code only ever sees this view, so it never depends on a
//! particular parser backend.

use std::ops::Range;

/// Zero-based row/column position, as reported by the parser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// Index of a node inside its [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Shape of a node being added to a tree.
#[derive(Debug, Clone)]
pub struct NodeSpan<'a> {
    pub kind: &'a str,
    pub byte_range: Range<usize>,
    pub start: Point,
    pub end: Point,
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: String,
    field: Option<String>,
    byte_range: Range<usize>,
    start: Point,
    end: Point,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena of syntax nodes. The first node added is the root.
#[derive(Debug, Clone, Default)]
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
}

impl SyntaxTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node under `parent` (or as the root when `None`).
    ///
    /// Children must be added in source order.
    pub fn add_node(&mut self, parent: Option<NodeId>, field: Option<&str>, span: NodeSpan<'_>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind: span.kind.to_string(),
            field: field.map(str::to_string),
            byte_range: span.byte_range,
            start: span.start,
            end: span.end,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p.0)) {
            parent.children.push(id);
        }
        id
    }

    pub fn root(&self) -> Option<Node<'_>> {
        self.node(NodeId(0))
    }

    pub fn node(&self, id: NodeId) -> Option<Node<'_>> {
        (id.0 < self.nodes.len()).then_some(Node { tree: self, id })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Borrowed view of one node.
#[derive(Debug, Clone, Copy)]
pub struct Node<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl<'t> Node<'t> {
    fn data(&self) -> &'t NodeData {
        &self.tree.nodes[self.id.0]
    }

    fn at(&self, id: NodeId) -> Node<'t> {
        Node { tree: self.tree, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &'t str {
        &self.data().kind
    }

    pub fn child_count(&self) -> usize {
        self.data().children.len()
    }

    pub fn child(&self, index: usize) -> Option<Node<'t>> {
        self.data().children.get(index).map(|&id| self.at(id))
    }

    pub fn children(&self) -> impl Iterator<Item = Node<'t>> + 't {
        let tree = self.tree;
        self.data()
            .children
            .iter()
            .map(move |&id| Node { tree, id })
    }

    pub fn child_by_field_name(&self, field: &str) -> Option<Node<'t>> {
        self.children()
            .find(|c| c.data().field.as_deref() == Some(field))
    }

    pub fn parent(&self) -> Option<Node<'t>> {
        self.data().parent.map(|id| self.at(id))
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.data().byte_range.clone()
    }

    pub fn start_position(&self) -> Point {
        self.data().start
    }

    pub fn end_position(&self) -> Point {
        self.data().end
    }

    /// 1-based first line.
    pub fn start_line(&self) -> usize {
        self.data().start.row + 1
    }

    /// 1-based last line.
    pub fn end_line(&self) -> usize {
        self.data().end.row + 1
    }

    /// Source text covered by this node.
    pub fn utf8_text<'s>(&self, source: &'s [u8]) -> Result<&'s str, std::str::Utf8Error> {
        let range = self.data().byte_range.clone();
        let end = range.end.min(source.len());
        let start = range.start.min(end);
        std::str::from_utf8(&source[start..end])
    }

    /// Pre-order walk of this node's subtree, including the node itself.
    /// `descend` decides whether a visited node's children are walked.
    pub fn walk(&self, descend: &mut dyn FnMut(Node<'t>) -> bool, visit: &mut dyn FnMut(Node<'t>)) {
        let mut stack = vec![*self];
        while let Some(node) = stack.pop() {
            if !descend(node) {
                continue;
            }
            visit(node);
            let children = &node.data().children;
            stack.extend(children.iter().rev().map(|&id| node.at(id)));
        }
    }
}
