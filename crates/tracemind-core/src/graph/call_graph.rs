//! Crash-path call graph backed by petgraph::DiGraph.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

/// A function on the crash path, resolved to its definition in source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallNode {
    pub name: String,
    pub file: String,
    pub start_line: usize,
    pub end_line: usize,
    pub signature: String,
    pub complexity: u32,
}

/// Wrapper around petgraph::DiGraph. Edges run caller -> callee.
#[derive(Debug, Clone)]
pub struct CallGraph {
    graph: DiGraph<CallNode, ()>,
    entry_point: Option<NodeIndex>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            entry_point: None,
        }
    }

    /// Add a node for one resolved frame. Repeated definitions (recursion)
    /// get one node per frame. The first node ever added becomes the entry
    /// point.
    pub fn add_node(&mut self, node: CallNode) -> NodeIndex {
        let idx = self.graph.add_node(node);
        self.entry_point.get_or_insert(idx);
        idx
    }

    /// Add a caller -> callee edge. Returns false if it already existed.
    pub fn add_call(&mut self, caller: NodeIndex, callee: NodeIndex) -> bool {
        if self.graph.find_edge(caller, callee).is_some() {
            return false;
        }
        self.graph.add_edge(caller, callee, ());
        true
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&CallNode> {
        self.graph.node_weight(idx)
    }

    /// Index of the first node named `name`, in insertion order.
    pub fn find(&self, name: &str) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .find(|&idx| self.graph[idx].name == name)
    }

    pub fn entry_point(&self) -> Option<&CallNode> {
        self.entry_point.and_then(|idx| self.node(idx))
    }

    pub fn entry_point_index(&self) -> Option<NodeIndex> {
        self.entry_point
    }

    pub fn callers(&self, idx: NodeIndex) -> Vec<&CallNode> {
        self.neighbours(idx, Direction::Incoming)
    }

    pub fn callees(&self, idx: NodeIndex) -> Vec<&CallNode> {
        self.neighbours(idx, Direction::Outgoing)
    }

    fn neighbours(&self, idx: NodeIndex, dir: Direction) -> Vec<&CallNode> {
        let mut result: Vec<(usize, &CallNode)> = self
            .graph
            .edges_directed(idx, dir)
            .map(|e| if dir == Direction::Incoming { e.source() } else { e.target() })
            .map(|n| (n.index(), &self.graph[n]))
            .collect();
        result.sort_by_key(|(i, _)| *i);
        result.into_iter().map(|(_, n)| n).collect()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &CallNode> {
        self.graph.node_weights()
    }

    /// `(caller, callee)` index pairs in insertion order.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        self.graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index()))
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Access the underlying petgraph for algorithms that need it.
    pub fn inner_graph(&self) -> &DiGraph<CallNode, ()> {
        &self.graph
    }
}

impl Default for CallGraph {
    fn default() -> Self {
        Self::new()
    }
}
