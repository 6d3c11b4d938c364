pub mod builder;
pub mod call_graph;

pub use builder::CallGraphBuilder;
pub use call_graph::{CallGraph, CallNode};
