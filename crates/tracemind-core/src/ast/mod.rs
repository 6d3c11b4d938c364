//! Source parsing and function/call-site extraction.

pub mod extract;
pub mod provider;
pub mod source;
pub mod tree;

pub use extract::{
    compute_complexity, extract_call_sites, extract_functions, find_function,
    find_function_at_line, CallSite, FunctionDef,
};
pub use provider::{GrammarProvider, TreeSitterProvider};
pub use source::SourceFile;
