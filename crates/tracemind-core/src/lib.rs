//! TraceMind Core: crash and log analysis engine.
//!
//! Turns raw crash output into structured data: language detection, stack
//! trace parsing for Python, Go and Node.js, structured log extraction,
//! generic log parsing with relevance scoring, and a crash-path call graph
//! resolved against repository sources with tree-sitter.

pub mod ast;
pub mod config;
pub mod error;
pub mod graph;
pub mod input;
pub mod languages;
pub mod logs;
pub mod output;
pub mod pipeline;

pub use error::{Result, TraceMindError};
