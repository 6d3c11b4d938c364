//! Builds the crash-path call graph from stack frames and repository sources.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::call_graph::{CallGraph, CallNode};
use crate::ast::{compute_complexity, extract_functions, FunctionDef, GrammarProvider, SourceFile};
use crate::config::StackFrame;
use crate::error::{Result, TraceMindError};

/// One call-graph build session. Owns the parsed-source cache, which lives
/// exactly as long as the builder.
pub struct CallGraphBuilder<'p> {
    repo_root: PathBuf,
    provider: &'p dyn GrammarProvider,
    cache: HashMap<PathBuf, SourceFile>,
    include_stdlib: bool,
    max_file_size: u64,
}

impl<'p> CallGraphBuilder<'p> {
    pub fn new(repo_root: impl Into<PathBuf>, provider: &'p dyn GrammarProvider) -> Self {
        Self {
            repo_root: repo_root.into(),
            provider,
            cache: HashMap::new(),
            include_stdlib: false,
            max_file_size: 1_000_000,
        }
    }

    pub fn include_stdlib(mut self, include: bool) -> Self {
        self.include_stdlib = include;
        self
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Number of source files parsed so far in this session.
    pub fn cached_files(&self) -> usize {
        self.cache.len()
    }

    /// Resolve each frame to its enclosing function and chain the results in
    /// frame order. Unresolvable frames are skipped.
    pub fn build(&mut self, frames: &[StackFrame]) -> CallGraph {
        let mut graph = CallGraph::new();
        let mut previous = None;

        for (i, frame) in frames.iter().enumerate() {
            if frame.is_third_party || (frame.is_stdlib && !self.include_stdlib) {
                debug!("Frame {i}: skipping library frame");
                continue;
            }
            let Some(node) = self.resolve(frame) else {
                continue;
            };

            let idx = graph.add_node(node);
            if let Some(prev) = previous {
                graph.add_call(prev, idx);
            }
            previous = Some(idx);
        }

        info!(
            "Call graph: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        graph
    }

    /// Absolute path of a frame's file; relative paths are taken from the
    /// repository root, which may itself be relative to the working directory.
    fn resolve_path(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.repo_root.join(path)
        };
        std::path::absolute(&joined).unwrap_or(joined)
    }

    fn source_file(&mut self, path: &Path) -> Result<&SourceFile> {
        if !self.cache.contains_key(path) {
            let file = SourceFile::load(path, self.provider, self.max_file_size)?;
            self.cache.insert(path.to_path_buf(), file);
        }
        self.cache
            .get(path)
            .ok_or_else(|| TraceMindError::NotFound(path.display().to_string()))
    }

    fn resolve(&mut self, frame: &StackFrame) -> Option<CallNode> {
        let file = frame.file.as_deref()?;
        let path = self.resolve_path(file);
        let source = match self.source_file(&path) {
            Ok(source) => source,
            Err(e) => {
                debug!("Skipping frame in {file}: {e}");
                return None;
            }
        };

        let Some(def) = locate(source, frame.function.as_deref(), frame.line as usize) else {
            debug!("No function for {file}:{} in source", frame.line);
            return None;
        };

        Some(CallNode {
            complexity: compute_complexity(source, def.start_line, def.end_line),
            name: def.qualified_name,
            file: path.display().to_string(),
            start_line: def.start_line,
            end_line: def.end_line,
            signature: def.signature,
        })
    }
}

/// Find the definition a frame points at: by exact bare or qualified name
/// (preferring a match that contains the frame's line), else the innermost
/// function containing the line.
fn locate(source: &SourceFile, name: Option<&str>, line: usize) -> Option<FunctionDef> {
    let functions = extract_functions(source);

    if let Some(name) = name {
        let mut named = functions
            .iter()
            .filter(|f| f.name == name || f.qualified_name == name)
            .peekable();
        let first = named.peek().cloned();
        if let Some(hit) = named.find(|f| f.contains_line(line)).or(first) {
            return Some(hit.clone());
        }
    }

    functions
        .into_iter()
        .filter(|f| f.contains_line(line))
        .min_by_key(|f| f.end_line - f.start_line)
}
