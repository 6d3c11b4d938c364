//! Sequential analysis run with per-phase timing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{info, warn};

use crate::ast::GrammarProvider;
use crate::config::{AnalysisConfig, StackFrame, StackTrace};
use crate::error::Result;
use crate::graph::{CallGraph, CallGraphBuilder};
use crate::input::{unified_parse, ParseOutcome};

/// Phase labels for progress reporting.
const PHASE_LABELS: &[(&str, &str)] = &[
    ("parsing", "Parsing input"),
    ("call_graph", "Building call graph"),
];

/// Progress callback type: (phase_name, label).
pub type ProgressCallback = Box<dyn FnMut(&str, &str)>;

/// Everything one analysis run produced.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub outcome: ParseOutcome,
    pub call_graph: Option<CallGraph>,
    pub repo_root: Option<PathBuf>,
    /// Phase name -> seconds.
    pub timings: HashMap<String, f64>,
    pub total_ms: f64,
}

fn report(progress: &mut Option<ProgressCallback>, name: &str) {
    if let Some(cb) = progress.as_mut() {
        let label = PHASE_LABELS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, l)| *l)
            .unwrap_or(name);
        cb(name, label);
    }
}

/// Parse the input and, for stack traces with a known repository, build the
/// crash-path call graph.
pub fn run_analysis(
    input: &[u8],
    config: &AnalysisConfig,
    provider: &dyn GrammarProvider,
    mut progress: Option<ProgressCallback>,
) -> Result<AnalysisResult> {
    let mut timings: HashMap<String, f64> = HashMap::new();
    let total_start = Instant::now();

    report(&mut progress, "parsing");
    let start = Instant::now();
    let outcome = unified_parse(input, config.input_format)?;
    timings.insert("parsing".to_string(), start.elapsed().as_secs_f64());

    let mut call_graph = None;
    let mut repo_root = None;

    if let Some(trace) = outcome.stack_trace() {
        repo_root = match &config.repo_path {
            Some(path) => Some(PathBuf::from(path)),
            None => find_repo_root(&trace.frames),
        };

        match (&repo_root, config.build_call_graph) {
            (Some(root), true) => {
                report(&mut progress, "call_graph");
                let start = Instant::now();
                let mut builder = CallGraphBuilder::new(root.clone(), provider)
                    .include_stdlib(config.include_stdlib)
                    .max_file_size(config.max_file_size);
                call_graph = Some(builder.build(&trace.frames));
                timings.insert("call_graph".to_string(), start.elapsed().as_secs_f64());
            }
            (None, true) => warn!("No repository root found, skipping call graph"),
            (_, false) => {}
        }
    }

    let total_ms = total_start.elapsed().as_secs_f64() * 1000.0;
    info!("Analysis finished in {total_ms:.1}ms");

    Ok(AnalysisResult {
        outcome,
        call_graph,
        repo_root,
        timings,
        total_ms,
    })
}

/// Walk up from each absolute frame path looking for a `.git` directory,
/// falling back to the current directory when it is a repository.
pub fn find_repo_root(frames: &[StackFrame]) -> Option<PathBuf> {
    for frame in frames {
        let Some(file) = frame.file.as_deref() else {
            continue;
        };
        let path = Path::new(file);
        if !path.is_absolute() {
            continue;
        }
        if let Some(root) = path.ancestors().skip(1).find(|dir| dir.join(".git").exists()) {
            return Some(root.to_path_buf());
        }
    }

    std::env::current_dir()
        .ok()
        .filter(|cwd| cwd.join(".git").exists())
}

/// Distinct frame files in first-seen order.
pub fn unique_trace_files(trace: &StackTrace) -> Vec<String> {
    let mut files: Vec<String> = Vec::new();
    for file in trace.frames.iter().filter_map(|f| f.file.as_ref()) {
        if !files.contains(file) {
            files.push(file.clone());
        }
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Language;

    fn frame(file: &str) -> StackFrame {
        StackFrame {
            file: Some(file.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn repo_root_found_from_absolute_frame() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        std::fs::create_dir_all(dir.path().join("pkg")).unwrap();
        let file = dir.path().join("pkg/app.py");

        let frames = vec![frame("relative/ignored.py"), frame(&file.display().to_string())];
        assert_eq!(find_repo_root(&frames).as_deref(), Some(dir.path()));
    }

    #[test]
    fn unique_files_keep_order() {
        let mut trace = StackTrace::new(Language::Python, "");
        trace.frames = vec![frame("/a.py"), frame("/b.py"), frame("/a.py")];
        assert_eq!(unique_trace_files(&trace), vec!["/a.py", "/b.py"]);
    }
}
