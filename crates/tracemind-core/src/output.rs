//! JSON report handed to downstream formatting and prompt-building.

use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Result, TraceMindError};
use crate::graph::{CallGraph, CallNode};
use crate::input::ParseOutcome;
use crate::pipeline::{unique_trace_files, AnalysisResult};

/// Serialisable snapshot of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub version: String,
    pub metadata: HashMap<String, Value>,
    pub stats: HashMap<String, Value>,
    pub analysis: ParseOutcome,
    pub trace_files: Vec<String>,
    pub call_graph: Option<CallGraphOutput>,
}

/// Call graph as plain lists. Edge endpoints index into `nodes`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CallGraphOutput {
    pub nodes: Vec<CallNode>,
    pub edges: Vec<CallEdgeOutput>,
    pub entry_point: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallEdgeOutput {
    pub from: usize,
    pub to: usize,
}

impl From<&CallGraph> for CallGraphOutput {
    fn from(graph: &CallGraph) -> Self {
        Self {
            nodes: graph.nodes().cloned().collect(),
            edges: graph
                .edges()
                .into_iter()
                .map(|(from, to)| CallEdgeOutput { from, to })
                .collect(),
            entry_point: graph.entry_point().map(|n| n.name.clone()),
        }
    }
}

fn outcome_stats(outcome: &ParseOutcome) -> HashMap<String, Value> {
    let mut stats = HashMap::new();
    match outcome {
        ParseOutcome::StackTrace(trace) => {
            stats.insert("language".to_string(), json!(trace.language.as_str()));
            stats.insert("frames".to_string(), json!(trace.frame_count()));
            stats.insert(
                "library_frames".to_string(),
                json!(trace
                    .frames
                    .iter()
                    .filter(|f| f.is_stdlib || f.is_third_party)
                    .count()),
            );
        }
        ParseOutcome::GenericLog(log) => {
            stats.insert("entries".to_string(), json!(log.entries.len()));
            stats.insert("errors".to_string(), json!(log.total_errors));
            stats.insert("warnings".to_string(), json!(log.total_warnings));
            stats.insert("info".to_string(), json!(log.total_info));
            stats.insert(
                "anomalies".to_string(),
                json!(log.entries.iter().filter(|e| e.is_anomaly).count()),
            );
            stats.insert(
                "error_signatures".to_string(),
                json!(log.error_signatures.len()),
            );
        }
    }
    stats
}

/// Build the report for a finished run.
pub fn build_report(result: &AnalysisResult) -> AnalysisReport {
    let trace_files = result
        .outcome
        .stack_trace()
        .map(unique_trace_files)
        .unwrap_or_default();

    // Build metadata
    let mut metadata = HashMap::new();
    metadata.insert("generated_at".to_string(), json!(Utc::now().to_rfc3339()));
    metadata.insert(
        "tracemind_version".to_string(),
        json!(env!("CARGO_PKG_VERSION")),
    );
    metadata.insert("mode".to_string(), json!(result.outcome.mode()));
    metadata.insert(
        "repo_root".to_string(),
        json!(result.repo_root.as_ref().map(|p| p.display().to_string())),
    );
    metadata.insert(
        "analysis_duration_ms".to_string(),
        json!((result.total_ms * 10.0).round() / 10.0),
    );
    metadata.insert(
        "phase_timings".to_string(),
        serde_json::to_value(&result.timings).unwrap_or_default(),
    );

    // Build stats
    let mut stats = outcome_stats(&result.outcome);
    stats.insert("trace_files".to_string(), json!(trace_files.len()));
    let (nodes, edges) = result
        .call_graph
        .as_ref()
        .map_or((0, 0), |g| (g.node_count(), g.edge_count()));
    stats.insert("call_graph_nodes".to_string(), json!(nodes));
    stats.insert("call_graph_edges".to_string(), json!(edges));

    AnalysisReport {
        version: "1.0".to_string(),
        metadata,
        stats,
        analysis: result.outcome.clone(),
        trace_files,
        call_graph: result.call_graph.as_ref().map(CallGraphOutput::from),
    }
}

/// Write the report to a JSON file.
pub fn write_report(report: &AnalysisReport, output_path: &Path) -> Result<()> {
    let io_err = |source| TraceMindError::Io {
        path: output_path.to_path_buf(),
        source,
    };
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(output_path, json).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GenericLog, InputFormat, LogFormat};
    use crate::input::unified_parse;

    fn result(outcome: ParseOutcome, call_graph: Option<CallGraph>) -> AnalysisResult {
        AnalysisResult {
            outcome,
            call_graph,
            repo_root: None,
            timings: HashMap::from([("parsing".to_string(), 0.002)]),
            total_ms: 12.345,
        }
    }

    fn node(name: &str, line: usize) -> CallNode {
        CallNode {
            name: name.to_string(),
            file: "/app/main.go".to_string(),
            start_line: line,
            end_line: line + 5,
            signature: format!("{name}()"),
            complexity: 1,
        }
    }

    #[test]
    fn stack_trace_report() {
        let input = b"panic: boom\n\ngoroutine 1 [running]:\nmain.run()\n\t/app/main.go:9 +0x1d\nmain.main()\n\t/app/main.go:3 +0x1d\n";
        let outcome = unified_parse(input, InputFormat::Auto).unwrap();

        let mut graph = CallGraph::new();
        let a = graph.add_node(node("main.run", 8));
        let b = graph.add_node(node("main.main", 2));
        graph.add_call(a, b);

        let report = build_report(&result(outcome, Some(graph)));

        assert_eq!(report.metadata["mode"], json!("stack-trace"));
        assert_eq!(report.metadata["analysis_duration_ms"], json!(12.3));
        assert_eq!(report.metadata["repo_root"], Value::Null);
        assert!(!report.metadata.contains_key("commit_hash"));
        assert_eq!(report.stats["frames"], json!(2));
        assert_eq!(report.stats["call_graph_edges"], json!(1));
        assert_eq!(report.trace_files, vec!["/app/main.go".to_string()]);

        let cg = report.call_graph.unwrap();
        assert_eq!(cg.entry_point.as_deref(), Some("main.run"));
        assert_eq!(cg.edges, vec![CallEdgeOutput { from: 0, to: 1 }]);
    }

    #[test]
    fn generic_log_report_serialises() {
        let log = GenericLog::new(LogFormat::Custom);
        let report = build_report(&result(ParseOutcome::GenericLog(log), None));

        for key in ["entries", "errors", "warnings", "anomalies", "call_graph_nodes"] {
            assert!(report.stats.contains_key(key), "Missing stat key: {key}");
        }
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["analysis"]["mode"], json!("generic-log"));
        assert_eq!(value["analysis"]["data"]["detected_format"], json!("custom"));
        assert!(value["call_graph"].is_null());
        assert!(value["metadata"]["generated_at"].is_string());
    }

    #[test]
    fn write_report_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/report.json");
        let report = build_report(&result(
            ParseOutcome::GenericLog(GenericLog::new(LogFormat::Syslog)),
            None,
        ));

        write_report(&report, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"tracemind_version\""));
    }
}
