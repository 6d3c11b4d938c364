//! End-to-end analysis runs and report generation.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::*;
use pretty_assertions::assert_eq;
use tracemind_core::ast::TreeSitterProvider;
use tracemind_core::config::{AnalysisConfig, AnalysisMode};
use tracemind_core::output::build_report;
use tracemind_core::pipeline::{run_analysis, ProgressCallback};

fn config_for(app: &str) -> AnalysisConfig {
    AnalysisConfig {
        repo_path: Some(fixture_path(app).to_string_lossy().to_string()),
        ..Default::default()
    }
}

fn recording_callback() -> (ProgressCallback, Rc<RefCell<Vec<String>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let callback: ProgressCallback = Box::new(move |phase, _label| {
        sink.borrow_mut().push(phase.to_string());
    });
    (callback, seen)
}

// ===========================================================================
// Pipeline orchestration (5 tests)
// ===========================================================================

#[test]
fn trace_run_builds_call_graph() {
    let input = read_fixture("traces/python_app_traceback.txt");
    let provider = TreeSitterProvider::new();
    let (callback, seen) = recording_callback();

    let result = run_analysis(input.as_bytes(), &config_for("python_app"), &provider, Some(callback))
        .unwrap();

    assert_eq!(result.outcome.mode(), AnalysisMode::StackTrace);
    assert_eq!(result.call_graph.as_ref().unwrap().node_count(), 3);
    assert_eq!(*seen.borrow(), vec!["parsing", "call_graph"]);
    assert!(result.timings.contains_key("parsing"));
    assert!(result.timings.contains_key("call_graph"));
    assert!(result.total_ms >= 0.0);
}

#[test]
fn log_run_skips_call_graph() {
    let input = read_fixture("traces/app.log");
    let provider = TreeSitterProvider::new();
    let (callback, seen) = recording_callback();

    let result = run_analysis(input.as_bytes(), &config_for("python_app"), &provider, Some(callback))
        .unwrap();

    assert_eq!(result.outcome.mode(), AnalysisMode::GenericLog);
    assert!(result.call_graph.is_none());
    assert!(result.repo_root.is_none());
    assert_eq!(*seen.borrow(), vec!["parsing"]);
}

#[test]
fn call_graph_can_be_disabled() {
    let input = read_fixture("traces/python_app_traceback.txt");
    let config = AnalysisConfig {
        build_call_graph: false,
        ..config_for("python_app")
    };
    let result = run_analysis(input.as_bytes(), &config, &TreeSitterProvider::new(), None).unwrap();

    assert!(result.call_graph.is_none());
    assert_eq!(result.repo_root, Some(fixture_path("python_app")));
}

#[test]
fn repo_root_is_discovered_from_frames() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join(".git")).unwrap();
    std::fs::create_dir_all(dir.path().join("svc")).unwrap();
    let file = dir.path().join("svc/worker.py");
    std::fs::write(&file, "def run(job):\n    return job.start()\n").unwrap();

    let input = format!(
        "Traceback (most recent call last):\n  File \"{}\", line 2, in run\nAttributeError: 'NoneType' object has no attribute 'start'\n",
        file.display()
    );
    let result = run_analysis(
        input.as_bytes(),
        &AnalysisConfig::default(),
        &TreeSitterProvider::new(),
        None,
    )
    .unwrap();

    assert_eq!(result.repo_root.as_deref(), Some(dir.path()));
    let graph = result.call_graph.unwrap();
    assert_eq!(graph.entry_point().unwrap().name, "run");
}

#[test]
fn empty_input_fails() {
    let result = run_analysis(b"   ", &AnalysisConfig::default(), &TreeSitterProvider::new(), None);
    assert!(result.is_err());
}

// ===========================================================================
// Report (2 tests)
// ===========================================================================

#[test]
fn trace_report_snapshot() {
    let input = read_fixture("traces/python_app_traceback.txt");
    let result = run_analysis(
        input.as_bytes(),
        &config_for("python_app"),
        &TreeSitterProvider::new(),
        None,
    )
    .unwrap();
    let report = build_report(&result);

    assert_eq!(report.trace_files, vec!["main.py", "handlers.py"]);
    assert_eq!(report.stats["frames"], serde_json::json!(3));
    assert_eq!(report.stats["call_graph_nodes"], serde_json::json!(3));

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["analysis"]["mode"], "stack-trace");
    assert_eq!(value["analysis"]["data"]["language"], "python");
    assert_eq!(value["call_graph"]["entry_point"], "process_request");
    assert_eq!(value["call_graph"]["edges"][1]["from"], 1);
    assert!(value["metadata"]["phase_timings"]["call_graph"].is_number());
}

#[test]
fn log_report_snapshot() {
    let input = read_fixture("traces/app.log");
    let result = run_analysis(input.as_bytes(), &AnalysisConfig::default(), &TreeSitterProvider::new(), None)
        .unwrap();
    let report = build_report(&result);

    assert!(report.trace_files.is_empty());
    assert!(report.call_graph.is_none());
    assert_eq!(report.stats["entries"], serde_json::json!(7));
    assert_eq!(report.stats["errors"], serde_json::json!(2));
    assert_eq!(report.metadata["mode"], serde_json::json!("generic-log"));
}
