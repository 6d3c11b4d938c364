//! Crash-path call graph construction against the fixture repositories.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use tracemind_core::ast::TreeSitterProvider;
use tracemind_core::config::{Language, StackFrame};
use tracemind_core::graph::{CallGraph, CallGraphBuilder};
use tracemind_core::languages::{parse_stack_trace, parse_trace_as};

fn names(graph: &CallGraph) -> Vec<String> {
    graph.nodes().map(|n| n.name.clone()).collect()
}

fn python_frames() -> Vec<StackFrame> {
    parse_fixture_trace("traces/python_app_traceback.txt").frames
}

fn go_frames() -> Vec<StackFrame> {
    let root = fixture_path("go_app").display().to_string();
    let trace = format!(
        "panic: runtime error: index out of range [3] with length 3\n\n\
goroutine 1 [running]:\n\
main.processItems({{0xc000012345, 0x3, 0x3}})\n\t{root}/main.go:19 +0x1d\n\
main.(*Server).Handle(0xc000010018, 0x2)\n\t{root}/main.go:13 +0x3a\n\
main.main()\n\t{root}/main.go:26 +0x25\n"
    );
    parse_stack_trace(&trace).unwrap().frames
}

// ===========================================================================
// Per-language crash paths (3 tests)
// ===========================================================================

#[test]
fn python_crash_path() {
    let provider = TreeSitterProvider::new();
    let mut builder = CallGraphBuilder::new(fixture_path("python_app"), &provider);
    let graph = builder.build(&python_frames());

    assert_eq!(names(&graph), vec!["process_request", "handle", "_run_query"]);
    assert_eq!(graph.edges(), vec![(0, 1), (1, 2)]);
    assert_eq!(graph.entry_point().unwrap().name, "process_request");
    assert_eq!(graph.entry_point().unwrap().complexity, 2);
    assert_eq!(builder.cached_files(), 2);
}

#[test]
fn go_crash_path() {
    let provider = TreeSitterProvider::new();
    let mut builder = CallGraphBuilder::new(fixture_path("go_app"), &provider);
    let graph = builder.build(&go_frames());

    assert_eq!(
        names(&graph),
        vec!["main.processItems", "main.(*Server).Handle", "main.main"]
    );
    let complexities: Vec<u32> = graph.nodes().map(|n| n.complexity).collect();
    assert_eq!(complexities, vec![2, 3, 1]);
    assert_eq!(graph.edge_count(), 2);
}

#[test]
fn node_crash_path_skips_dependencies() {
    let root = fixture_path("node_app").display().to_string();
    let trace = format!(
        "TypeError: Cannot read property 'id' of undefined\n    \
at UserService.getUser ({root}/services/user.js:13:22)\n    \
at showUser ({root}/routes/users.js:5:27)\n    \
at Layer.handle [as handle_request] ({root}/node_modules/express/lib/router/layer.js:95:5)\n"
    );
    let frames = parse_stack_trace(&trace).unwrap().frames;
    assert_eq!(frames.len(), 3);

    let provider = TreeSitterProvider::new();
    let graph = CallGraphBuilder::new(fixture_path("node_app"), &provider).build(&frames);
    assert_eq!(names(&graph), vec!["UserService.getUser", "showUser"]);
    assert_eq!(graph.edges(), vec![(0, 1)]);
}

// ===========================================================================
// Graph shape (4 tests)
// ===========================================================================

#[test]
fn builds_are_deterministic() {
    let provider = TreeSitterProvider::new();
    let frames = go_frames();

    let mut builder = CallGraphBuilder::new(fixture_path("go_app"), &provider);
    let first = builder.build(&frames);
    let second = builder.build(&frames);
    let fresh = CallGraphBuilder::new(fixture_path("go_app"), &provider).build(&frames);

    for graph in [&second, &fresh] {
        assert_eq!(graph.node_count(), first.node_count());
        assert_eq!(graph.edge_count(), first.edge_count());
        assert_eq!(graph.entry_point(), first.entry_point());
        assert_eq!(graph.edges(), first.edges());
    }
}

#[test]
fn recursive_frames_stay_a_linear_chain() {
    let trace = "Traceback (most recent call last):\n  \
File \"handlers.py\", line 7, in handle\n  \
File \"handlers.py\", line 13, in _run_query\n  \
File \"handlers.py\", line 7, in handle\n\
RecursionError: maximum recursion depth exceeded\n";
    let frames = parse_trace_as(trace, Language::Python).unwrap().frames;

    let provider = TreeSitterProvider::new();
    let graph = CallGraphBuilder::new(fixture_path("python_app"), &provider).build(&frames);
    assert_eq!(graph.node_count(), 3);
    assert_eq!(names(&graph), vec!["handle", "_run_query", "handle"]);
    assert_eq!(graph.edges(), vec![(0, 1), (1, 2)]);
    assert_eq!(graph.entry_point().unwrap().name, "handle");
    assert_eq!(graph.entry_point_index().map(|i| i.index()), Some(0));
}

#[test]
fn relative_repo_root_caches_absolute_paths() {
    let provider = TreeSitterProvider::new();
    let mut builder = CallGraphBuilder::new("../../tests/fixtures/python_app", &provider);
    let graph = builder.build(&python_frames());

    assert_eq!(graph.node_count(), 3);
    assert_eq!(builder.cached_files(), 2);
    for node in graph.nodes() {
        assert!(std::path::Path::new(&node.file).is_absolute(), "{}", node.file);
    }
}

#[test]
fn unresolvable_frames_are_skipped() {
    let trace = "Traceback (most recent call last):\n  \
File \"main.py\", line 7, in process_request\n  \
File \"missing.py\", line 3, in ghost\n  \
File \"/venv/lib/python3.11/site-packages/lib.py\", line 9, in helper\n  \
File \"handlers.py\", line 7, in handle\n\
ValueError: bad\n";
    let frames = parse_stack_trace(trace).unwrap().frames;
    assert_eq!(frames.len(), 4);

    let provider = TreeSitterProvider::new();
    let graph = CallGraphBuilder::new(fixture_path("python_app"), &provider).build(&frames);
    assert_eq!(names(&graph), vec!["process_request", "handle"]);
    assert_eq!(graph.edges(), vec![(0, 1)]);
}
