//! Function, call-site and complexity extraction over a parsed [`SourceFile`].

use serde::Serialize;

use super::source::SourceFile;
use super::tree::{Node, NodeId};
use crate::error::{Result, TraceMindError};
use crate::languages::{LanguageAnalyser, DECISION_KINDS};

/// Callee expressions whose last child names the called member.
const MEMBER_KINDS: &[&str] = &["attribute", "member_expression", "selector_expression"];

/// A function or method definition found in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDef {
    pub name: String,
    pub qualified_name: String,
    pub signature: String,
    /// 1-based.
    pub start_line: usize,
    /// 1-based, inclusive.
    pub end_line: usize,
    /// 0-based.
    pub start_col: usize,
    /// 0-based.
    pub end_col: usize,
    #[serde(skip)]
    pub node: NodeId,
}

impl FunctionDef {
    pub fn contains_line(&self, line: usize) -> bool {
        self.start_line <= line && line <= self.end_line
    }

    fn span(&self) -> usize {
        self.end_line - self.start_line
    }
}

/// A call expression inside a function body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallSite {
    pub callee: String,
    /// 1-based.
    pub line: usize,
    /// 0-based.
    pub column: usize,
}

/// Every function definition in `file`, in document order.
pub fn extract_functions(file: &SourceFile) -> Vec<FunctionDef> {
    let (Some(analyser), Some(root)) = (file.language.analyser(), file.root()) else {
        return Vec::new();
    };
    let mut functions = Vec::new();
    let mut scopes = Vec::new();
    collect_functions(root, file, analyser, &mut scopes, &mut functions);
    functions
}

fn collect_functions(
    node: Node<'_>,
    file: &SourceFile,
    analyser: &dyn LanguageAnalyser,
    scopes: &mut Vec<String>,
    out: &mut Vec<FunctionDef>,
) {
    let kind = node.kind();

    if analyser.function_kinds().contains(&kind) {
        if let Some(def) = function_def(node, file, analyser, scopes) {
            out.push(def);
        }
    }

    let scope = if analyser.scope_kinds().contains(&kind) {
        node.child_by_field_name("name").map(|n| file.text(n).to_string())
    } else {
        None
    };
    let pushed = scope.is_some();
    if let Some(scope) = scope {
        scopes.push(scope);
    }

    for child in node.children() {
        collect_functions(child, file, analyser, scopes, out);
    }

    if pushed {
        scopes.pop();
    }
}

fn function_def(
    node: Node<'_>,
    file: &SourceFile,
    analyser: &dyn LanguageAnalyser,
    scopes: &[String],
) -> Option<FunctionDef> {
    let name = file.text(node.child_by_field_name("name")?);
    if name.is_empty() {
        return None;
    }

    let signature = match node.child_by_field_name("parameters") {
        Some(params) => format!("{name}{}", file.text(params)),
        None => format!("{name}()"),
    };

    Some(FunctionDef {
        name: name.to_string(),
        qualified_name: analyser.qualified_name(node, &file.source, name, scopes),
        signature,
        start_line: node.start_line(),
        end_line: node.end_line(),
        start_col: node.start_position().column,
        end_col: node.end_position().column,
        node: node.id(),
    })
}

/// First function whose bare or qualified name equals `name`.
pub fn find_function(file: &SourceFile, name: &str) -> Result<FunctionDef> {
    extract_functions(file)
        .into_iter()
        .find(|f| f.name == name || f.qualified_name == name)
        .ok_or_else(|| {
            TraceMindError::NotFound(format!("function {name} in {}", file.path.display()))
        })
}

/// Innermost function containing `line`; ties go to the smallest span.
pub fn find_function_at_line(file: &SourceFile, line: usize) -> Option<FunctionDef> {
    extract_functions(file)
        .into_iter()
        .filter(|f| f.contains_line(line))
        .min_by_key(FunctionDef::span)
}

/// Walk the nodes that overlap `[start_line, end_line]`, calling `visit` on
/// those that start inside it. Subtrees wholly outside are not descended.
fn walk_window<'t>(root: Node<'t>, start_line: usize, end_line: usize, mut visit: impl FnMut(Node<'t>)) {
    root.walk(
        &mut |n| n.start_line() <= end_line && n.end_line() >= start_line,
        &mut |n| {
            if n.start_line() >= start_line {
                visit(n)
            }
        },
    );
}

/// Call expressions that start within `[start_line, end_line]`, in document order.
pub fn extract_call_sites(file: &SourceFile, start_line: usize, end_line: usize) -> Vec<CallSite> {
    let (Some(analyser), Some(root)) = (file.language.analyser(), file.root()) else {
        return Vec::new();
    };
    let call_kinds = analyser.call_kinds();

    let mut calls = Vec::new();
    walk_window(root, start_line, end_line, |node| {
        if !call_kinds.contains(&node.kind()) {
            return;
        }
        if let Some(callee) = callee_name(node, file) {
            calls.push(CallSite {
                callee,
                line: node.start_line(),
                column: node.start_position().column,
            });
        }
    });
    calls
}

fn callee_name(call: Node<'_>, file: &SourceFile) -> Option<String> {
    let function = call.child_by_field_name("function")?;
    let target = if function.kind() == "identifier" {
        function
    } else if MEMBER_KINDS.contains(&function.kind()) {
        function.child(function.child_count().checked_sub(1)?)?
    } else {
        return None;
    };
    let text = file.text(target);
    (!text.is_empty()).then(|| text.to_string())
}

/// Cyclomatic complexity of the lines `[start_line, end_line]`: one plus the
/// number of decision points that start inside the window.
pub fn compute_complexity(file: &SourceFile, start_line: usize, end_line: usize) -> u32 {
    let Some(root) = file.root() else {
        return 1;
    };
    let mut decisions = 0;
    walk_window(root, start_line, end_line, |node| {
        if DECISION_KINDS.contains(&node.kind()) {
            decisions += 1;
        }
    });
    1 + decisions
}
