//! Go language analyser.

use std::sync::LazyLock;

use log::warn;
use regex::Regex;

use super::{parse_number, LanguageAnalyser};
use crate::ast::tree::Node;
use crate::config::{Language, StackTrace};
use crate::error::{Result, TraceMindError};

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(panic|Error|error): (.*)$").unwrap());

/// `pkg.Func(args)`; the name runs to the opening paren of the argument
/// list, so receivers like `pkg.(*T).Method` stay whole.
static FUNC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)\([^()]*\)\s*$").unwrap());

static LOCATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+([^:]+\.go):([0-9]+)").unwrap());

pub struct GoAnalyser;

impl Default for GoAnalyser {
    fn default() -> Self {
        Self
    }
}

impl GoAnalyser {
    pub fn new() -> Self {
        Self
    }

    fn get_name_by_kind<'s>(node: Node<'_>, target_kind: &str, source: &'s [u8]) -> Option<&'s str> {
        node.children()
            .find(|c| c.kind() == target_kind)
            .and_then(|c| c.utf8_text(source).ok())
    }

    /// Package declared by the file containing `node`.
    fn package_name<'s>(node: Node<'_>, source: &'s [u8]) -> Option<&'s str> {
        let mut root = node;
        while let Some(parent) = root.parent() {
            root = parent;
        }
        root.children()
            .find(|c| c.kind() == "package_clause")
            .and_then(|clause| Self::get_name_by_kind(clause, "package_identifier", source))
    }

    /// Receiver of a method declaration, rendered as `(*T)` or `T`.
    fn receiver(node: Node<'_>, source: &[u8]) -> Option<String> {
        let param = node
            .child_by_field_name("receiver")?
            .children()
            .find(|c| c.kind() == "parameter_declaration")?;
        let ty = param.child_by_field_name("type")?.utf8_text(source).ok()?;
        // Drop type arguments from generic receivers.
        let ty = ty.split('[').next().unwrap_or(ty).trim();
        match ty.strip_prefix('*') {
            Some(inner) => Some(format!("(*{})", inner.trim())),
            None => Some(ty.to_string()),
        }
    }
}

impl LanguageAnalyser for GoAnalyser {
    fn language(&self) -> Language {
        Language::Go
    }

    fn extensions(&self) -> &[&str] {
        &["go"]
    }

    fn parse_trace(&self, input: &str) -> Result<StackTrace> {
        let mut trace = StackTrace::new(Language::Go, input);

        if let Some(caps) = HEADER_RE.captures(input) {
            trace.error_type = Some(caps[1].to_string());
            trace.error_message = Some(caps[2].trim_end().to_string());
        }

        // A function line arms the pairing; the next location line completes
        // the frame. Unrelated lines leave the pending function in place.
        let mut pending: Option<&str> = None;
        for line in input.lines() {
            if let Some(caps) = FUNC_RE.captures(line) {
                pending = caps.get(1).map(|m| m.as_str());
            } else if let Some(caps) = LOCATION_RE.captures(line) {
                if let Some(function) = pending.take() {
                    trace
                        .frames
                        .push(self.frame(function, &caps[1], parse_number(&caps[2]), 0));
                }
            }
        }

        if trace.frames.is_empty() {
            warn!("No frames found in Go trace");
            return Err(TraceMindError::ParseFailure("no frames found in Go trace".into()));
        }
        Ok(trace)
    }

    fn is_stdlib_path(&self, path: &str) -> bool {
        path.starts_with("/usr/local/go/src/") || path.contains("GOROOT")
    }

    fn is_third_party_path(&self, path: &str) -> bool {
        path.contains("/pkg/mod/") || path.contains("vendor/")
    }

    fn function_kinds(&self) -> &[&str] {
        &["function_declaration", "method_declaration"]
    }

    fn call_kinds(&self) -> &[&str] {
        &["call_expression"]
    }

    fn qualified_name(&self, node: Node<'_>, source: &[u8], name: &str, _scopes: &[String]) -> String {
        let receiver = if node.kind() == "method_declaration" {
            Self::receiver(node, source)
        } else {
            None
        };
        let local = match receiver {
            Some(recv) => format!("{recv}.{name}"),
            None => name.to_string(),
        };
        match Self::package_name(node, source) {
            Some(pkg) => format!("{pkg}.{local}"),
            None => local,
        }
    }
}
