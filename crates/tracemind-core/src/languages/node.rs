//! Node.js (JavaScript / TypeScript) language analyser.

use std::sync::LazyLock;

use log::warn;
use regex::Regex;

use super::{parse_number, LanguageAnalyser};
use crate::config::{Language, StackTrace};
use crate::error::{Result, TraceMindError};

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([A-Za-z]+Error|[A-Za-z]+Exception): (.*)$").unwrap());

/// `at fn (file:line:col)`, optionally prefixed by `new` or `async` and
/// suffixed by an `[as alias]` annotation.
static NAMED_FRAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\bat (?:new |async )?(\S+)(?: \[as [^\]]+\])? \(((?:node:)?[^:()]+):(\d+):(\d+)\)",
    )
    .unwrap()
});

/// Bare `at file:line:col`.
static BARE_FRAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bat ((?:node:)?[^:\s()]+):(\d+):(\d+)").unwrap());

pub struct NodeAnalyser;

impl Default for NodeAnalyser {
    fn default() -> Self {
        Self
    }
}

impl NodeAnalyser {
    pub fn new() -> Self {
        Self
    }
}

impl LanguageAnalyser for NodeAnalyser {
    fn language(&self) -> Language {
        Language::Node
    }

    fn extensions(&self) -> &[&str] {
        &["js", "mjs", "cjs", "ts", "tsx", "jsx"]
    }

    fn parse_trace(&self, input: &str) -> Result<StackTrace> {
        let mut trace = StackTrace::new(Language::Node, input);

        if let Some(caps) = HEADER_RE.captures(input) {
            trace.error_type = Some(caps[1].to_string());
            trace.error_message = Some(caps[2].trim_end().to_string());
        }

        for line in input.lines() {
            if let Some(caps) = NAMED_FRAME_RE.captures(line) {
                trace.frames.push(self.frame(
                    &caps[1],
                    &caps[2],
                    parse_number(&caps[3]),
                    parse_number(&caps[4]),
                ));
            } else if let Some(caps) = BARE_FRAME_RE.captures(line) {
                trace.frames.push(self.frame(
                    "<anonymous>",
                    &caps[1],
                    parse_number(&caps[2]),
                    parse_number(&caps[3]),
                ));
            }
        }

        if trace.frames.is_empty() {
            warn!("No frames found in Node.js trace");
            return Err(TraceMindError::ParseFailure(
                "no frames found in Node.js trace".into(),
            ));
        }
        Ok(trace)
    }

    fn is_stdlib_path(&self, path: &str) -> bool {
        path.contains("internal/") || path.starts_with("node:")
    }

    fn is_third_party_path(&self, path: &str) -> bool {
        path.contains("node_modules/")
    }

    fn function_kinds(&self) -> &[&str] {
        &["function_declaration", "method_definition"]
    }

    fn call_kinds(&self) -> &[&str] {
        &["call_expression"]
    }

    fn scope_kinds(&self) -> &[&str] {
        &["class_declaration"]
    }
}
