//! Python language analyser.

use std::sync::LazyLock;

use log::warn;
use regex::Regex;

use super::{parse_number, LanguageAnalyser};
use crate::config::{Language, StackTrace};
use crate::error::{Result, TraceMindError};

static FRAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"File "([^"]+)", line ([0-9]+)(?:, in (\S+))?"#).unwrap());

static ERROR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([A-Za-z][A-Za-z0-9_]*(?:Error|Exception|Warning)): (.*)$").unwrap()
});

pub struct PythonAnalyser;

impl Default for PythonAnalyser {
    fn default() -> Self {
        Self
    }
}

impl PythonAnalyser {
    pub fn new() -> Self {
        Self
    }

    /// Last unindented line of the trace, used when no line matches the
    /// error header pattern (e.g. dotted exception names).
    fn final_exception_line(input: &str) -> Option<(Option<String>, String)> {
        let line = input
            .lines()
            .rev()
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
            .find(|l| !l.starts_with(char::is_whitespace) && !l.starts_with("Traceback"))?;

        let error_type = match line.split_once(": ") {
            Some((head, _)) if !head.contains(' ') => Some(head.to_string()),
            Some(_) => None,
            None if !line.contains(' ') => Some(line.to_string()),
            None => None,
        };
        Some((error_type, line.to_string()))
    }
}

impl LanguageAnalyser for PythonAnalyser {
    fn language(&self) -> Language {
        Language::Python
    }

    fn extensions(&self) -> &[&str] {
        &["py", "pyw"]
    }

    fn parse_trace(&self, input: &str) -> Result<StackTrace> {
        let mut trace = StackTrace::new(Language::Python, input);

        for caps in FRAME_RE.captures_iter(input) {
            let function = caps.get(3).map_or("<module>", |m| m.as_str());
            trace
                .frames
                .push(self.frame(function, &caps[1], parse_number(&caps[2]), 0));
        }

        if trace.frames.is_empty() {
            warn!("No frames found in Python trace");
            return Err(TraceMindError::ParseFailure(
                "no frames found in Python trace".into(),
            ));
        }

        // Chained tracebacks repeat the header; the last one is the one raised.
        if let Some(caps) = ERROR_RE.captures_iter(input).last() {
            trace.error_type = Some(caps[1].to_string());
            trace.error_message = Some(caps[2].trim_end().to_string());
        } else if let Some((error_type, message)) = Self::final_exception_line(input) {
            trace.error_type = error_type;
            trace.error_message = Some(message);
        }

        Ok(trace)
    }

    fn is_stdlib_path(&self, path: &str) -> bool {
        path.contains("/lib/python") && !self.is_third_party_path(path)
    }

    fn is_third_party_path(&self, path: &str) -> bool {
        path.contains("/site-packages/") || path.contains("/dist-packages/")
    }

    fn function_kinds(&self) -> &[&str] {
        &["function_definition"]
    }

    fn call_kinds(&self) -> &[&str] {
        &["call"]
    }

    fn scope_kinds(&self) -> &[&str] {
        &["class_definition"]
    }
}
