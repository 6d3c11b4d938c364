//! Input handling: format detection, structured extraction and the unified
//! stack-trace / generic-log parse.

pub mod delimited;
pub mod format;
pub mod structured;

use log::{info, warn};
use serde::Serialize;

use crate::config::{AnalysisMode, GenericLog, InputFormat, StackTrace};
use crate::error::{Result, TraceMindError};
use crate::languages::parse_stack_trace;
use crate::logs::{has_stack_trace_patterns, parse_generic_log, score_relevance};

pub use format::{detect_input_format, is_structured};
pub use structured::{looks_like_stack_trace, ExtractedEntry, LogFields, AWS_LOG_FIELDS, GCP_LOG_FIELDS};

/// Result of a unified parse: exactly one of the two models, tagged by the
/// mode actually used.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", content = "data", rename_all = "kebab-case")]
pub enum ParseOutcome {
    StackTrace(StackTrace),
    GenericLog(GenericLog),
}

impl ParseOutcome {
    pub fn mode(&self) -> AnalysisMode {
        match self {
            Self::StackTrace(_) => AnalysisMode::StackTrace,
            Self::GenericLog(_) => AnalysisMode::GenericLog,
        }
    }

    pub fn stack_trace(&self) -> Option<&StackTrace> {
        match self {
            Self::StackTrace(trace) => Some(trace),
            Self::GenericLog(_) => None,
        }
    }

    pub fn generic_log(&self) -> Option<&GenericLog> {
        match self {
            Self::GenericLog(log) => Some(log),
            Self::StackTrace(_) => None,
        }
    }
}

/// Extract structured entries for a known format. Raw input yields nothing.
pub fn extract_entries(content: &[u8], format: InputFormat) -> Vec<ExtractedEntry> {
    let text = String::from_utf8_lossy(content);
    match format {
        InputFormat::Json if text.trim_start().starts_with('[') => {
            extract_entries(content, InputFormat::JsonArray)
        }
        InputFormat::Json => structured::extract_from_json_lines(&text, None),
        InputFormat::JsonArray => match structured::extract_from_json_array(&text, None) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to parse JSON array: {e}");
                Vec::new()
            }
        },
        InputFormat::Csv => structured::extract_from_delimited(&text, ','),
        InputFormat::Tsv => structured::extract_from_delimited(&text, '\t'),
        InputFormat::Auto => extract_entries(content, detect_input_format(content)),
        InputFormat::Raw => Vec::new(),
    }
}

/// Trace text carried by the input: every extracted trace joined with
/// `--- Entry N (timestamp) ---` separators, or the raw content when the
/// input is unstructured or nothing could be extracted.
pub fn extract_stack_traces(content: &[u8], format: InputFormat) -> String {
    let format = match format {
        InputFormat::Auto => detect_input_format(content),
        other => other,
    };
    let raw = || String::from_utf8_lossy(content).into_owned();
    if !is_structured(format) {
        return raw();
    }

    let entries = extract_entries(content, format);
    if entries.is_empty() {
        warn!("No stack traces found in structured log, using raw content");
        return raw();
    }

    let mut out = String::new();
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            out.push_str(&format!("\n\n--- Entry {}", i + 1));
            if let Some(ts) = &entry.timestamp {
                out.push_str(&format!(" ({ts})"));
            }
            out.push_str(" ---\n\n");
        }
        out.push_str(&entry.text);
    }
    info!("Extracted {} stack traces from {format} input", entries.len());
    out
}

/// Parse input as a stack trace when it carries one, otherwise as a generic
/// log. Any failure to parse the extracted trace text, including a trace
/// with no frames, downgrades to generic-log mode.
pub fn unified_parse(content: &[u8], format: InputFormat) -> Result<ParseOutcome> {
    if content.iter().all(u8::is_ascii_whitespace) {
        return Err(TraceMindError::InvalidArgument("empty input".into()));
    }
    let text = String::from_utf8_lossy(content);

    if has_stack_trace_patterns(&text) {
        let traces = extract_stack_traces(content, format);
        match parse_stack_trace(&traces) {
            Ok(trace) if trace.frame_count() > 0 => {
                info!("Parsed {} stack trace with {} frames", trace.language, trace.frame_count());
                return Ok(ParseOutcome::StackTrace(trace));
            }
            Ok(_) => warn!("Stack trace had no frames, falling back to generic log parsing"),
            Err(e) => warn!("Stack trace parse failed ({e}), falling back to generic log parsing"),
        }
    }

    let mut log = parse_generic_log(&text, None);
    if log.entries.is_empty() {
        return Err(TraceMindError::UnrecognizedInput);
    }
    score_relevance(&mut log);
    info!(
        "Parsed generic {} log: {} entries, {} errors",
        log.detected_format,
        log.entries.len(),
        log.total_errors
    );
    Ok(ParseOutcome::GenericLog(log))
}
