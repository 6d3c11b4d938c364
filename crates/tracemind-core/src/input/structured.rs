//! Stack-trace extraction from structured (JSON, CSV/TSV) log exports.

use log::{debug, warn};
use serde::Serialize;
use serde_json::{Map, Value};

use super::delimited::{find_column, parse_records};
use crate::error::Result;

/// Field names a logging platform uses for the parts of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogFields {
    pub text_payload: Option<&'static str>,
    pub json_payload: Option<&'static str>,
    pub message: Option<&'static str>,
    pub stack_trace: Option<&'static str>,
    pub timestamp: Option<&'static str>,
    pub severity: Option<&'static str>,
    pub log_events: Option<&'static str>,
    pub error: Option<&'static str>,
    pub exception: Option<&'static str>,
    pub traceback: Option<&'static str>,
}

/// Google Cloud Logging export.
pub const GCP_LOG_FIELDS: LogFields = LogFields {
    text_payload: Some("textPayload"),
    json_payload: Some("jsonPayload"),
    message: Some("message"),
    stack_trace: Some("stack_trace"),
    timestamp: Some("timestamp"),
    severity: Some("severity"),
    log_events: None,
    error: Some("error"),
    exception: Some("exception"),
    traceback: Some("traceback"),
};

/// AWS CloudWatch Logs export.
pub const AWS_LOG_FIELDS: LogFields = LogFields {
    text_payload: None,
    json_payload: None,
    message: Some("@message"),
    stack_trace: None,
    timestamp: Some("@timestamp"),
    severity: None,
    log_events: Some("logEvents"),
    error: Some("errorMessage"),
    exception: Some("exception"),
    traceback: Some("stackTrace"),
};

/// Field names commonly holding a whole trace, tried after the explicit ones.
const TRACE_FIELDS: &[&str] = &[
    "exception",
    "traceback",
    "stacktrace",
    "stack_trace",
    "error.stack",
    "err.stack",
];

const TEXT_COLUMNS: &[&str] = &["textPayload", "message", "text", "log"];

const MAX_SYNTHETIC_FRAMES: usize = 50;

impl LogFields {
    /// AWS fields for records carrying CloudWatch `@` keys, GCP otherwise.
    pub fn for_record(record: &Map<String, Value>) -> &'static LogFields {
        if record.contains_key("@message") || record.contains_key("@timestamp") {
            &AWS_LOG_FIELDS
        } else {
            &GCP_LOG_FIELDS
        }
    }
}

/// One trace pulled out of a structured record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedEntry {
    pub text: String,
    pub timestamp: Option<String>,
    pub severity: Option<String>,
}

/// Heuristic: does this text look like it contains a stack trace?
pub fn looks_like_stack_trace(text: &str) -> bool {
    if text.contains("Traceback (most recent call last)")
        || (text.contains("File \"") && text.contains(", line "))
    {
        return true;
    }
    if text.contains("panic:") || text.contains("goroutine ") {
        return true;
    }
    if text.contains(".go:") && text.contains("+0x") {
        return true;
    }
    if text.contains("    at ") && (text.contains(".js:") || text.contains(".ts:")) {
        return true;
    }
    if (text.contains("at ") && text.contains(".java:"))
        || (text.contains("Exception") && text.contains("\n\tat "))
    {
        return true;
    }
    (text.contains("Error:") || text.contains("Exception:"))
        && (text.contains("\n\t") || text.contains("\n    at "))
}

/// Look up a dot-separated path through nested objects.
fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, key| current.as_object()?.get(key))
}

fn get_str<'a>(value: &'a Value, path: &str) -> Option<&'a str> {
    get_path(value, path)?.as_str()
}

/// Pull trace text from one record, in priority order.
fn extract_trace(record: &Value, f: &LogFields) -> Option<String> {
    let accept = |path: &str| get_str(record, path).filter(|t| looks_like_stack_trace(t));

    if let Some(text) = f.text_payload.and_then(accept) {
        return Some(text.to_string());
    }
    if let Some(text) = f.stack_trace.and_then(|p| get_str(record, p)) {
        if !text.trim().is_empty() {
            return Some(text.to_string());
        }
    }
    let mut trace_fields = f
        .exception
        .into_iter()
        .chain(f.traceback)
        .chain(TRACE_FIELDS.iter().copied());
    if let Some(text) = trace_fields.find_map(accept) {
        return Some(text.to_string());
    }
    if let Some(payload) = f.json_payload {
        let nested = format!("{payload}.{}", f.message.unwrap_or("message"));
        if let Some(text) = accept(nested.as_str()) {
            return Some(text.to_string());
        }
    }
    if let Some(text) = f.message.and_then(accept) {
        return Some(text.to_string());
    }
    f.error.and_then(accept).map(str::to_string)
}

fn entry_from_record(record: &Value, fields: Option<&LogFields>) -> Option<ExtractedEntry> {
    let obj = record.as_object()?;
    let f = fields.unwrap_or_else(|| LogFields::for_record(obj));
    let text = extract_trace(record, f)?;
    Some(ExtractedEntry {
        text,
        timestamp: f.timestamp.and_then(|p| get_str(record, p)).map(str::to_string),
        severity: f.severity.and_then(|p| get_str(record, p)).map(str::to_string),
    })
}

/// Extract traces from a list of records, falling back to a synthetic trace
/// built from source-location metadata when none carries trace text.
fn extract_from_records(records: &[Value], fields: Option<&LogFields>) -> Vec<ExtractedEntry> {
    let entries: Vec<_> = records
        .iter()
        .filter_map(|r| entry_from_record(r, fields))
        .collect();
    if !entries.is_empty() {
        debug!("Extracted {} stack traces from {} records", entries.len(), records.len());
        return entries;
    }

    debug!("No stack traces found, trying sourceLocation reconstruction");
    build_synthetic_trace(records)
        .map(|text| ExtractedEntry {
            text,
            timestamp: None,
            severity: Some("ERROR".to_string()),
        })
        .into_iter()
        .collect()
}

/// Records nested under an export's event-list field, e.g. CloudWatch `logEvents`.
fn event_list(value: &Value) -> Option<&Vec<Value>> {
    let obj = value.as_object()?;
    [&GCP_LOG_FIELDS, &AWS_LOG_FIELDS]
        .iter()
        .filter_map(|f| f.log_events)
        .find_map(|key| obj.get(key)?.as_array())
}

/// Extract traces from newline-delimited JSON records. Lines that are not
/// JSON objects are ignored. A single document wrapping an event list is
/// also accepted.
pub fn extract_from_json_lines(content: &str, fields: Option<&LogFields>) -> Vec<ExtractedEntry> {
    if let Ok(document) = serde_json::from_str::<Value>(content) {
        if let Some(events) = event_list(&document) {
            return extract_from_records(events, fields);
        }
    }

    let records: Vec<Value> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter_map(|l| serde_json::from_str::<Value>(l).ok())
        .filter(Value::is_object)
        .collect();
    extract_from_records(&records, fields)
}

/// Extract traces from a JSON array of records.
pub fn extract_from_json_array(content: &str, fields: Option<&LogFields>) -> Result<Vec<ExtractedEntry>> {
    let root: Value = serde_json::from_str(content)?;
    let Some(records) = root.as_array() else {
        warn!("Expected a JSON array of log records");
        return Ok(Vec::new());
    };
    let objects: Vec<Value> = records.iter().filter(|v| v.is_object()).cloned().collect();
    Ok(extract_from_records(&objects, fields))
}

/// Extract traces from a CSV/TSV export with a header row.
pub fn extract_from_delimited(content: &str, delimiter: char) -> Vec<ExtractedEntry> {
    let mut records = parse_records(content, delimiter).into_iter();
    let Some(header) = records.next() else {
        return Vec::new();
    };
    let Some(text_col) = find_column(&header, TEXT_COLUMNS) else {
        warn!("No text column in delimited header");
        return Vec::new();
    };
    let ts_col = find_column(&header, &["timestamp"]);
    let sev_col = find_column(&header, &["severity"]);

    let cell = |row: &[String], col: Option<usize>| {
        col.and_then(|c| row.get(c))
            .filter(|v| !v.is_empty())
            .cloned()
    };

    records
        .filter_map(|row| {
            let text = row.get(text_col)?;
            looks_like_stack_trace(text).then(|| ExtractedEntry {
                text: text.clone(),
                timestamp: cell(row.as_slice(), ts_col),
                severity: cell(row.as_slice(), sev_col),
            })
        })
        .collect()
}

/// Best-effort human message of a GCP record.
fn gcp_message(record: &Value) -> Option<&str> {
    if let Some(payload) = record.get("jsonPayload").and_then(Value::as_object) {
        match payload.get("message") {
            Some(Value::Object(inner)) => {
                if let Some(text) = inner.get("message").and_then(Value::as_str) {
                    return Some(text);
                }
            }
            Some(Value::String(text)) => return Some(text.as_str()),
            _ => {}
        }
        if let Some(text) = payload.get("msg").and_then(Value::as_str) {
            return Some(text);
        }
    }
    get_str(record, "textPayload").or_else(|| get_str(record, "message"))
}

fn is_error_severity(record: &Value) -> bool {
    get_str(record, "severity").is_some_and(|s| {
        ["ERROR", "CRITICAL", "FATAL"]
            .iter()
            .any(|level| s.eq_ignore_ascii_case(level))
    })
}

/// Reconstruct a Go-style trace from GCP `sourceLocation` metadata.
///
/// Returns `None` when there are no usable source locations and no
/// error-like message.
pub fn build_synthetic_trace(records: &[Value]) -> Option<String> {
    let mut trace = String::new();
    let mut found_error = false;

    if let Some(record) = records.iter().find(|r| is_error_severity(r)) {
        if let Some(msg) = gcp_message(record) {
            trace.push_str(&format!("Error: {msg}\n\n"));
        }
        if let Some(cause) = get_str(record, "jsonPayload.message.variables.err") {
            trace.push_str(&format!("Cause: {cause}\n\n"));
        }
        found_error = true;
    } else if let Some(msg) = records.iter().filter_map(gcp_message).find(|m| {
        m.contains("error") || m.contains("Error") || m.contains("fail") || m.contains("Fail")
    }) {
        trace.push_str(&format!("Error: {msg}\n\n"));
        found_error = true;
    }

    trace.push_str("goroutine 1 [running]:\n");

    let mut frames = 0;
    for location in records.iter().filter_map(|r| r.get("sourceLocation")) {
        let (Some(function), Some(file)) = (
            location.get("function").and_then(Value::as_str),
            location.get("file").and_then(Value::as_str),
        ) else {
            continue;
        };
        let line = match location.get("line") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) if n.is_i64() || n.is_u64() => n.to_string(),
            _ => "0".to_string(),
        };
        trace.push_str(&format!("{function}(...)\n\t{file}:{line} +0x0\n"));
        frames += 1;
        if frames >= MAX_SYNTHETIC_FRAMES {
            break;
        }
    }

    if frames == 0 && !found_error {
        return None;
    }
    debug!("Built synthetic trace with {frames} frames");
    Some(trace)
}
