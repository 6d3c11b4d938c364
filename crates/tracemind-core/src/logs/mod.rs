//! Generic (non-trace) log analysis: format detection, line parsing and
//! relevance scoring.

pub mod detect;
pub mod lines;
pub mod scoring;

use log::debug;

use crate::config::{GenericLog, GenericLogEntry, LogFormat};

pub use detect::{detect_log_format, has_stack_trace_patterns};
pub use lines::ParsedLine;
pub use scoring::{extract_errors, normalize_message, score_entry, score_relevance};

const ERROR_SEVERITIES: &[&str] = &["ERROR", "FATAL", "CRITICAL", "EMERG", "ALERT"];
const WARNING_SEVERITIES: &[&str] = &["WARN", "WARNING"];

fn severity_in(severity: &str, set: &[&str]) -> bool {
    set.iter().any(|s| severity.eq_ignore_ascii_case(s))
}

impl GenericLog {
    pub fn new(detected_format: LogFormat) -> Self {
        Self {
            detected_format,
            ..Default::default()
        }
    }

    /// Append an entry, deriving its error flag from the severity and
    /// updating the counters and time range.
    pub fn add_entry(&mut self, mut entry: GenericLogEntry) {
        if let Some(severity) = entry.severity.as_deref() {
            if severity_in(severity, ERROR_SEVERITIES) {
                entry.is_error = true;
                self.total_errors += 1;
            } else if severity_in(severity, WARNING_SEVERITIES) {
                self.total_warnings += 1;
            } else if severity.eq_ignore_ascii_case("INFO") {
                self.total_info += 1;
            }
        }

        if let Some(ts) = &entry.timestamp {
            if self.time_range_start.is_none() {
                self.time_range_start = Some(ts.clone());
            }
            self.time_range_end = Some(ts.clone());
        }
        self.entries.push(entry);
    }
}

fn parse_line(line: &str, format: LogFormat) -> Option<ParsedLine> {
    match format {
        LogFormat::JsonStructured => lines::parse_json_line(line),
        LogFormat::Syslog => lines::parse_syslog_line(line),
        _ => lines::parse_generic_line(line),
    }
}

/// Parse a log into the generic model, one entry per non-blank line.
///
/// `hint` selects the line parser; `None` or [`LogFormat::Unknown`] detects
/// it from the content. Lines the parser rejects are kept with the raw line
/// as their message, so no non-blank line is ever dropped.
pub fn parse_generic_log(content: &str, hint: Option<LogFormat>) -> GenericLog {
    let format = match hint {
        None | Some(LogFormat::Unknown) => detect_log_format(content),
        Some(format) => format,
    };
    let mut log = GenericLog::new(format);

    for (i, line) in content.split('\n').enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() {
            continue;
        }

        let parsed = parse_line(line, format).unwrap_or_else(|| ParsedLine {
            message: line.to_string(),
            ..Default::default()
        });
        log.add_entry(GenericLogEntry {
            timestamp: parsed.timestamp,
            severity: parsed.severity,
            message: parsed.message,
            source: parsed.source,
            raw_line: line.to_string(),
            line_number: i + 1,
            metadata: parsed.metadata,
            ..Default::default()
        });
    }

    debug!(
        "Parsed {} log lines as {format} ({} errors, {} warnings)",
        log.entries.len(),
        log.total_errors,
        log.total_warnings
    );
    log
}
