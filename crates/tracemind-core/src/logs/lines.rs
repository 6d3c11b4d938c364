//! Per-family line parsers. Each returns `None` when the line does not fit
//! its family, and the caller keeps the raw line instead.

use serde_json::Value;

const TIMESTAMP_KEYS: &[&str] = &["timestamp", "time", "@timestamp", "ts", "datetime", "date"];
const SEVERITY_KEYS: &[&str] = &["level", "severity", "loglevel", "log_level", "lvl"];
const MESSAGE_KEYS: &[&str] = &["message", "msg", "@message", "text", "log"];
const SOURCE_KEYS: &[&str] = &["source", "logger", "service", "component", "name"];

/// Syslog severities indexed by `priority & 7`.
const SYSLOG_LEVELS: [&str; 8] = [
    "EMERG", "ALERT", "CRITICAL", "ERROR", "WARNING", "NOTICE", "INFO", "DEBUG",
];

/// Severity keywords recognised at the start of a generic line.
const LEVEL_KEYWORDS: &[&str] = &[
    "ERROR", "WARN", "WARNING", "INFO", "DEBUG", "FATAL", "CRITICAL", "TRACE", "NOTICE",
];

const MAX_SYSLOG_TIMESTAMP: usize = 30;

/// Fields pulled out of one log line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLine {
    pub timestamp: Option<String>,
    pub severity: Option<String>,
    pub message: String,
    pub source: Option<String>,
    pub metadata: Option<Value>,
}

fn first_string(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}

/// One JSON object per line. The whole object is kept as metadata; without a
/// message field the message is the object's compact serialisation.
pub fn parse_json_line(line: &str) -> Option<ParsedLine> {
    let value: Value = serde_json::from_str(line).ok()?;
    let obj = value.as_object()?;

    Some(ParsedLine {
        timestamp: first_string(obj, TIMESTAMP_KEYS),
        severity: first_string(obj, SEVERITY_KEYS),
        message: first_string(obj, MESSAGE_KEYS).unwrap_or_else(|| value.to_string()),
        source: first_string(obj, SOURCE_KEYS),
        metadata: Some(value.clone()),
    })
}

/// `<pri>timestamp source: message`. The priority is optional; the `": "`
/// separator is not.
pub fn parse_syslog_line(line: &str) -> Option<ParsedLine> {
    if line.len() < 10 {
        return None;
    }

    let mut rest = line;
    let mut severity = None;
    if let Some(after) = line.strip_prefix('<') {
        let digits = after.find(|c: char| !c.is_ascii_digit()).unwrap_or(after.len());
        if digits > 0 && after[digits..].starts_with('>') {
            if let Ok(priority) = after[..digits].parse::<u64>() {
                severity = Some(SYSLOG_LEVELS[(priority & 0x7) as usize].to_string());
            }
            rest = &after[digits + 1..];
        }
    }

    let colon = rest.find(": ")?;
    let mut parsed = ParsedLine {
        severity,
        message: rest[colon + 2..].to_string(),
        ..Default::default()
    };

    if let Some(space) = rest[..colon].find(' ') {
        parsed.timestamp = Some(rest[..space].chars().take(MAX_SYSLOG_TIMESTAMP).collect());
        parsed.source = Some(rest[space + 1..colon].to_string());
    }
    Some(parsed)
}

/// `YYYY-MM-DD[T ]HH:MM:SS` prefix, as the 19 leading characters.
fn iso_timestamp(line: &str) -> Option<&str> {
    let b = line.as_bytes();
    let shaped = b.len() > 19
        && b[4] == b'-'
        && b[7] == b'-'
        && (b[10] == b'T' || b[10] == b' ')
        && b[13] == b':';
    if shaped {
        line.get(..19)
    } else {
        None
    }
}

/// Skip fractional seconds, `Z` and offsets after the timestamp, then spaces.
fn skip_timestamp_tail(rest: &str) -> &str {
    let b = rest.as_bytes();
    let mut i = 0;
    while i < b.len() {
        let c = b[i];
        if c == b' ' && b.get(i + 1) != Some(&b' ') {
            break;
        }
        if !(c == b' ' || c == b'Z' || c == b'+' || c == b'-' || c == b'.' || c == b':' || c.is_ascii_digit()) {
            break;
        }
        i += 1;
    }
    rest[i..].trim_start_matches(' ')
}

/// `[LEVEL] rest` or `LEVEL: rest` / `LEVEL rest`, case-insensitively.
fn level_prefix(rest: &str) -> Option<(&'static str, &str)> {
    for &level in LEVEL_KEYWORDS {
        let n = level.len();
        if let Some(inner) = rest.strip_prefix('[') {
            let matches = inner.get(..n).is_some_and(|h| h.eq_ignore_ascii_case(level))
                && inner.as_bytes().get(n) == Some(&b']');
            if matches {
                return Some((level, inner[n + 1..].trim_start_matches(' ')));
            }
        } else {
            let matches = rest.get(..n).is_some_and(|h| h.eq_ignore_ascii_case(level))
                && matches!(rest.as_bytes().get(n), Some(b':' | b' ' | b'\t'));
            if matches {
                let after = &rest[n..];
                let after = after.strip_prefix(':').unwrap_or(after);
                return Some((level, after.trim_start_matches(' ')));
            }
        }
    }
    None
}

/// Free-form line: optional ISO timestamp, optional severity keyword, then
/// the message. A line with nothing left for the message does not parse.
pub fn parse_generic_line(line: &str) -> Option<ParsedLine> {
    if line.len() < 3 {
        return None;
    }

    let mut parsed = ParsedLine::default();
    let mut rest = line;

    if let Some(ts) = iso_timestamp(line) {
        parsed.timestamp = Some(ts.to_string());
        rest = skip_timestamp_tail(&line[19..]);
    }

    if let Some((level, after)) = level_prefix(rest) {
        parsed.severity = Some(level.to_string());
        rest = after;
    }

    if rest.is_empty() {
        return None;
    }
    parsed.message = rest.to_string();
    Some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_aliases() {
        let line = r#"{"ts":"2024-01-01T00:00:00Z","lvl":"error","msg":"db down","logger":"pool"}"#;
        let parsed = parse_json_line(line).unwrap();
        assert_eq!(parsed.timestamp.as_deref(), Some("2024-01-01T00:00:00Z"));
        assert_eq!(parsed.severity.as_deref(), Some("error"));
        assert_eq!(parsed.message, "db down");
        assert_eq!(parsed.source.as_deref(), Some("pool"));
        assert!(parsed.metadata.unwrap().is_object());
    }

    #[test]
    fn json_without_message_is_serialised() {
        let parsed = parse_json_line(r#"{"level":"info","count":3}"#).unwrap();
        assert_eq!(parsed.message, r#"{"count":3,"level":"info"}"#);
        assert!(parse_json_line("[1,2]").is_none());
        assert!(parse_json_line("{broken").is_none());
    }

    #[test]
    fn syslog_with_priority() {
        let parsed = parse_syslog_line("<11>2024-01-15T10:30:00Z web-01 nginx: upstream timed out").unwrap();
        assert_eq!(parsed.severity.as_deref(), Some("ERROR"));
        assert_eq!(parsed.timestamp.as_deref(), Some("2024-01-15T10:30:00Z"));
        assert_eq!(parsed.source.as_deref(), Some("web-01 nginx"));
        assert_eq!(parsed.message, "upstream timed out");
    }

    #[test]
    fn syslog_needs_separator() {
        assert!(parse_syslog_line("<13>no separator here").is_none());
        assert!(parse_syslog_line("short: x").is_none());
    }

    #[test]
    fn generic_timestamp_and_level() {
        let parsed = parse_generic_line("2024-01-15T10:30:00.123Z [ERROR] connection refused").unwrap();
        assert_eq!(parsed.timestamp.as_deref(), Some("2024-01-15T10:30:00"));
        assert_eq!(parsed.severity.as_deref(), Some("ERROR"));
        assert_eq!(parsed.message, "connection refused");

        let parsed = parse_generic_line("2024-01-15 10:30:00  warning: disk at 91%").unwrap();
        assert_eq!(parsed.severity.as_deref(), Some("WARNING"));
        assert_eq!(parsed.message, "disk at 91%");
    }

    #[test]
    fn generic_plain_message() {
        let parsed = parse_generic_line("server started on :8080").unwrap();
        assert_eq!(parsed.timestamp, None);
        assert_eq!(parsed.severity, None);
        assert_eq!(parsed.message, "server started on :8080");

        let parsed = parse_generic_line("INFORMATION only").unwrap();
        assert_eq!(parsed.severity, None);
    }

    #[test]
    fn generic_without_message_fails() {
        assert!(parse_generic_line("2024-01-15T10:30:00Z").is_none());
        assert!(parse_generic_line("ok").is_none());
    }
}
