//! Relevance scoring and error filtering for generic logs.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::{GenericLog, GenericLogEntry};

/// Entries scoring at or above this are flagged as anomalies.
pub const ANOMALY_THRESHOLD: f64 = 0.5;

const ERROR_BASE: f64 = 0.4;
const WARNING_BASE: f64 = 0.15;

/// Message keywords and the weight each adds, matched case-insensitively.
const KEYWORD_WEIGHTS: &[(&str, f64)] = &[
    ("crash", 0.5),
    ("panic", 0.5),
    ("fatal", 0.5),
    ("segfault", 0.5),
    ("exception", 0.4),
    ("critical", 0.4),
    ("oom", 0.4),
    ("out of memory", 0.4),
    ("502", 0.35),
    ("503", 0.35),
    ("error", 0.3),
    ("failed", 0.3),
    ("failure", 0.3),
    ("connection reset", 0.3),
    ("500", 0.3),
    ("timeout", 0.25),
    ("refused", 0.25),
    ("denied", 0.2),
];

static HEX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"0[xX][0-9a-fA-F]+").unwrap());
static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").unwrap());

/// Score one entry in `[0.0, 1.0]` from its flags and message keywords.
pub fn score_entry(entry: &GenericLogEntry) -> f64 {
    let mut score = if entry.is_error {
        ERROR_BASE
    } else if entry
        .severity
        .as_deref()
        .is_some_and(|s| s.eq_ignore_ascii_case("WARN") || s.eq_ignore_ascii_case("WARNING"))
    {
        WARNING_BASE
    } else {
        0.0
    };

    let message = entry.message.to_lowercase();
    for (keyword, weight) in KEYWORD_WEIGHTS {
        if message.contains(keyword) {
            score += weight;
        }
    }
    score.min(1.0)
}

/// Collapse numbers and hex literals so repeated errors share one signature.
pub fn normalize_message(message: &str) -> String {
    let message = HEX_RE.replace_all(message.trim(), "<hex>");
    DIGITS_RE.replace_all(&message, "<n>").into_owned()
}

/// Score every entry, flag anomalies and collect distinct error signatures.
pub fn score_relevance(log: &mut GenericLog) {
    let mut seen = HashSet::new();
    log.error_signatures.clear();

    for entry in &mut log.entries {
        entry.relevance_score = score_entry(entry);
        entry.is_anomaly = entry.relevance_score >= ANOMALY_THRESHOLD;

        if entry.is_error || entry.is_anomaly {
            let signature = normalize_message(&entry.message);
            if seen.insert(signature.clone()) {
                log.error_signatures.push(signature);
            }
        }
    }
}

/// A new log holding only the error and anomaly entries, with their scores
/// and flags intact. Counters are recomputed over the kept entries.
pub fn extract_errors(log: &GenericLog) -> GenericLog {
    let mut out = GenericLog::new(log.detected_format);
    for entry in log.entries.iter().filter(|e| e.is_error || e.is_anomaly) {
        out.add_entry(entry.clone());
    }
    out.error_signatures = log.error_signatures.clone();
    out
}
