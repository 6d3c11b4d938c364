//! Log format-family detection.

use crate::config::LogFormat;

const MAX_SAMPLE: usize = 20;

const KUBERNETES_MARKERS: &[&str] = &["kube-", "pod/", "namespace=", "kubernetes"];

/// Whether the content contains a stack trace anywhere.
pub fn has_stack_trace_patterns(content: &str) -> bool {
    if content.contains("Traceback (most recent call last)")
        || (content.contains("File \"") && content.contains(", line "))
    {
        return true;
    }
    if content.contains("panic:") || (content.contains("goroutine ") && content.contains(".go:")) {
        return true;
    }
    if content.contains("    at ") && (content.contains(".js:") || content.contains(".ts:")) {
        return true;
    }
    (content.contains("\n\tat ") && content.contains(".java:"))
        || content.contains("Exception in thread")
}

fn is_json_line(line: &str) -> bool {
    line.starts_with('{') && line.len() > 2
}

/// `1.2.3.4 - - [date] "GET / HTTP/1.1" ...`: a bracket before the first
/// quote, with a dot before the bracket.
fn is_nginx_line(line: &str) -> bool {
    if line.len() <= 20 {
        return false;
    }
    match (line.find('['), line.find('"')) {
        (Some(bracket), Some(quote)) => bracket < quote && line[..bracket].contains('.'),
        _ => false,
    }
}

/// `<pri>...` or `Mon ...`, with a `: ` somewhere on the line.
fn is_syslog_line(line: &str) -> bool {
    if line.len() <= 15 {
        return false;
    }
    let b = line.as_bytes();
    let prefix = b[0] == b'<' || (b[..3].iter().all(u8::is_ascii_alphabetic) && b[3] == b' ');
    prefix && line.contains(": ")
}

/// `2024-01-15T10:30:00.000 stdout message`, or a docker/container mention.
fn is_docker_line(line: &str) -> bool {
    if line.len() <= 30 {
        return false;
    }
    let stream = &line.as_bytes()[23..31];
    stream == b" stdout " || stream == b" stderr " || line.contains("docker") || line.contains("container")
}

/// Classify a log stream by sampling its first non-blank lines.
///
/// Stack-trace patterns anywhere in the content win outright. Otherwise the
/// majority family among the sample is chosen (Docker needs only a third),
/// then Kubernetes markers, then [`LogFormat::Custom`].
pub fn detect_log_format(content: &str) -> LogFormat {
    if content.trim().is_empty() {
        return LogFormat::Unknown;
    }
    if has_stack_trace_patterns(content) {
        return LogFormat::StackTrace;
    }

    let sample: Vec<&str> = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(MAX_SAMPLE)
        .collect();
    let n = sample.len();
    let count = |pred: fn(&str) -> bool| sample.iter().filter(|l| pred(l)).count();

    if count(is_json_line) * 2 > n {
        return LogFormat::JsonStructured;
    }
    if count(is_nginx_line) * 2 > n {
        return LogFormat::Nginx;
    }
    if count(is_syslog_line) * 2 > n {
        return LogFormat::Syslog;
    }
    if n > 0 && count(is_docker_line) * 3 >= n {
        return LogFormat::Docker;
    }
    if KUBERNETES_MARKERS.iter().any(|m| content.contains(m)) {
        return LogFormat::Kubernetes;
    }
    LogFormat::Custom
}
