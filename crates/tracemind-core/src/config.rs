//! Core data types and configuration for TraceMind analysis.

use serde::{Deserialize, Serialize};

/// Language a stack trace or source file belongs to.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Go,
    Node,
    #[default]
    Unknown,
}

impl Language {
    /// Every concrete language, in the fixed enumeration order used for tie-breaks.
    pub const ALL: [Language; 3] = [Language::Python, Language::Go, Language::Node];

    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => "Python",
            Self::Go => "Go",
            Self::Node => "Node.js",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence that a piece of text belongs to a language, capped at 100.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LangScore {
    pub language: Language,
    pub score: u8,
}

/// A single frame in a stack trace.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackFrame {
    pub function: Option<String>,
    pub file: Option<String>,
    /// 1-based line, 0 when unknown.
    pub line: u32,
    /// 1-based column, 0 when unknown.
    pub column: u32,
    pub module: Option<String>,
    pub context: Option<String>,
    #[serde(default)]
    pub is_stdlib: bool,
    #[serde(default)]
    pub is_third_party: bool,
}

/// A parsed stack trace: error header plus ordered frames.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackTrace {
    pub language: Language,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
    #[serde(default)]
    pub frames: Vec<StackFrame>,
    pub raw_trace: String,
}

impl StackTrace {
    pub fn new(language: Language, raw_trace: &str) -> Self {
        Self {
            language,
            raw_trace: raw_trace.to_string(),
            ..Default::default()
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

/// Coarse shape of the raw input bytes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum InputFormat {
    #[default]
    Auto,
    Raw,
    Json,
    JsonArray,
    Csv,
    Tsv,
}

impl InputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Raw => "raw",
            Self::Json => "json",
            Self::JsonArray => "json-array",
            Self::Csv => "csv",
            Self::Tsv => "tsv",
        }
    }
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log format family, used to pick a line-level parser.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    #[default]
    Unknown,
    StackTrace,
    Nginx,
    Apache,
    Syslog,
    Docker,
    Kubernetes,
    JsonStructured,
    Custom,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::StackTrace => "stack-trace",
            Self::Nginx => "nginx",
            Self::Apache => "apache",
            Self::Syslog => "syslog",
            Self::Docker => "docker",
            Self::Kubernetes => "kubernetes",
            Self::JsonStructured => "json-structured",
            Self::Custom => "custom",
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which model an input was parsed into.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisMode {
    StackTrace,
    GenericLog,
}

/// One line of a log, in the format-agnostic model.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenericLogEntry {
    /// Verbatim timestamp text, any format.
    pub timestamp: Option<String>,
    pub severity: Option<String>,
    pub message: String,
    pub source: Option<String>,
    pub raw_line: String,
    /// 1-based line number in the input.
    pub line_number: usize,
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub relevance_score: f64,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub is_anomaly: bool,
}

/// Ordered collection of log entries with aggregate counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenericLog {
    #[serde(default)]
    pub entries: Vec<GenericLogEntry>,
    pub detected_format: LogFormat,
    #[serde(default)]
    pub error_signatures: Vec<String>,
    pub time_range_start: Option<String>,
    pub time_range_end: Option<String>,
    #[serde(default)]
    pub total_errors: usize,
    #[serde(default)]
    pub total_warnings: usize,
    #[serde(default)]
    pub total_info: usize,
}

/// Configuration for an analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Repository root; discovered from the trace when absent.
    pub repo_path: Option<String>,
    #[serde(default)]
    pub input_format: InputFormat,
    #[serde(default)]
    pub include_stdlib: bool,
    #[serde(default = "default_build_call_graph")]
    pub build_call_graph: bool,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_build_call_graph() -> bool {
    true
}
fn default_max_file_size() -> u64 {
    1_000_000
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            repo_path: None,
            input_format: InputFormat::Auto,
            include_stdlib: false,
            build_call_graph: default_build_call_graph(),
            max_file_size: default_max_file_size(),
        }
    }
}
