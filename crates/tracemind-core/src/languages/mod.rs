//! Language analyser trait, language detection and the stack-trace parser registry.
//!
//! Each supported language is one variant of [`Language`] backed by one
//! [`LanguageAnalyser`] implementation. The analyser owns everything that is
//! language-specific: the trace grammar, stdlib/third-party path rules and the
//! syntax-tree node kinds used by function and call-site extraction.

use log::{debug, info, warn};

use crate::ast::tree::Node;
use crate::config::{LangScore, Language, StackFrame, StackTrace};
use crate::error::{Result, TraceMindError};

pub mod go_lang;
pub mod node;
pub mod python;

/// Node kinds that count as a decision point for cyclomatic complexity.
pub const DECISION_KINDS: &[&str] = &[
    "if_statement",
    "elif_clause",
    "for_statement",
    "while_statement",
    "for_in_statement",
    "try_statement",
    "except_clause",
    "case_clause",
    "switch_statement",
    "conditional_expression",
    "ternary_expression",
    "and_expression",
    "or_expression",
    "&&",
    "||",
];

/// Trait that all language analysers implement.
pub trait LanguageAnalyser: Send + Sync {
    fn language(&self) -> Language;

    /// File extensions this analyser handles (e.g. &["py"]).
    fn extensions(&self) -> &[&str];

    /// Parse raw trace text into a [`StackTrace`]. Zero frames is a parse failure.
    fn parse_trace(&self, input: &str) -> Result<StackTrace>;

    fn is_stdlib_path(&self, path: &str) -> bool;

    fn is_third_party_path(&self, path: &str) -> bool;

    /// Syntax node kinds that define a function.
    fn function_kinds(&self) -> &[&str];

    /// Syntax node kinds that are a call expression.
    fn call_kinds(&self) -> &[&str];

    /// Syntax node kinds whose `name` child scopes the functions nested in them.
    fn scope_kinds(&self) -> &[&str] {
        &[]
    }

    /// Fully qualified name for a function node, given its enclosing scopes.
    fn qualified_name(&self, _node: Node<'_>, _source: &[u8], name: &str, scopes: &[String]) -> String {
        if scopes.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", scopes.join("."), name)
        }
    }

    /// Build a frame with the stdlib/third-party flags filled in.
    fn frame(&self, function: &str, file: &str, line: u32, column: u32) -> StackFrame {
        StackFrame {
            function: Some(function.to_string()),
            file: Some(file.to_string()),
            line,
            column,
            is_stdlib: self.is_stdlib_path(file),
            is_third_party: self.is_third_party_path(file),
            ..Default::default()
        }
    }
}

static PYTHON: python::PythonAnalyser = python::PythonAnalyser;
static GO: go_lang::GoAnalyser = go_lang::GoAnalyser;
static NODE: node::NodeAnalyser = node::NodeAnalyser;

impl Language {
    /// The analyser for this language, or `None` for [`Language::Unknown`].
    pub fn analyser(&self) -> Option<&'static dyn LanguageAnalyser> {
        match self {
            Self::Python => Some(&PYTHON),
            Self::Go => Some(&GO),
            Self::Node => Some(&NODE),
            Self::Unknown => None,
        }
    }

    /// Resolve a language from the extension after the last `.` of a path,
    /// case-insensitively, by asking each analyser in enumeration order.
    pub fn from_path(path: &str) -> Language {
        let Some((_, ext)) = path.rsplit_once('.') else {
            return Language::Unknown;
        };
        Language::ALL
            .into_iter()
            .find(|lang| {
                lang.analyser().is_some_and(|a| {
                    a.extensions()
                        .iter()
                        .any(|candidate| candidate.eq_ignore_ascii_case(ext))
                })
            })
            .unwrap_or(Language::Unknown)
    }
}

/// Detect the language of trace text with ordered heuristic checks.
///
/// Python signatures are checked first, then Go, then Node.js, then the
/// file-extension fallback. The first category that matches wins, which is
/// not necessarily the language [`score_languages`] ranks highest.
pub fn detect_language(input: &str) -> Language {
    if input.contains("Traceback (most recent call last)")
        || input.contains("File \"")
        || input.contains(".py\", line")
    {
        return Language::Python;
    }

    if input.contains("panic:") || input.contains("goroutine ") || input.contains(".go:") {
        return Language::Go;
    }

    if input.contains("at ")
        && (input.contains(".js:")
            || input.contains(".ts:")
            || input.contains("Error:")
            || input.contains("TypeError:"))
    {
        return Language::Node;
    }

    Language::from_path(input)
}

/// Weighted signatures per language.
const SIGNATURES: &[(Language, &str, u32)] = &[
    (Language::Python, "Traceback (most recent call last)", 50),
    (Language::Python, "File \"", 20),
    (Language::Python, ".py\", line", 30),
    (Language::Python, "ModuleNotFoundError", 20),
    (Language::Python, "ImportError", 15),
    (Language::Python, "AttributeError", 15),
    (Language::Python, "KeyError", 15),
    (Language::Go, "panic:", 40),
    (Language::Go, "goroutine ", 30),
    (Language::Go, ".go:", 20),
    (Language::Go, "+0x", 10),
    (Language::Go, "runtime.", 15),
    (Language::Node, "    at ", 25),
    (Language::Node, ".js:", 20),
    (Language::Node, ".ts:", 20),
    (Language::Node, "TypeError:", 20),
    (Language::Node, "ReferenceError:", 20),
    (Language::Node, "SyntaxError:", 15),
    (Language::Node, "node_modules", 10),
];

/// Score the text against every language independently, capping each at 100.
pub fn score_languages(input: &str) -> Vec<LangScore> {
    Language::ALL
        .iter()
        .map(|&language| {
            let total: u32 = SIGNATURES
                .iter()
                .filter(|(lang, needle, _)| *lang == language && input.contains(needle))
                .map(|(_, _, weight)| weight)
                .sum();
            LangScore {
                language,
                score: total.min(100) as u8,
            }
        })
        .collect()
}

/// Parse trace text, auto-detecting its language.
pub fn parse_stack_trace(input: &str) -> Result<StackTrace> {
    if input.trim().is_empty() {
        return Err(TraceMindError::InvalidArgument("empty trace input".into()));
    }

    let language = detect_language(input);
    if language == Language::Unknown {
        warn!("Could not detect stack trace language");
        return Err(TraceMindError::Unsupported(
            "could not detect stack trace language".into(),
        ));
    }
    info!("Auto-detected language: {language}");

    parse_trace_as(input, language)
}

/// Parse trace text with a specific language's grammar.
pub fn parse_trace_as(input: &str, language: Language) -> Result<StackTrace> {
    if input.trim().is_empty() {
        return Err(TraceMindError::InvalidArgument("empty trace input".into()));
    }
    let analyser = language.analyser().ok_or_else(|| {
        TraceMindError::Unsupported(format!("no trace parser for language: {language}"))
    })?;

    let trace = analyser.parse_trace(input)?;
    debug!("Parsed {} {} frames", trace.frame_count(), language);
    Ok(trace)
}

/// Parse a decimal line/column capture, yielding 0 for anything unparseable.
pub(crate) fn parse_number(text: &str) -> u32 {
    text.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_lookup() {
        assert_eq!(Language::from_path("/app/main.py"), Language::Python);
        assert_eq!(Language::from_path("svc/handler.GO"), Language::Go);
        assert_eq!(Language::from_path("web/App.tsx"), Language::Node);
        assert_eq!(Language::from_path("Makefile"), Language::Unknown);
        assert_eq!(Language::from_path("README.md"), Language::Unknown);
    }

    #[test]
    fn every_analyser_extension_resolves_to_its_language() {
        for lang in Language::ALL {
            for ext in lang.analyser().unwrap().extensions() {
                assert_eq!(Language::from_path(&format!("src/file.{ext}")), lang);
                assert_eq!(
                    Language::from_path(&format!("SRC/FILE.{}", ext.to_uppercase())),
                    lang
                );
            }
        }
    }

    #[test]
    fn detection_is_ordered_not_scored() {
        // Node signatures dominate the score, but the Python check runs first.
        let text = "File \"x\"\n    at a (/x.js:1:1)\n    at b (/y.js:2:2)\nTypeError: boom";
        assert_eq!(detect_language(text), Language::Python);

        let scores = score_languages(text);
        let python = scores.iter().find(|s| s.language == Language::Python).unwrap();
        let node = scores.iter().find(|s| s.language == Language::Node).unwrap();
        assert!(node.score > python.score);
    }

    #[test]
    fn scores_are_capped() {
        let text = "Traceback (most recent call last)\nFile \"a.py\", line 1\nModuleNotFoundError KeyError";
        let scores = score_languages(text);
        assert_eq!(scores.len(), 3);
        assert_eq!(scores[0].language, Language::Python);
        assert_eq!(scores[0].score, 100);
        assert_eq!(scores[1].score, 0);
    }

    #[test]
    fn prose_is_unknown() {
        assert_eq!(
            detect_language("This is not a stack trace at all.\nJust random text.\n"),
            Language::Unknown
        );
    }

    #[test]
    fn unknown_language_is_unsupported() {
        let err = parse_stack_trace("nothing to see here").unwrap_err();
        assert!(matches!(err, TraceMindError::Unsupported(_)));
    }

    #[test]
    fn empty_input_is_invalid() {
        assert!(matches!(
            parse_stack_trace("   \n"),
            Err(TraceMindError::InvalidArgument(_))
        ));
    }

    #[test]
    fn unknown_has_no_analyser() {
        assert!(Language::Unknown.analyser().is_none());
        for lang in Language::ALL {
            assert_eq!(lang.analyser().unwrap().language(), lang);
        }
    }
}
