//! Grammar provider seam: turns source bytes into a [`SyntaxTree`].

use std::path::Path;

use log::debug;
use tree_sitter_language::LanguageFn;

use super::tree::{NodeId, NodeSpan, Point, SyntaxTree};
use crate::config::Language;
use crate::error::{Result, TraceMindError};

/// Parser backend capable of producing syntax trees for some languages.
pub trait GrammarProvider: Send + Sync {
    fn supports(&self, language: Language) -> bool;

    /// Parse `source` as `language`. `path` may refine the dialect (e.g. `.tsx`).
    fn parse(&self, language: Language, path: &str, source: &[u8]) -> Result<SyntaxTree>;
}

/// Tree-sitter backed provider for Python, Go, JavaScript and TypeScript.
pub struct TreeSitterProvider;

impl Default for TreeSitterProvider {
    fn default() -> Self {
        Self
    }
}

impl TreeSitterProvider {
    pub fn new() -> Self {
        Self
    }

    fn grammar_for(language: Language, path: &str) -> Option<LanguageFn> {
        let ext = Path::new(path)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match language {
            Language::Python => Some(tree_sitter_python::LANGUAGE),
            Language::Go => Some(tree_sitter_go::LANGUAGE),
            Language::Node => match ext.as_str() {
                "ts" => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT),
                "tsx" => Some(tree_sitter_typescript::LANGUAGE_TSX),
                _ => Some(tree_sitter_javascript::LANGUAGE),
            },
            Language::Unknown => None,
        }
    }
}

fn to_point(p: tree_sitter::Point) -> Point {
    Point::new(p.row, p.column)
}

/// Copy a tree-sitter tree into the owned arena, named and anonymous nodes alike.
fn lower(tree: &tree_sitter::Tree) -> SyntaxTree {
    let mut out = SyntaxTree::new();
    let mut cursor = tree.walk();
    let mut parents: Vec<NodeId> = Vec::new();

    loop {
        let node = cursor.node();
        let id = out.add_node(
            parents.last().copied(),
            cursor.field_name(),
            NodeSpan {
                kind: node.kind(),
                byte_range: node.byte_range(),
                start: to_point(node.start_position()),
                end: to_point(node.end_position()),
            },
        );

        if cursor.goto_first_child() {
            parents.push(id);
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return out;
            }
            parents.pop();
        }
    }
}

impl GrammarProvider for TreeSitterProvider {
    fn supports(&self, language: Language) -> bool {
        language != Language::Unknown
    }

    fn parse(&self, language: Language, path: &str, source: &[u8]) -> Result<SyntaxTree> {
        let grammar: tree_sitter::Language = Self::grammar_for(language, path)
            .ok_or_else(|| TraceMindError::Unsupported(format!("no grammar for {language}")))?
            .into();

        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&grammar)
            .map_err(|e| TraceMindError::Unsupported(format!("{language} grammar: {e}")))?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| TraceMindError::ParseFailure(format!("could not parse {path}")))?;

        let lowered = lower(&tree);
        debug!("Parsed {path}: {} syntax nodes", lowered.len());
        Ok(lowered)
    }
}
