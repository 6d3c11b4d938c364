//! Source files loaded and parsed for call-graph resolution.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::debug;

use super::provider::GrammarProvider;
use super::tree::{Node, SyntaxTree};
use crate::config::Language;
use crate::error::{Result, TraceMindError};
use crate::languages::detect_language;

/// A parsed source file: path, raw bytes, syntax tree and language.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub source: Vec<u8>,
    pub tree: SyntaxTree,
    pub language: Language,
}

impl SourceFile {
    /// Read and parse a file from disk.
    ///
    /// The language comes from the extension, falling back to content
    /// heuristics. Files larger than `max_file_size` are rejected.
    pub fn load(path: &Path, provider: &dyn GrammarProvider, max_file_size: u64) -> Result<Self> {
        let io_err = |source| TraceMindError::Io {
            path: path.to_path_buf(),
            source,
        };

        let len = std::fs::metadata(path).map_err(io_err)?.len();
        if len > max_file_size {
            return Err(TraceMindError::ResourceExhausted(format!(
                "{} is {len} bytes, limit is {max_file_size}",
                path.display()
            )));
        }

        let mut source = Vec::new();
        source
            .try_reserve_exact(len as usize)
            .map_err(|e| TraceMindError::ResourceExhausted(format!("{}: {e}", path.display())))?;
        File::open(path)
            .and_then(|mut f| f.read_to_end(&mut source))
            .map_err(io_err)?;

        Self::from_source(path, source, provider)
    }

    /// Parse in-memory source as if it had been read from `path`.
    pub fn from_source(path: &Path, source: Vec<u8>, provider: &dyn GrammarProvider) -> Result<Self> {
        let path_str = path.to_string_lossy();
        let language = match Language::from_path(&path_str) {
            Language::Unknown => detect_language(&String::from_utf8_lossy(&source)),
            lang => lang,
        };
        if !provider.supports(language) {
            return Err(TraceMindError::Unsupported(format!(
                "no grammar for {} ({language})",
                path.display()
            )));
        }

        let tree = provider.parse(language, &path_str, &source)?;
        debug!("Loaded {} as {language}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            source,
            tree,
            language,
        })
    }

    pub fn root(&self) -> Option<Node<'_>> {
        self.tree.root()
    }

    /// Source text of `node`, or the empty string if it is not valid UTF-8.
    pub fn text(&self, node: Node<'_>) -> &str {
        node.utf8_text(&self.source).unwrap_or_default()
    }
}
