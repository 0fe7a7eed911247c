//! Tree-sitter parsing coordinator.
//!
//! Detects language from file extension, selects the appropriate extractor,
//! and runs declaration + reference extraction for one source unit.

use crate::extractor::{ExtractOptions, LanguageExtractor};
use crate::languages;
use documentor_core::{Declaration, DocumentorError, RawReference, SourceUnit, Warning};
use std::path::Path;
use tree_sitter::Parser;

/// Result of parsing a single source unit.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Source-root relative path of the parsed unit.
    pub file_path: String,
    /// Language that was detected and used.
    pub language: String,
    pub line_count: usize,
    pub declarations: Vec<Declaration>,
    pub references: Vec<RawReference>,
    /// Declaration-level warnings raised while extracting.
    pub warnings: Vec<Warning>,
}

/// Coordinates tree-sitter parsing across registered languages.
pub struct CodeParser {
    extractors: Vec<Box<dyn LanguageExtractor>>,
    options: ExtractOptions,
}

impl CodeParser {
    /// Create a new CodeParser with all registered language extractors.
    pub fn new() -> Self {
        Self::with_options(ExtractOptions::default())
    }

    pub fn with_options(options: ExtractOptions) -> Self {
        Self {
            extractors: languages::all_extractors(),
            options,
        }
    }

    /// Parse one unit. Syntax errors are tolerated; only an unsupported
    /// extension or a parser that produces no tree fails the unit.
    pub fn parse_unit(&self, unit: &SourceUnit) -> Result<ParseResult, DocumentorError> {
        let extension = Path::new(&unit.path)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let extractor = self.find_extractor(&extension).ok_or_else(|| {
            DocumentorError::Parse(format!("no extractor for extension `{extension}`"))
        })?;

        let mut parser = Parser::new();
        parser
            .set_language(&extractor.tree_sitter_language())
            .map_err(|e| DocumentorError::Parse(e.to_string()))?;

        let tree = parser
            .parse(unit.text.as_bytes(), None)
            .ok_or_else(|| DocumentorError::Parse("parser produced no syntax tree".to_string()))?;

        if tree.root_node().has_error() {
            tracing::debug!("{}: syntax errors, recovering declarations", unit.path);
        }

        let extraction =
            extractor.extract(&tree, unit.text.as_bytes(), &unit.path, &self.options);

        Ok(ParseResult {
            file_path: unit.path.clone(),
            language: extractor.language_name().to_string(),
            line_count: unit.line_count(),
            declarations: extraction.declarations,
            references: extraction.references,
            warnings: extraction.warnings,
        })
    }

    /// Returns the list of all supported file extensions.
    pub fn supported_extensions(&self) -> Vec<&str> {
        self.extractors
            .iter()
            .flat_map(|e| e.file_extensions().iter().copied())
            .collect()
    }

    /// Check if a given file extension is supported.
    pub fn supports_extension(&self, ext: &str) -> bool {
        self.find_extractor(ext).is_some()
    }

    fn find_extractor(&self, ext: &str) -> Option<&dyn LanguageExtractor> {
        self.extractors
            .iter()
            .find(|e| e.file_extensions().contains(&ext))
            .map(|e| e.as_ref())
    }
}

impl Default for CodeParser {
    fn default() -> Self {
        Self::new()
    }
}
