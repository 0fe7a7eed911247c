//! LanguageExtractor trait for per-language declaration extraction from tree-sitter ASTs.

use documentor_core::{Declaration, RawReference, Warning};

/// Knobs that change what an extractor emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Emit `private` members.
    pub include_private: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            include_private: true,
        }
    }
}

/// Everything recovered from one syntax tree.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Declarations in source order; a container always precedes its members.
    pub declarations: Vec<Declaration>,
    pub references: Vec<RawReference>,
    /// Declaration-level problems. The file itself is never rejected here.
    pub warnings: Vec<Warning>,
}

/// Trait for per-language declaration extraction from tree-sitter ASTs.
pub trait LanguageExtractor: Send + Sync {
    /// Returns the human-readable language name (e.g., "php").
    fn language_name(&self) -> &str;

    /// Returns the file extensions this extractor handles.
    fn file_extensions(&self) -> &[&str];

    /// Returns the tree-sitter Language for configuring the parser.
    fn tree_sitter_language(&self) -> tree_sitter::Language;

    /// Extract declarations, raw references and declaration-level warnings.
    fn extract(
        &self,
        tree: &tree_sitter::Tree,
        source: &[u8],
        file_path: &str,
        options: &ExtractOptions,
    ) -> Extraction;
}
