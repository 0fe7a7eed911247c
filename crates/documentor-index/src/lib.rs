//! documentor-index: Tree-sitter based source indexing for Documentor.
//!
//! Turns a tree of PHP sources into a frozen [`DocumentationModel`]:
//! declarations with their documentation, signatures and line ranges, plus
//! the references between them resolved against the whole model.
//!
//! # Architecture
//!
//! - **parser**: Tree-sitter parsing coordinator that dispatches to language extractors
//! - **extractor**: Trait for per-language declaration/reference extraction
//! - **languages**: Language-specific extractors (currently: PHP)
//! - **indexer**: Directory walking, file filtering and the parallel parse stage
//! - **model**: Merges per-file results into one consistent model
//! - **resolver**: Resolves raw references against the global symbol table
//!
//! [`DocumentationModel`]: documentor_core::DocumentationModel

pub mod extractor;
pub mod indexer;
pub mod languages;
pub mod model;
pub mod parser;
pub mod resolver;

pub use extractor::{ExtractOptions, Extraction, LanguageExtractor};
pub use indexer::{FileFilter, IndexResult, Indexer};
pub use model::assemble;
pub use parser::{CodeParser, ParseResult};
pub use resolver::{Lookup, ReferenceResolver, ResolutionTable, SymbolTable};
