//! Language registry for declaration parsing.
//!
//! Each language implements the `LanguageExtractor` trait and is registered here.

pub mod php;

use crate::extractor::LanguageExtractor;

/// Returns all available language extractors.
pub fn all_extractors() -> Vec<Box<dyn LanguageExtractor>> {
    vec![Box::new(php::PhpExtractor::new())]
}

/// Find an extractor for a given file extension.
pub fn extractor_for_extension(ext: &str) -> Option<Box<dyn LanguageExtractor>> {
    all_extractors()
        .into_iter()
        .find(|extractor| extractor.file_extensions().contains(&ext))
}
