//! documentor: static documentation generator for PHP source trees.
//!
//! Library facade over the pipeline crates, used by the `documentor` binary
//! and by integration tests.

pub mod output;
pub mod pipeline;

pub use output::write_documentation;
pub use pipeline::{document_units, run, Documentation, PipelineInput};
