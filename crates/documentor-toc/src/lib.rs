//! documentor-toc: navigation indexes for Documentor.
//!
//! Builds the table-of-contents tree and the flat search set from the
//! documentation model, and scans the optional static guide.

pub mod guide;
pub mod search;
pub mod toc;

pub use guide::Guide;
pub use search::{SearchSet, SearchTarget};
pub use toc::{build_toc, TocEntry, TocTarget, GUIDE_LABEL};
