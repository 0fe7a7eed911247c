//! documentor-overlay: coverage and unit test metadata for Documentor.
//!
//! Reads Clover coverage logs and JUnit test logs into plain records, then
//! merges them onto a frozen [`DocumentationModel`] as a separate
//! [`MetricOverlay`].
//!
//! [`DocumentationModel`]: documentor_core::DocumentationModel
//! [`MetricOverlay`]: documentor_core::MetricOverlay

pub mod clover;
pub mod junit;
pub mod merger;
pub mod record;

pub use clover::{parse_clover, read_clover};
pub use junit::{parse_junit, read_junit};
pub use merger::MetadataMerger;
pub use record::{CoverageRecord, TestRecord, TestSubject};
