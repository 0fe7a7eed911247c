//! documentor-core: Shared types, configuration and errors for Documentor.
//!
//! Every pipeline stage (parser, resolver, metadata merger, index builder)
//! exchanges the plain data types defined here, so the stages can live in
//! separate crates without depending on each other's internals.

pub mod config;
pub mod error;
pub mod metrics;
pub mod types;
pub mod warning;

pub use config::*;
pub use error::*;
pub use metrics::*;
pub use types::*;
pub use warning::*;
