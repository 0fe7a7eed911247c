/// Unified error type for Documentor.
///
/// Only conditions that abort a run live here. Everything recoverable is
/// reported as a [`crate::Warning`] next to the model instead.
#[derive(Debug, thiserror::Error)]
pub enum DocumentorError {
    #[error("Source root error: {0}")]
    SourceRoot(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Log format error: {0}")]
    LogFormat(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
