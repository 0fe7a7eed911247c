//! Recoverable problems collected during a run.

use serde::{Deserialize, Serialize};

/// Which tier a warning belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A whole source unit (or guide) was skipped.
    File,
    /// One declaration was dropped; its siblings were kept.
    Declaration,
    /// A coverage or test record was ignored.
    Metadata,
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Declaration => write!(f, "declaration"),
            Self::Metadata => write!(f, "metadata"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub path: Option<String>,
    pub line: Option<usize>,
    pub message: String,
}

impl Warning {
    pub fn file(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::File,
            path: Some(path.into()),
            line: None,
            message: message.into(),
        }
    }

    pub fn declaration(path: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Declaration,
            path: Some(path.into()),
            line: Some(line),
            message: message.into(),
        }
    }

    pub fn metadata(path: Option<String>, message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Metadata,
            path,
            line: None,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.kind)?;
        match (&self.path, self.line) {
            (Some(path), Some(line)) => write!(f, " {path}:{line}:")?,
            (Some(path), None) => write!(f, " {path}:")?,
            _ => {}
        }
        write!(f, " {}", self.message)
    }
}
