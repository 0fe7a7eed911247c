//! Static guide pages attached next to the generated documentation.

use documentor_core::DocumentorError;
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A scanned guide directory. Pages are root-relative, `/`-separated and
/// sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guide {
    #[serde(skip)]
    pub root: PathBuf,
    pub pages: Vec<String>,
}

impl Guide {
    /// Every file under `root`, hidden files included; the guide is copied
    /// verbatim.
    pub fn scan(root: &Path) -> Result<Self, DocumentorError> {
        if !root.is_dir() {
            return Err(DocumentorError::Output(format!(
                "guide directory {} does not exist",
                root.display()
            )));
        }

        let mut pages = Vec::new();
        for entry in WalkBuilder::new(root).standard_filters(false).build() {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    tracing::warn!("Guide walk error: {}", err);
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(root) {
                pages.push(relative.to_string_lossy().replace('\\', "/"));
            }
        }
        pages.sort();

        tracing::debug!("Guide {}: {} pages", root.display(), pages.len());
        Ok(Self {
            root: root.to_path_buf(),
            pages,
        })
    }
}
