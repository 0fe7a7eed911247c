//! Writes the output contract and the attached guide to the destination.

use crate::pipeline::Documentation;
use documentor_core::{DocumentorError, OutputConfig};
use documentor_toc::Guide;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const DOCUMENTATION_FILE: &str = "documentation.json";
pub const TOC_FILE: &str = "toc.json";
pub const SEARCH_FILE: &str = "search.json";
pub const GUIDE_DIR: &str = "guide";

/// Write every deliverable under `destination`, creating it if needed.
/// Returns the written files in write order.
pub fn write_documentation(
    doc: &Documentation,
    destination: &Path,
    config: &OutputConfig,
) -> Result<Vec<PathBuf>, DocumentorError> {
    std::fs::create_dir_all(destination).map_err(|e| output_error(destination, e))?;

    let mut written = vec![
        write_json(&destination.join(DOCUMENTATION_FILE), doc, config)?,
        write_json(&destination.join(TOC_FILE), &doc.toc, config)?,
        write_json(&destination.join(SEARCH_FILE), &doc.search, config)?,
    ];
    if let Some(guide) = &doc.guide {
        written.extend(copy_guide(guide, &destination.join(GUIDE_DIR))?);
    }

    tracing::info!("Wrote {} files to {}", written.len(), destination.display());
    Ok(written)
}

fn write_json<T: Serialize>(
    path: &Path,
    value: &T,
    config: &OutputConfig,
) -> Result<PathBuf, DocumentorError> {
    let mut json = if config.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    json.push('\n');
    std::fs::write(path, json).map_err(|e| output_error(path, e))?;
    Ok(path.to_path_buf())
}

/// Copy guide pages verbatim, keeping their relative layout.
pub fn copy_guide(guide: &Guide, target: &Path) -> Result<Vec<PathBuf>, DocumentorError> {
    let mut copied = Vec::with_capacity(guide.pages.len());
    for page in &guide.pages {
        let from = guide.root.join(page);
        let to = target.join(page);
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent).map_err(|e| output_error(parent, e))?;
        }
        std::fs::copy(&from, &to).map_err(|e| output_error(&to, e))?;
        copied.push(to);
    }
    tracing::debug!("Copied {} guide pages to {}", copied.len(), target.display());
    Ok(copied)
}

fn output_error(path: &Path, err: std::io::Error) -> DocumentorError {
    DocumentorError::Output(format!("{}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::document_units;
    use documentor_core::{DocumentorConfig, SourceUnit};
    use std::fs;

    fn doc() -> Documentation {
        let units = vec![SourceUnit::new("Foo.php", "<?php\nclass Foo {}\n")];
        document_units("src", &units, &DocumentorConfig::default(), None, None).unwrap()
    }

    #[test]
    fn writes_json_deliverables() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out/docs");
        let written = write_documentation(&doc(), &out, &OutputConfig::default()).unwrap();
        assert_eq!(written.len(), 3);

        let toc: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join(TOC_FILE)).unwrap()).unwrap();
        assert_eq!(toc["label"], "src");
        assert_eq!(toc["children"][0]["target"]["id"], "Foo");

        let search: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join(SEARCH_FILE)).unwrap()).unwrap();
        assert_eq!(search["foo"][0]["qualified_name"], "Foo");
    }

    #[test]
    fn compact_output_is_single_line() {
        let dir = tempfile::tempdir().unwrap();
        let config = OutputConfig { pretty: false };
        write_documentation(&doc(), dir.path(), &config).unwrap();
        let text = fs::read_to_string(dir.path().join(DOCUMENTATION_FILE)).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn guide_is_copied_verbatim() {
        let guide_dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(guide_dir.path().join("intro")).unwrap();
        fs::write(guide_dir.path().join("index.html"), "home").unwrap();
        fs::write(guide_dir.path().join("intro/setup.html"), "setup").unwrap();

        let mut doc = doc();
        doc.guide = Some(Guide::scan(guide_dir.path()).unwrap());

        let out = tempfile::tempdir().unwrap();
        let written = write_documentation(&doc, out.path(), &OutputConfig::default()).unwrap();
        assert_eq!(written.len(), 5);
        assert_eq!(
            fs::read_to_string(out.path().join("guide/intro/setup.html")).unwrap(),
            "setup"
        );
    }
}
