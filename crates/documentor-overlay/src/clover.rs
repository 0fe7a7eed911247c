//! Clover XML coverage log reader.
//!
//! Only `stmt` and `cond` lines are sampled. `method` lines duplicate the
//! declaration head and would inflate the sampled count.

use crate::record::CoverageRecord;
use documentor_core::DocumentorError;
use std::path::Path;

pub fn read_clover(path: &Path) -> Result<Vec<CoverageRecord>, DocumentorError> {
    let xml = std::fs::read_to_string(path)?;
    parse_clover(&xml)
}

pub fn parse_clover(xml: &str) -> Result<Vec<CoverageRecord>, DocumentorError> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| DocumentorError::LogFormat(format!("clover: {e}")))?;
    let root = doc.root_element();
    if !root.has_tag_name("coverage") {
        return Err(DocumentorError::LogFormat(format!(
            "clover: expected <coverage>, found <{}>",
            root.tag_name().name()
        )));
    }

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for file in root.descendants().filter(|n| n.has_tag_name("file")) {
        let Some(name) = file.attribute("name") else {
            skipped += 1;
            continue;
        };
        for line in file.children().filter(|n| n.has_tag_name("line")) {
            if !matches!(line.attribute("type"), Some("stmt" | "cond")) {
                continue;
            }
            let num = line.attribute("num").and_then(|v| v.parse::<usize>().ok());
            let count = line.attribute("count").and_then(|v| v.parse::<u64>().ok());
            match (num, count) {
                (Some(line), Some(count)) => records.push(CoverageRecord {
                    path: name.to_string(),
                    line,
                    count,
                }),
                _ => skipped += 1,
            }
        }
    }

    if skipped > 0 {
        tracing::debug!("clover: skipped {} malformed entries", skipped);
    }
    Ok(records)
}
