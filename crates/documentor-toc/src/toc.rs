//! Table-of-contents tree over the documentation model.

use crate::guide::Guide;
use documentor_core::DocumentationModel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label of the trailing guide section.
pub const GUIDE_LABEL: &str = "Guide";

/// What a TOC entry points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum TocTarget {
    Root,
    Declaration(String),
    /// Guide directory, root-relative (`""` for the guide itself).
    GuideSection(String),
    GuidePage(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub label: String,
    pub target: TocTarget,
    pub children: Vec<TocEntry>,
}

impl TocEntry {
    fn leaf(label: impl Into<String>, target: TocTarget) -> Self {
        Self {
            label: label.into(),
            target,
            children: Vec::new(),
        }
    }

    /// Depth-first search for the entry pointing at `target`.
    pub fn find(&self, target: &TocTarget) -> Option<&TocEntry> {
        if &self.target == target {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(target))
    }

    /// Number of entries in this subtree, itself included.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(TocEntry::len).sum::<usize>()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Build the TOC: top-level declarations by qualified name, each followed by
/// its members, then the guide section when a guide is attached.
pub fn build_toc(model: &DocumentationModel, guide: Option<&Guide>) -> TocEntry {
    let mut children: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for decl in model.declarations.values() {
        if let Some(parent) = decl.parent.as_deref() {
            children.entry(parent).or_default().push(&decl.qualified_name);
        }
    }

    let mut root = TocEntry::leaf(model.source_root.clone(), TocTarget::Root);
    root.children = model
        .top_level()
        .map(|d| declaration_entry(model, &children, &d.qualified_name, true))
        .collect();

    if let Some(guide) = guide {
        let mut section = TocEntry::leaf(GUIDE_LABEL, TocTarget::GuideSection(String::new()));
        section.children = guide_entries(&guide.pages);
        root.children.push(section);
    }

    tracing::debug!("Built TOC with {} entries", root.len());
    root
}

fn declaration_entry(
    model: &DocumentationModel,
    children: &BTreeMap<&str, Vec<&str>>,
    qualified_name: &str,
    top_level: bool,
) -> TocEntry {
    let label = match model.get(qualified_name) {
        Some(decl) if !top_level => decl.name.clone(),
        _ => qualified_name.to_string(),
    };
    let mut entry = TocEntry::leaf(label, TocTarget::Declaration(qualified_name.to_string()));
    entry.children = children
        .get(qualified_name)
        .into_iter()
        .flatten()
        .map(|child| declaration_entry(model, children, child, false))
        .collect();
    entry
}

#[derive(Default)]
struct GuideDir<'a> {
    dirs: BTreeMap<&'a str, GuideDir<'a>>,
    pages: Vec<(&'a str, &'a str)>,
}

/// Directory tree of guide pages: sub-sections first, then pages, each by name.
fn guide_entries(pages: &[String]) -> Vec<TocEntry> {
    let mut tree = GuideDir::default();
    for page in pages {
        let mut dir = &mut tree;
        let mut segments: Vec<&str> = page.split('/').collect();
        let Some(file) = segments.pop() else {
            continue;
        };
        for segment in segments {
            dir = dir.dirs.entry(segment).or_default();
        }
        dir.pages.push((file, page));
    }
    dir_entries(&tree, "")
}

fn dir_entries(dir: &GuideDir<'_>, prefix: &str) -> Vec<TocEntry> {
    let mut entries: Vec<TocEntry> = dir
        .dirs
        .iter()
        .map(|(name, sub)| {
            let path = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{prefix}/{name}")
            };
            let mut section = TocEntry::leaf(*name, TocTarget::GuideSection(path.clone()));
            section.children = dir_entries(sub, &path);
            section
        })
        .collect();

    let mut pages = dir.pages.clone();
    pages.sort();
    entries.extend(
        pages
            .into_iter()
            .map(|(name, path)| TocEntry::leaf(name, TocTarget::GuidePage(path.to_string()))),
    );
    entries
}
