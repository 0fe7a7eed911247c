//! Flat, case-insensitive search set over declaration names.

use documentor_core::{local_name, DeclarationKind, DocumentationModel};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTarget {
    pub qualified_name: String,
    pub kind: DeclarationKind,
    /// True when the key is the full qualified name rather than the local name.
    pub primary: bool,
}

/// Case-folded name → declarations carrying that name.
///
/// Every declaration is reachable by its qualified name and by its local
/// name. Targets under one key list primary matches first, then order by
/// qualified name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchSet {
    entries: BTreeMap<String, Vec<SearchTarget>>,
}

impl SearchSet {
    pub fn build(model: &DocumentationModel) -> Self {
        let mut entries: BTreeMap<String, Vec<SearchTarget>> = BTreeMap::new();
        for decl in model.declarations.values() {
            let primary = decl.qualified_name.to_lowercase();
            let secondary = local_name(&decl.qualified_name).to_lowercase();
            if secondary != primary {
                entries.entry(secondary).or_default().push(SearchTarget {
                    qualified_name: decl.qualified_name.clone(),
                    kind: decl.kind,
                    primary: false,
                });
            }
            entries.entry(primary).or_default().push(SearchTarget {
                qualified_name: decl.qualified_name.clone(),
                kind: decl.kind,
                primary: true,
            });
        }
        for targets in entries.values_mut() {
            targets.sort_by(|a, b| {
                b.primary
                    .cmp(&a.primary)
                    .then_with(|| a.qualified_name.cmp(&b.qualified_name))
            });
        }

        tracing::debug!("Built search set with {} keys", entries.len());
        Self { entries }
    }

    /// Targets stored under exactly `query`, case-insensitively.
    pub fn lookup(&self, query: &str) -> &[SearchTarget] {
        self.entries
            .get(&query.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Targets of every key starting with `query`, in key order, each
    /// declaration listed once.
    pub fn prefix(&self, query: &str) -> Vec<&SearchTarget> {
        let query = query.to_lowercase();
        let mut seen = BTreeSet::new();
        self.entries
            .range(query.clone()..)
            .take_while(|(key, _)| key.starts_with(&query))
            .flat_map(|(_, targets)| targets)
            .filter(|t| seen.insert(t.qualified_name.as_str()))
            .collect()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
