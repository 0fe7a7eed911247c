//! Reference resolution against the global symbol table.
//!
//! Every raw reference ends up resolved to a declaration, marked external,
//! or left unresolved. Lookups only read ordered maps built from the frozen
//! model, so the outcome does not depend on file processing order.

use documentor_core::{
    local_name, DocumentationModel, DocumentorError, RawReference, Reference, Resolution,
    ResolverConfig,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Outcome of a name lookup in the [`SymbolTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(String),
    Ambiguous,
    Missing,
}

/// Qualified names of the model plus a local-name index.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    names: BTreeSet<String>,
    by_local: BTreeMap<String, Vec<String>>,
}

impl SymbolTable {
    pub fn new(model: &DocumentationModel) -> Self {
        Self::from_names(model.declarations.keys().cloned())
    }

    pub fn from_names(names: impl IntoIterator<Item = String>) -> Self {
        let mut table = Self::default();
        for name in names {
            table
                .by_local
                .entry(local_name(&name).to_string())
                .or_default()
                .push(name.clone());
            table.names.insert(name);
        }
        for candidates in table.by_local.values_mut() {
            candidates.sort();
        }
        table
    }

    pub fn contains(&self, qualified_name: &str) -> bool {
        self.names.contains(qualified_name)
    }

    /// Declarations sharing `local` as their last segment.
    pub fn with_local_name(&self, local: &str) -> &[String] {
        self.by_local
            .get(local)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Declarations whose qualified name ends with `partial` on a segment
    /// boundary (`User` matches `App\User`, `Foo.bar` matches `App\Foo.bar`).
    pub fn with_suffix(&self, partial: &str) -> Vec<&str> {
        self.with_local_name(local_name(partial))
            .iter()
            .filter(|qn| {
                qn.as_str() == partial
                    || qn
                        .strip_suffix(partial)
                        .is_some_and(|head| head.ends_with(['\\', '.']))
            })
            .map(String::as_str)
            .collect()
    }

    /// Exact, then suffix, then local-name lookup. Several candidates at the
    /// first step that finds any make the lookup ambiguous.
    pub fn lookup(&self, name: &str) -> Lookup {
        let name = normalize(name);
        if self.contains(&name) {
            return Lookup::Found(name);
        }
        match self.with_suffix(&name).as_slice() {
            [one] => return Lookup::Found((*one).to_string()),
            [] => {}
            _ => return Lookup::Ambiguous,
        }
        if name.contains('.') {
            return Lookup::Missing;
        }
        match self.with_local_name(local_name(&name)) {
            [one] => Lookup::Found(one.clone()),
            [] => Lookup::Missing,
            _ => Lookup::Ambiguous,
        }
    }
}

/// Strip a leading `\` and write static access (`Foo::bar`) as `Foo.bar`.
fn normalize(name: &str) -> String {
    name.trim_start_matches('\\').replace("::", ".")
}

/// Every reference of a run with its resolution, in model order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolutionTable {
    pub references: Vec<Reference>,
}

impl ResolutionTable {
    pub fn references_from<'a>(
        &'a self,
        source: &'a str,
    ) -> impl Iterator<Item = &'a Reference> + 'a {
        self.references.iter().filter(move |r| r.source == source)
    }

    /// Use sites of `target`.
    pub fn references_to<'a>(
        &'a self,
        target: &'a str,
    ) -> impl Iterator<Item = &'a Reference> + 'a {
        self.references
            .iter()
            .filter(move |r| r.resolution.target() == Some(target))
    }

    /// (resolved, external, unresolved) counts.
    pub fn counts(&self) -> (usize, usize, usize) {
        self.references
            .iter()
            .fold((0, 0, 0), |(r, e, u), reference| match reference.resolution {
                Resolution::Resolved(_) => (r + 1, e, u),
                Resolution::External => (r, e + 1, u),
                Resolution::Unresolved => (r, e, u + 1),
            })
    }
}

/// Resolves raw references against the model's symbol table.
pub struct ReferenceResolver {
    table: SymbolTable,
    external: Vec<Regex>,
}

impl ReferenceResolver {
    pub fn new(
        model: &DocumentationModel,
        config: &ResolverConfig,
    ) -> Result<Self, DocumentorError> {
        let external = config
            .external_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    DocumentorError::Config(format!("invalid external pattern `{p}`: {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            table: SymbolTable::new(model),
            external,
        })
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.table
    }

    /// Resolve a single reference.
    ///
    /// Resolution strategy:
    /// 1. Exact match on the expanded hint, then on the written name
    /// 2. Suffix / local-name match when exactly one candidate exists
    /// 3. External when nothing matched and the name fits an external pattern
    /// 4. Unresolved otherwise, including every ambiguous match
    pub fn resolve(&self, reference: &RawReference) -> Resolution {
        let written = normalize(&reference.name);
        let hint = reference.hint.as_deref().map(normalize);

        if let Some(hint) = hint.as_deref().filter(|h| self.table.contains(h)) {
            return Resolution::Resolved(hint.to_string());
        }

        let fully_qualified = reference.name.starts_with('\\');
        let lookup = if fully_qualified {
            // `\Foo\Bar` names exactly one symbol; never guess by local name.
            if self.table.contains(&written) {
                Lookup::Found(written.clone())
            } else {
                Lookup::Missing
            }
        } else {
            self.table.lookup(&written)
        };

        match lookup {
            Lookup::Found(target) => Resolution::Resolved(target),
            Lookup::Ambiguous => Resolution::Unresolved,
            Lookup::Missing if self.is_external(&written, hint.as_deref()) => Resolution::External,
            Lookup::Missing => Resolution::Unresolved,
        }
    }

    pub fn resolve_all(&self, references: &[RawReference]) -> ResolutionTable {
        let references: Vec<Reference> = references
            .iter()
            .map(|r| Reference {
                source: r.source.clone(),
                raw_name: r.name.clone(),
                kind: r.kind,
                line: r.line,
                resolution: self.resolve(r),
            })
            .collect();

        let table = ResolutionTable { references };
        let (resolved, external, unresolved) = table.counts();
        tracing::info!(
            "Resolved references: {} resolved, {} external, {} unresolved",
            resolved,
            external,
            unresolved
        );
        table
    }

    fn is_external(&self, written: &str, hint: Option<&str>) -> bool {
        self.external.iter().any(|re| {
            re.is_match(written) || hint.is_some_and(|h| re.is_match(h))
        })
    }
}
