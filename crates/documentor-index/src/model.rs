//! Model assembly: the join point after parallel parsing.
//!
//! Per-file results are merged in path order, so a qualified name defined in
//! two files always keeps the definition from the lexically first path,
//! whatever order the parse jobs finished in.

use crate::parser::ParseResult;
use documentor_core::{DocumentationModel, FileSummary, Warning};
use std::collections::HashSet;

/// Merge parse results into one globally consistent model.
///
/// Returns the declaration-level warnings raised by the merge itself; the
/// per-file parse warnings stay with the parse results.
pub fn assemble(
    source_root: &str,
    mut results: Vec<ParseResult>,
) -> (DocumentationModel, Vec<Warning>) {
    results.sort_by(|a, b| a.file_path.cmp(&b.file_path));

    let mut model = DocumentationModel {
        source_root: source_root.to_string(),
        ..DocumentationModel::default()
    };
    let mut warnings = Vec::new();

    for result in results {
        let mut dropped: HashSet<String> = HashSet::new();
        let mut kept = 0usize;

        for decl in result.declarations {
            if decl.parent.as_ref().is_some_and(|p| dropped.contains(p)) {
                dropped.insert(decl.qualified_name);
                continue;
            }

            if let Some(existing) = model.declarations.get(&decl.qualified_name) {
                let warning = Warning::declaration(
                    &decl.file_path,
                    decl.line_start,
                    format!(
                        "`{}` is already declared in {}:{}; dropped",
                        decl.qualified_name, existing.file_path, existing.line_start
                    ),
                );
                tracing::warn!("{}", warning);
                warnings.push(warning);
                dropped.insert(decl.qualified_name);
                continue;
            }

            let contained = match decl.parent.as_deref() {
                Some(parent) => model
                    .declarations
                    .get(parent)
                    .is_some_and(|p| p.contains(&decl)),
                None => true,
            };
            if !contained || decl.line_start > decl.line_end {
                let warning = Warning::declaration(
                    &decl.file_path,
                    decl.line_start,
                    format!("`{}` has an inconsistent range; dropped", decl.qualified_name),
                );
                tracing::warn!("{}", warning);
                warnings.push(warning);
                dropped.insert(decl.qualified_name);
                continue;
            }

            kept += 1;
            model
                .declarations
                .insert(decl.qualified_name.clone(), decl);
        }

        model.references.extend(
            result
                .references
                .into_iter()
                .filter(|r| !dropped.contains(&r.source)),
        );
        model.files.insert(
            result.file_path,
            FileSummary {
                line_count: result.line_count,
                declarations: kept,
            },
        );
    }

    model
        .references
        .retain(|r| model.declarations.contains_key(&r.source));
    model.references.sort();
    model.references.dedup();

    tracing::debug!(
        "Assembled model: {} files, {} declarations, {} references",
        model.files.len(),
        model.declarations.len(),
        model.references.len()
    );
    (model, warnings)
}
