//! The documentation assembly pipeline.
//!
//! parse (parallel) → assemble → resolve → merge metadata → build indexes.
//! Every stage takes its inputs explicitly and returns its warnings, so a run
//! is a pure function of the source tree, the logs and the configuration.

use documentor_core::{
    Declaration, DocumentationModel, DocumentorConfig, DocumentorError, FileSummary,
    MetricOverlay, SourceUnit, Warning,
};
use documentor_index::{assemble, IndexResult, Indexer, ReferenceResolver, ResolutionTable};
use documentor_overlay::{CoverageRecord, MetadataMerger, TestRecord};
use documentor_toc::{build_toc, Guide, SearchSet, TocEntry};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Everything a run reads besides the configuration.
#[derive(Debug, Clone, Default)]
pub struct PipelineInput {
    pub source: PathBuf,
    pub coverage_log: Option<PathBuf>,
    pub test_log: Option<PathBuf>,
    pub guide: Option<PathBuf>,
    /// Passed through untouched for the renderer.
    pub base_uri: Option<String>,
}

/// The output contract handed to a renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Documentation {
    pub base_uri: Option<String>,
    pub source_root: String,
    pub files: BTreeMap<String, FileSummary>,
    pub declarations: BTreeMap<String, Declaration>,
    pub references: ResolutionTable,
    pub metrics: MetricOverlay,
    pub toc: TocEntry,
    pub search: SearchSet,
    pub guide: Option<Guide>,
    /// Sorted by tier, then path, line and message.
    pub warnings: Vec<Warning>,
}

/// Run the whole pipeline over a source tree on disk.
///
/// Only a missing source root or an invalid configuration is fatal; every
/// other problem ends up in [`Documentation::warnings`].
pub fn run(
    input: &PipelineInput,
    config: &DocumentorConfig,
) -> Result<Documentation, DocumentorError> {
    let indexer = Indexer::new(config)?;
    let indexed = indexer.index_directory(&input.source)?;
    let source_root = root_label(&input.source);

    let (model, resolver, mut warnings) = build_model(&source_root, indexed, config)?;

    let mut merger = MetadataMerger::new(&model);
    if let Ok(canonical) = input.source.canonicalize() {
        merger = merger.with_root_alias(&canonical.to_string_lossy());
    }
    let (metrics, mut merge_warnings) =
        merger.merge_logs(input.coverage_log.as_deref(), input.test_log.as_deref());
    warnings.append(&mut merge_warnings);

    let guide = input.guide.as_deref().and_then(|dir| match Guide::scan(dir) {
        Ok(guide) => Some(guide),
        Err(e) => {
            let warning = Warning::file(dir.display().to_string(), format!("guide skipped: {e}"));
            tracing::warn!("{}", warning);
            warnings.push(warning);
            None
        }
    });

    let references = resolver.resolve_all(&model.references);
    let base_uri = input.base_uri.clone();
    Ok(finish(model, references, metrics, guide, base_uri, warnings))
}

/// Run the pipeline over units already in memory, with already parsed logs.
pub fn document_units(
    source_root: &str,
    units: &[SourceUnit],
    config: &DocumentorConfig,
    coverage: Option<&[CoverageRecord]>,
    tests: Option<&[TestRecord]>,
) -> Result<Documentation, DocumentorError> {
    let indexed = Indexer::new(config)?.parse_units(units)?;
    let (model, resolver, mut warnings) = build_model(source_root, indexed, config)?;

    let (metrics, mut merge_warnings) = MetadataMerger::new(&model).merge(coverage, tests);
    warnings.append(&mut merge_warnings);

    let references = resolver.resolve_all(&model.references);
    Ok(finish(model, references, metrics, None, None, warnings))
}

fn build_model(
    source_root: &str,
    indexed: IndexResult,
    config: &DocumentorConfig,
) -> Result<(DocumentationModel, ReferenceResolver, Vec<Warning>), DocumentorError> {
    let mut warnings = indexed.warnings;
    let (model, mut assembly_warnings) = assemble(source_root, indexed.parse_results);
    warnings.append(&mut assembly_warnings);
    let resolver = ReferenceResolver::new(&model, &config.resolver)?;
    Ok((model, resolver, warnings))
}

fn finish(
    model: DocumentationModel,
    references: ResolutionTable,
    metrics: MetricOverlay,
    guide: Option<Guide>,
    base_uri: Option<String>,
    mut warnings: Vec<Warning>,
) -> Documentation {
    let toc = build_toc(&model, guide.as_ref());
    let search = SearchSet::build(&model);

    warnings.sort();
    warnings.dedup();

    tracing::info!(
        "Documented {}: {} files, {} declarations, {} warnings",
        model.source_root,
        model.files.len(),
        model.declarations.len(),
        warnings.len()
    );

    Documentation {
        base_uri,
        source_root: model.source_root,
        files: model.files,
        declarations: model.declarations,
        references,
        metrics,
        toc,
        search,
        guide,
        warnings,
    }
}

/// `/`-separated source root without trailing separators.
fn root_label(root: &Path) -> String {
    let label = root.to_string_lossy().replace('\\', "/");
    match label.trim_end_matches('/') {
        "" => label,
        trimmed => trimmed.to_string(),
    }
}
