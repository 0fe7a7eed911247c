//! Source discovery and the parallel parse stage.
//!
//! Walks the source root, keeps eligible files, then reads and parses every
//! unit on a rayon pool. Collecting the per-unit results is the barrier after
//! which the model can be assembled.

use crate::extractor::ExtractOptions;
use crate::parser::{CodeParser, ParseResult};
use documentor_core::{DocumentorConfig, DocumentorError, SourceConfig, SourceUnit, Warning};
use ignore::WalkBuilder;
use rayon::prelude::*;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Decides which walked files are documented.
#[derive(Debug, Clone)]
pub struct FileFilter {
    extension: String,
    exclude: Option<Regex>,
}

impl FileFilter {
    pub fn new(extension: &str, exclude_pattern: Option<&str>) -> Result<Self, DocumentorError> {
        let exclude = exclude_pattern
            .filter(|p| !p.is_empty())
            .map(Regex::new)
            .transpose()
            .map_err(|e| DocumentorError::Config(format!("invalid exclude pattern: {e}")))?;
        Ok(Self {
            extension: extension.trim_start_matches('.').to_ascii_lowercase(),
            exclude,
        })
    }

    pub fn from_config(config: &SourceConfig) -> Result<Self, DocumentorError> {
        Self::new(&config.extension, Some(&config.exclude_pattern))
    }

    /// `relative` is the root-relative path, `/`-separated.
    pub fn accepts(&self, relative: &str) -> bool {
        let has_extension = Path::new(relative)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension));
        has_extension && !self.exclude.as_ref().is_some_and(|re| re.is_match(relative))
    }
}

/// Result of indexing a source tree.
#[derive(Debug, Default)]
pub struct IndexResult {
    /// Eligible files found by the walker (or units handed in).
    pub files_scanned: usize,
    /// Units that produced a parse result.
    pub files_parsed: usize,
    pub total_declarations: usize,
    pub total_references: usize,
    /// Parse results in path order.
    pub parse_results: Vec<ParseResult>,
    /// File-level and declaration-level warnings.
    pub warnings: Vec<Warning>,
}

/// The parse stage of the pipeline.
pub struct Indexer {
    parser: CodeParser,
    filter: FileFilter,
    respect_gitignore: bool,
    follow_links: bool,
    jobs: usize,
}

impl Indexer {
    pub fn new(config: &DocumentorConfig) -> Result<Self, DocumentorError> {
        Ok(Self {
            parser: CodeParser::with_options(ExtractOptions {
                include_private: config.parser.include_private,
            }),
            filter: FileFilter::from_config(&config.source)?,
            respect_gitignore: config.source.respect_gitignore,
            follow_links: config.source.follow_links,
            jobs: config.parser.jobs,
        })
    }

    /// Eligible files under `root` as (absolute, root-relative) pairs, sorted.
    ///
    /// Fails only when the root itself is missing or unreadable.
    pub fn discover(&self, root: &Path) -> Result<Vec<(PathBuf, String)>, DocumentorError> {
        if !root.is_dir() {
            return Err(DocumentorError::SourceRoot(format!(
                "{} does not exist or is not a directory",
                root.display()
            )));
        }
        std::fs::read_dir(root)
            .map_err(|e| DocumentorError::SourceRoot(format!("{}: {e}", root.display())))?;

        let walker = WalkBuilder::new(root)
            .hidden(true)
            .ignore(self.respect_gitignore)
            .parents(self.respect_gitignore)
            .git_ignore(self.respect_gitignore)
            .git_global(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .follow_links(self.follow_links)
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    tracing::warn!("Walk error: {}", err);
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let relative = relative.to_string_lossy().replace('\\', "/");
            if self.filter.accepts(&relative) {
                files.push((entry.path().to_path_buf(), relative));
            }
        }
        files.sort_by(|a, b| a.1.cmp(&b.1));
        Ok(files)
    }

    /// Walk `root`, then read and parse every eligible file in parallel.
    pub fn index_directory(&self, root: &Path) -> Result<IndexResult, DocumentorError> {
        let files = self.discover(root)?;
        let files_scanned = files.len();

        let outcomes: Vec<Result<ParseResult, Warning>> = self.in_pool(|| {
            files
                .par_iter()
                .map(|(absolute, relative)| {
                    let unit = read_unit(absolute, relative)?;
                    self.parse_one(&unit)
                })
                .collect()
        })?;

        let result = collect_outcomes(files_scanned, outcomes);
        tracing::info!(
            "Indexed {}: {} scanned, {} parsed, {} declarations, {} references",
            root.display(),
            result.files_scanned,
            result.files_parsed,
            result.total_declarations,
            result.total_references,
        );
        Ok(result)
    }

    /// Parse already loaded units in parallel.
    pub fn parse_units(&self, units: &[SourceUnit]) -> Result<IndexResult, DocumentorError> {
        let outcomes: Vec<Result<ParseResult, Warning>> =
            self.in_pool(|| units.par_iter().map(|unit| self.parse_one(unit)).collect())?;
        Ok(collect_outcomes(units.len(), outcomes))
    }

    fn parse_one(&self, unit: &SourceUnit) -> Result<ParseResult, Warning> {
        tracing::debug!("Parsing {}", unit.path);
        self.parser.parse_unit(unit).map_err(|e| {
            tracing::warn!("Failed to parse {}: {}", unit.path, e);
            Warning::file(&unit.path, format!("skipped: {e}"))
        })
    }

    fn in_pool<T, F>(&self, work: F) -> Result<T, DocumentorError>
    where
        T: Send,
        F: FnOnce() -> T + Send,
    {
        if self.jobs == 0 {
            return Ok(work());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| DocumentorError::Config(format!("worker pool: {e}")))?;
        Ok(pool.install(work))
    }
}

fn read_unit(absolute: &Path, relative: &str) -> Result<SourceUnit, Warning> {
    let bytes = std::fs::read(absolute).map_err(|err| {
        tracing::warn!("Failed to read {}: {}", absolute.display(), err);
        Warning::file(relative, format!("unreadable: {err}"))
    })?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            tracing::debug!("{} is not valid UTF-8, decoding lossily", relative);
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        }
    };
    Ok(SourceUnit::new(relative, text))
}

fn collect_outcomes(
    files_scanned: usize,
    outcomes: Vec<Result<ParseResult, Warning>>,
) -> IndexResult {
    let mut result = IndexResult {
        files_scanned,
        ..IndexResult::default()
    };
    for outcome in outcomes {
        match outcome {
            Ok(mut parsed) => {
                result.files_parsed += 1;
                result.total_declarations += parsed.declarations.len();
                result.total_references += parsed.references.len();
                for warning in &parsed.warnings {
                    tracing::warn!("{}", warning);
                }
                result.warnings.append(&mut parsed.warnings);
                result.parse_results.push(parsed);
            }
            Err(warning) => result.warnings.push(warning),
        }
    }
    result
        .parse_results
        .sort_by(|a, b| a.file_path.cmp(&b.file_path));
    result
}
