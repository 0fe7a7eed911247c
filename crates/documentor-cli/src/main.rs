//! documentor: CLI entry point for the Documentor documentation generator.

use anyhow::Context;
use clap::Parser;
use documentor::{output, pipeline, Documentation, PipelineInput};
use documentor_core::{DocumentorConfig, WarningKind};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "documentor",
    about = "Static documentation generator for PHP source trees"
)]
#[command(version)]
struct Cli {
    /// Directory containing the source files to document
    #[arg(short, long, value_name = "SOURCE_PATH")]
    source: PathBuf,

    /// Directory the documentation is written to
    #[arg(short, long, value_name = "DESTINATION_PATH")]
    destination: PathBuf,

    /// Code coverage xml log generated by `coverage-clover` in PHPUnit
    #[arg(short = 'c', long = "coverage", value_name = "COVERAGE_PATH")]
    coverage: Option<PathBuf>,

    /// Unit test log generated by `junit` in PHPUnit
    #[arg(short = 'u', long = "unit-tests", value_name = "UNIT_TEST_PATH")]
    unit_tests: Option<PathBuf>,

    /// Directory of static guide pages copied under the output
    #[arg(short, long, value_name = "GUIDE_PATH")]
    guide: Option<PathBuf>,

    /// Base URI of the generated pages (defaults to the destination)
    #[arg(short, long, value_name = "BASE")]
    base: Option<String>,

    /// Configuration file (defaults to ./documentor.toml when present)
    #[arg(long, value_name = "CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Parse worker threads (0 lets the pool decide)
    #[arg(short, long)]
    jobs: Option<usize>,
}

impl Cli {
    fn pipeline_input(&self) -> PipelineInput {
        let destination = trim_separators(&self.destination.to_string_lossy());
        PipelineInput {
            source: PathBuf::from(trim_separators(&self.source.to_string_lossy())),
            coverage_log: self.coverage.clone(),
            test_log: self.unit_tests.clone(),
            guide: self.guide.clone(),
            base_uri: Some(self.base.as_deref().map(trim_separators).unwrap_or(destination)),
        }
    }

    fn destination(&self) -> PathBuf {
        PathBuf::from(trim_separators(&self.destination.to_string_lossy()))
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("documentor=info".parse().expect("valid tracing directive")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut config = DocumentorConfig::load_or_default(cli.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(jobs) = cli.jobs {
        config.parser.jobs = jobs;
    }

    let input = cli.pipeline_input();
    let doc = pipeline::run(&input, &config)
        .with_context(|| format!("failed to document {}", input.source.display()))?;

    let destination = cli.destination();
    output::write_documentation(&doc, &destination, &config.output)
        .with_context(|| format!("failed to write {}", destination.display()))?;

    print_summary(&doc, &destination);
    Ok(())
}

fn print_summary(doc: &Documentation, destination: &Path) {
    let (resolved, external, unresolved) = doc.references.counts();
    eprintln!("Documented {} into {}", doc.source_root, destination.display());
    eprintln!("  Files:          {}", doc.files.len());
    eprintln!("  Declarations:   {}", doc.declarations.len());
    eprintln!(
        "  References:     {} resolved, {} external, {} unresolved",
        resolved, external, unresolved
    );
    if let Some(suite) = &doc.metrics.suite {
        eprintln!(
            "  Unit tests:     {} passed, {} failed, {} skipped",
            suite.passed, suite.failed, suite.skipped
        );
    }

    if doc.warnings.is_empty() {
        return;
    }
    let count = |kind: WarningKind| doc.warnings.iter().filter(|w| w.kind == kind).count();
    eprintln!(
        "  Warnings:       {} file, {} declaration, {} metadata",
        count(WarningKind::File),
        count(WarningKind::Declaration),
        count(WarningKind::Metadata)
    );
    for warning in &doc.warnings {
        eprintln!("    {warning}");
    }
}

/// Drop trailing `/` and `\`, keeping a bare root intact.
fn trim_separators(path: &str) -> String {
    match path.trim_end_matches(['/', '\\']) {
        "" => path.to_string(),
        trimmed => trimmed.to_string(),
    }
}
