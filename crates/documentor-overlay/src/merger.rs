//! Attaches coverage and test metrics to declarations.
//!
//! The merger reads the frozen model and produces a separate
//! [`MetricOverlay`]; declarations are never modified. Records it cannot
//! place become metadata warnings, one per path or subject.

use crate::clover::read_clover;
use crate::junit::read_junit;
use crate::record::{CoverageRecord, TestRecord, TestSubject};
use documentor_core::{
    Declaration, DocumentationModel, LineCoverage, Metric, MetricOverlay, TestCase, TestSummary,
    Warning,
};
use documentor_index::{Lookup, SymbolTable};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

pub struct MetadataMerger<'m> {
    model: &'m DocumentationModel,
    symbols: SymbolTable,
    roots: Vec<String>,
    by_file: BTreeMap<&'m str, Vec<&'m Declaration>>,
}

impl<'m> MetadataMerger<'m> {
    pub fn new(model: &'m DocumentationModel) -> Self {
        let mut by_file: BTreeMap<&str, Vec<&Declaration>> = BTreeMap::new();
        for decl in model.declarations.values() {
            by_file.entry(decl.file_path.as_str()).or_default().push(decl);
        }
        Self {
            model,
            symbols: SymbolTable::new(model),
            roots: vec![normalize_root(&model.source_root)],
            by_file,
        }
    }

    /// Another spelling of the source root that log paths may start with,
    /// typically its canonical absolute path.
    pub fn with_root_alias(mut self, alias: &str) -> Self {
        let alias = normalize_root(alias);
        if !alias.is_empty() && !self.roots.contains(&alias) {
            self.roots.push(alias);
        }
        self
    }

    /// Read the given logs and merge them. A log that cannot be read becomes
    /// a metadata warning and counts as not supplied.
    pub fn merge_logs(
        &self,
        coverage_log: Option<&Path>,
        test_log: Option<&Path>,
    ) -> (MetricOverlay, Vec<Warning>) {
        let mut warnings = Vec::new();

        let coverage = coverage_log.and_then(|path| match read_clover(path) {
            Ok(records) => Some(records),
            Err(e) => {
                let warning = Warning::metadata(
                    Some(path.display().to_string()),
                    format!("coverage log ignored: {e}"),
                );
                tracing::warn!("{}", warning);
                warnings.push(warning);
                None
            }
        });
        let tests = test_log.and_then(|path| match read_junit(path) {
            Ok(records) => Some(records),
            Err(e) => {
                let warning = Warning::metadata(
                    Some(path.display().to_string()),
                    format!("unit test log ignored: {e}"),
                );
                tracing::warn!("{}", warning);
                warnings.push(warning);
                None
            }
        });

        let (overlay, mut merge_warnings) = self.merge(coverage.as_deref(), tests.as_deref());
        warnings.append(&mut merge_warnings);
        (overlay, warnings)
    }

    /// Merge already parsed records. `None` means the log was not supplied.
    pub fn merge(
        &self,
        coverage: Option<&[CoverageRecord]>,
        tests: Option<&[TestRecord]>,
    ) -> (MetricOverlay, Vec<Warning>) {
        let mut overlay = MetricOverlay {
            coverage_available: coverage.is_some(),
            tests_available: tests.is_some(),
            ..MetricOverlay::default()
        };
        let mut warnings = Vec::new();

        if let Some(records) = coverage {
            self.merge_coverage(records, &mut overlay, &mut warnings);
        }
        if let Some(records) = tests {
            self.merge_tests(records, &mut overlay, &mut warnings);
        }

        tracing::info!(
            "Merged metadata: {} declarations with metrics, {} warnings",
            overlay.declarations.len(),
            warnings.len()
        );
        (overlay, warnings)
    }

    fn merge_coverage(
        &self,
        records: &[CoverageRecord],
        overlay: &mut MetricOverlay,
        warnings: &mut Vec<Warning>,
    ) {
        // path -> line -> summed count
        let mut lines: BTreeMap<&str, BTreeMap<usize, u64>> = BTreeMap::new();
        let mut unknown: BTreeSet<&str> = BTreeSet::new();
        let mut out_of_range: BTreeMap<&str, usize> = BTreeMap::new();

        for record in records {
            let Some(path) = self.locate(&record.path) else {
                unknown.insert(&record.path);
                continue;
            };
            let line_count = self
                .model
                .files
                .get(path)
                .map(|f| f.line_count)
                .unwrap_or_default();
            if record.line == 0 || record.line > line_count {
                *out_of_range.entry(path).or_default() += 1;
                continue;
            }
            *lines.entry(path).or_default().entry(record.line).or_default() += record.count;
        }

        for path in unknown {
            warnings.push(metadata_warning(
                path,
                "coverage records for a file outside the parsed sources ignored",
            ));
        }
        for (path, count) in out_of_range {
            warnings.push(metadata_warning(
                path,
                format!("{count} coverage records beyond the end of the file ignored"),
            ));
        }

        for (path, counts) in &lines {
            for decl in self.by_file.get(path).into_iter().flatten() {
                let coverage = counts
                    .range(decl.line_start..=decl.line_end)
                    .fold(LineCoverage::default(), |mut c, (_, &count)| {
                        c.sampled += 1;
                        if count > 0 {
                            c.executed += 1;
                        }
                        c
                    });
                if coverage.sampled > 0 {
                    overlay.attach(&decl.qualified_name, Metric::LineCoverage(coverage));
                }
            }
        }
    }

    fn merge_tests(
        &self,
        records: &[TestRecord],
        overlay: &mut MetricOverlay,
        warnings: &mut Vec<Warning>,
    ) {
        let mut suite = TestSummary::default();
        let mut per_declaration: BTreeMap<&str, TestSummary> = BTreeMap::new();
        let mut unresolved: BTreeSet<&TestSubject> = BTreeSet::new();

        for record in records {
            let case = TestCase {
                label: record.label.clone(),
                outcome: record.outcome,
            };
            suite.record(case.clone());

            let Some(subject) = &record.subject else {
                continue;
            };
            let credited = self.subject_declarations(subject);
            if credited.is_empty() {
                unresolved.insert(subject);
                continue;
            }
            for qualified_name in credited {
                per_declaration
                    .entry(qualified_name)
                    .or_default()
                    .record(case.clone());
            }
        }

        for subject in unresolved {
            let path = match subject {
                TestSubject::Location { path, .. } => Some(path.clone()),
                TestSubject::Unit { .. } => None,
            };
            let warning = Warning::metadata(
                path,
                format!("tests for `{subject}` match no declaration; not attributed"),
            );
            tracing::warn!("{}", warning);
            warnings.push(warning);
        }

        for (qualified_name, mut summary) in per_declaration {
            summary.normalize();
            overlay.attach(qualified_name, Metric::TestOutcomes(summary));
        }
        suite.normalize();
        overlay.suite = Some(suite);
    }

    /// Declarations a test subject credits: the matched declaration and its
    /// containers, the same set a location inside it would span.
    fn subject_declarations(&self, subject: &TestSubject) -> Vec<&'m str> {
        match subject {
            TestSubject::Location { path, line } => self
                .locate(path)
                .and_then(|p| self.by_file.get(p))
                .into_iter()
                .flatten()
                .filter(|d| d.spans(*line))
                .map(|d| d.qualified_name.as_str())
                .collect(),
            TestSubject::Unit { unit, member } => {
                let Lookup::Found(unit) = self.symbols.lookup(unit) else {
                    return Vec::new();
                };
                let Some(unit) = self.model.get(&unit) else {
                    return Vec::new();
                };
                let member = member.as_deref().and_then(|m| {
                    self.model
                        .children_of(&unit.qualified_name)
                        .find(|d| d.name.eq_ignore_ascii_case(m))
                });
                self.with_ancestors(member.unwrap_or(unit))
            }
        }
    }

    fn with_ancestors(&self, decl: &'m Declaration) -> Vec<&'m str> {
        let mut names = vec![decl.qualified_name.as_str()];
        let mut parent = decl.parent.as_deref();
        while let Some(p) = parent.and_then(|p| self.model.get(p)) {
            names.push(p.qualified_name.as_str());
            parent = p.parent.as_deref();
        }
        names
    }

    /// Map a log path onto a parsed file.
    ///
    /// A path under a known root must name a parsed file exactly. Any other
    /// absolute path lies outside the sources. A relative path matches
    /// exactly, or as the segment-aligned tail of a single parsed file.
    pub fn locate(&self, raw: &str) -> Option<&'m str> {
        let normalized = raw.replace('\\', "/");
        let files = &self.model.files;

        for root in &self.roots {
            if let Some(rest) = normalized
                .strip_prefix(root.as_str())
                .and_then(|r| r.strip_prefix('/'))
            {
                return files.get_key_value(rest).map(|(path, _)| path.as_str());
            }
        }
        if is_absolute(&normalized) {
            return None;
        }

        let relative = normalized.trim_start_matches("./");
        if let Some((path, _)) = files.get_key_value(relative) {
            return Some(path.as_str());
        }
        let mut within = files.keys().filter(|f| {
            f.strip_suffix(relative)
                .is_some_and(|head| head.ends_with('/'))
        });
        match (within.next(), within.next()) {
            (Some(path), None) => Some(path.as_str()),
            _ => None,
        }
    }
}

/// `/abs/path` or a drive-letter path such as `C:/work`.
fn is_absolute(path: &str) -> bool {
    let bytes = path.as_bytes();
    path.starts_with('/')
        || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':')
}

fn normalize_root(root: &str) -> String {
    let root = root.replace('\\', "/");
    let trimmed = root.trim_end_matches('/');
    trimmed.strip_prefix("./").unwrap_or(trimmed).to_string()
}

fn metadata_warning(path: &str, message: impl Into<String>) -> Warning {
    let warning = Warning::metadata(Some(path.to_string()), message);
    tracing::warn!("{}", warning);
    warning
}

#[cfg(test)]
mod tests {
    use super::*;
    use documentor_core::{local_name, Construct, FileSummary, TestOutcome, Visibility};

    fn decl(qn: &str, construct: Construct, file: &str, start: usize, end: usize) -> Declaration {
        Declaration {
            name: local_name(qn).to_string(),
            qualified_name: qn.to_string(),
            kind: construct.kind(),
            construct,
            parent: qn.rsplit_once('.').map(|(p, _)| p.to_string()),
            documentation: String::new(),
            signature: String::new(),
            visibility: Visibility::Public,
            modifiers: Vec::new(),
            file_path: file.to_string(),
            line_start: start,
            line_end: end,
        }
    }

    fn model() -> DocumentationModel {
        let mut model = DocumentationModel {
            source_root: "/work/src".to_string(),
            ..DocumentationModel::default()
        };
        for d in [
            decl("App\\Foo", Construct::Class, "Foo.php", 5, 30),
            decl("App\\Foo.bar", Construct::Method, "Foo.php", 10, 20),
            decl("App\\Foo.idle", Construct::Method, "Foo.php", 22, 28),
            decl("helper", Construct::Function, "lib/helpers.php", 2, 4),
        ] {
            model.declarations.insert(d.qualified_name.clone(), d);
        }
        model.files.insert(
            "Foo.php".into(),
            FileSummary {
                line_count: 31,
                declarations: 3,
            },
        );
        model.files.insert(
            "lib/helpers.php".into(),
            FileSummary {
                line_count: 5,
                declarations: 1,
            },
        );
        model
    }

    fn cov(path: &str, line: usize, count: u64) -> CoverageRecord {
        CoverageRecord {
            path: path.to_string(),
            line,
            count,
        }
    }

    fn test(label: &str, outcome: TestOutcome, subject: Option<TestSubject>) -> TestRecord {
        TestRecord {
            label: label.to_string(),
            outcome,
            subject,
        }
    }

    #[test]
    fn coverage_aggregates_sampled_lines_in_range() {
        let model = model();
        let merger = MetadataMerger::new(&model);
        let records = vec![
            cov("/work/src/Foo.php", 10, 1),
            cov("/work/src/Foo.php", 15, 0),
            cov("/work/src/Foo.php", 20, 1),
        ];
        let (overlay, warnings) = merger.merge(Some(&records), None);
        assert!(warnings.is_empty());
        let bar = overlay.coverage("App\\Foo.bar").unwrap();
        assert_eq!((bar.executed, bar.sampled), (2, 3));
        assert_eq!(bar.percent(), Some(66));
        assert_eq!(overlay.coverage("App\\Foo").unwrap().sampled, 3);
    }

    #[test]
    fn unsampled_declaration_has_no_data() {
        let model = model();
        let merger = MetadataMerger::new(&model);
        let records = vec![cov("Foo.php", 10, 0)];
        let (overlay, _) = merger.merge(Some(&records), None);
        assert_eq!(overlay.coverage_status("App\\Foo.bar").to_string(), "0% covered");
        assert_eq!(overlay.coverage_status("App\\Foo.idle").to_string(), "no data");
        assert!(overlay.coverage("helper").is_none());
        assert!(overlay.coverage_available);
        assert!(!overlay.tests_available);
    }

    #[test]
    fn unknown_paths_warn_once_per_path() {
        let model = model();
        let merger = MetadataMerger::new(&model);
        let records = vec![
            cov("/elsewhere/Other.php", 1, 1),
            cov("/elsewhere/Other.php", 2, 1),
            cov("Foo.php", 99, 1),
            cov("Foo.php", 98, 1),
        ];
        let (overlay, warnings) = merger.merge(Some(&records), None);
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].path.as_deref(), Some("/elsewhere/Other.php"));
        assert!(warnings[1].message.starts_with("2 coverage records"));
        assert!(overlay.declarations.is_empty());
    }

    #[test]
    fn locate_strips_roots_and_matches_relative_tails() {
        let model = model();
        let merger = MetadataMerger::new(&model).with_root_alias("/real/checkout/src/");
        assert_eq!(merger.locate("/work/src/Foo.php"), Some("Foo.php"));
        assert_eq!(merger.locate("/real/checkout/src/lib/helpers.php"), Some("lib/helpers.php"));
        assert_eq!(merger.locate("helpers.php"), Some("lib/helpers.php"));
        assert_eq!(merger.locate("./Foo.php"), Some("Foo.php"));
        assert_eq!(merger.locate("/work/src/Bar.php"), None);
        assert_eq!(merger.locate("/work/src/sub/Foo.php"), None);
    }

    #[test]
    fn absolute_paths_outside_the_roots_never_match() {
        let model = model();
        let merger = MetadataMerger::new(&model);
        assert_eq!(merger.locate("/opt/vendor/acme/Foo.php"), None);
        assert_eq!(merger.locate("C:\\ci\\src\\lib\\helpers.php"), None);
        assert_eq!(merger.locate("vendor/acme/Foo.php"), None);
    }

    #[test]
    fn same_basename_outside_root_does_not_leak_coverage() {
        let model = model();
        let merger = MetadataMerger::new(&model);
        let records = vec![
            cov("/work/src/Foo.php", 12, 0),
            cov("/opt/vendor/acme/Foo.php", 12, 7),
            cov("/opt/vendor/acme/Foo.php", 15, 7),
        ];
        let (overlay, warnings) = merger.merge(Some(&records), None);

        let bar = overlay.coverage("App\\Foo.bar").unwrap();
        assert_eq!((bar.executed, bar.sampled), (0, 1));
        assert_eq!(overlay.coverage_status("App\\Foo.bar").to_string(), "0% covered");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].path.as_deref(), Some("/opt/vendor/acme/Foo.php"));
    }

    #[test]
    fn tests_credit_member_and_containers() {
        let model = model();
        let merger = MetadataMerger::new(&model);
        let records = vec![
            test(
                "FooTest::testBar",
                TestOutcome::Passed,
                TestSubject::from_convention("FooTest", "testBar"),
            ),
            test(
                "FooTest::testBarFails",
                TestOutcome::Failed,
                Some(TestSubject::Location {
                    path: "/work/src/Foo.php".into(),
                    line: 12,
                }),
            ),
            test("SmokeTest::testBoot", TestOutcome::Skipped, None),
        ];
        let (overlay, warnings) = merger.merge(None, Some(&records));
        assert!(warnings.is_empty());

        let bar = overlay.tests("App\\Foo.bar").unwrap();
        assert_eq!((bar.passed, bar.failed, bar.skipped), (1, 1, 0));
        assert_eq!(overlay.tests("App\\Foo").unwrap().total(), 2);
        assert!(overlay.tests("App\\Foo.idle").is_none());

        let suite = overlay.suite.as_ref().unwrap();
        assert_eq!(suite.total(), 3);
        assert_eq!(suite.skipped, 1);
    }

    #[test]
    fn unknown_member_credits_the_unit() {
        let model = model();
        let merger = MetadataMerger::new(&model);
        let records = vec![test(
            "FooTest::testSomethingElse",
            TestOutcome::Passed,
            TestSubject::from_convention("FooTest", "testSomethingElse"),
        )];
        let (overlay, _) = merger.merge(None, Some(&records));
        assert_eq!(overlay.tests("App\\Foo").unwrap().passed, 1);
        assert!(overlay.tests("App\\Foo.bar").is_none());
    }

    #[test]
    fn unresolvable_subjects_warn_once() {
        let model = model();
        let merger = MetadataMerger::new(&model);
        let subject = TestSubject::from_convention("GhostTest", "testA");
        let records = vec![
            test("GhostTest::testA", TestOutcome::Passed, subject.clone()),
            test("GhostTest::testA2", TestOutcome::Passed, subject),
        ];
        let (overlay, warnings) = merger.merge(None, Some(&records));
        assert_eq!(warnings.len(), 1);
        assert!(overlay.declarations.is_empty());
        assert_eq!(overlay.suite.unwrap().passed, 2);
    }

    #[test]
    fn unreadable_logs_become_metadata_warnings() {
        let model = model();
        let merger = MetadataMerger::new(&model);
        let (overlay, warnings) = merger.merge_logs(
            Some(Path::new("/nonexistent/clover.xml")),
            Some(Path::new("/nonexistent/junit.xml")),
        );
        assert_eq!(warnings.len(), 2);
        assert!(!overlay.coverage_available);
        assert!(!overlay.tests_available);
    }

    #[test]
    fn merges_logs_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let clover = dir.path().join("clover.xml");
        std::fs::write(
            &clover,
            r#"<coverage><project><file name="/work/src/lib/helpers.php">
                 <line num="3" type="stmt" count="2"/>
               </file></project></coverage>"#,
        )
        .unwrap();

        let model = model();
        let merger = MetadataMerger::new(&model);
        let (overlay, warnings) = merger.merge_logs(Some(&clover), None);
        assert!(warnings.is_empty());
        assert_eq!(overlay.coverage_status("helper").to_string(), "100% covered");
    }
}
