//! Coverage and test-outcome metrics overlaid onto declarations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Executed versus sampled lines inside one declaration's range.
///
/// Only lines that carry a coverage record are sampled, so a ten line method
/// with three instrumented statements has `sampled == 3`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineCoverage {
    pub executed: usize,
    pub sampled: usize,
}

impl LineCoverage {
    /// Whole-number percentage, rounded down. `None` when nothing was sampled.
    pub fn percent(&self) -> Option<usize> {
        (self.sampled > 0).then(|| self.executed * 100 / self.sampled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestOutcome {
    Passed,
    Failed,
    Skipped,
}

impl std::fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TestCase {
    pub label: String,
    pub outcome: TestOutcome,
}

/// Pass/fail/skip counts plus the individual cases that produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cases: Vec<TestCase>,
}

impl TestSummary {
    pub fn record(&mut self, case: TestCase) {
        match case.outcome {
            TestOutcome::Passed => self.passed += 1,
            TestOutcome::Failed => self.failed += 1,
            TestOutcome::Skipped => self.skipped += 1,
        }
        self.cases.push(case);
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    /// Sort cases so the summary serializes identically whatever the log order.
    pub fn normalize(&mut self) {
        self.cases.sort();
    }
}

/// One measurement attached to a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Metric {
    LineCoverage(LineCoverage),
    TestOutcomes(TestSummary),
}

/// Coverage display state. Keeps "no data" apart from "0% covered".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageStatus {
    NoData,
    Measured(LineCoverage),
}

impl std::fmt::Display for CoverageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoData => write!(f, "no data"),
            Self::Measured(coverage) => match coverage.percent() {
                Some(pct) => write!(f, "{pct}% covered"),
                None => write!(f, "no data"),
            },
        }
    }
}

/// All metrics of a run, keyed by declaration qualified name.
///
/// Declarations are never touched; the overlay only refers to them by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricOverlay {
    /// Whether a coverage log was supplied and read.
    pub coverage_available: bool,
    /// Whether a unit test log was supplied and read.
    pub tests_available: bool,
    pub declarations: BTreeMap<String, Vec<Metric>>,
    /// Every test in the log, attributed or not.
    pub suite: Option<TestSummary>,
}

impl MetricOverlay {
    pub fn attach(&mut self, qualified_name: &str, metric: Metric) {
        self.declarations
            .entry(qualified_name.to_string())
            .or_default()
            .push(metric);
    }

    pub fn metrics(&self, qualified_name: &str) -> &[Metric] {
        self.declarations
            .get(qualified_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn coverage(&self, qualified_name: &str) -> Option<&LineCoverage> {
        self.metrics(qualified_name).iter().find_map(|m| match m {
            Metric::LineCoverage(c) => Some(c),
            Metric::TestOutcomes(_) => None,
        })
    }

    pub fn tests(&self, qualified_name: &str) -> Option<&TestSummary> {
        self.metrics(qualified_name).iter().find_map(|m| match m {
            Metric::TestOutcomes(t) => Some(t),
            Metric::LineCoverage(_) => None,
        })
    }

    pub fn coverage_status(&self, qualified_name: &str) -> CoverageStatus {
        match self.coverage(qualified_name) {
            Some(c) => CoverageStatus::Measured(*c),
            None => CoverageStatus::NoData,
        }
    }
}
