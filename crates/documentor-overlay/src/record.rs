//! Normalized records read from coverage and unit test logs.

use documentor_core::TestOutcome;
use serde::{Deserialize, Serialize};

/// One sampled line of a coverage log.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CoverageRecord {
    /// Path as written in the log, possibly absolute.
    pub path: String,
    /// 1-based line number.
    pub line: usize,
    /// Execution count; zero means sampled but never run.
    pub count: u64,
}

/// What a test exercises.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum TestSubject {
    /// A source position; every declaration spanning it is credited.
    Location { path: String, line: usize },
    /// A named unit, optionally narrowed to one of its members.
    Unit {
        unit: String,
        member: Option<String>,
    },
}

impl std::fmt::Display for TestSubject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Location { path, line } => write!(f, "{path}:{line}"),
            Self::Unit {
                unit,
                member: Some(member),
            } => write!(f, "{unit}.{member}"),
            Self::Unit { unit, member: None } => write!(f, "{unit}"),
        }
    }
}

/// One test case of a unit test log.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TestRecord {
    /// `Class::method` as reported by the runner.
    pub label: String,
    pub outcome: TestOutcome,
    pub subject: Option<TestSubject>,
}

impl TestSubject {
    /// Derive a subject from the xUnit naming convention:
    /// `Tests\FooTest::testBarBaz` exercises `Foo.barBaz`.
    ///
    /// Returns `None` when the test class does not end in `Test`.
    pub fn from_convention(class: &str, method: &str) -> Option<Self> {
        let class = class.rsplit(['\\', '.']).next().unwrap_or(class);
        let unit = class.strip_suffix("Test").filter(|u| !u.is_empty())?;

        // Data providers append " with data set #n".
        let method = method.split_whitespace().next().unwrap_or_default();
        let member = method
            .strip_prefix("test")
            .map(|m| m.trim_start_matches('_'))
            .filter(|m| !m.is_empty())
            .map(lower_first);

        Some(Self::Unit {
            unit: unit.to_string(),
            member,
        })
    }
}

fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
