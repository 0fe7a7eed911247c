//! JUnit XML unit test log reader.

use crate::record::{TestRecord, TestSubject};
use documentor_core::{DocumentorError, TestOutcome};
use std::path::Path;

pub fn read_junit(path: &Path) -> Result<Vec<TestRecord>, DocumentorError> {
    let xml = std::fs::read_to_string(path)?;
    parse_junit(&xml)
}

/// Every `<testcase>` of the log, whatever the suite nesting.
///
/// A case's subject comes from the naming convention when its class follows
/// it, otherwise from its `file`/`line` attributes.
pub fn parse_junit(xml: &str) -> Result<Vec<TestRecord>, DocumentorError> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| DocumentorError::LogFormat(format!("junit: {e}")))?;
    let root = doc.root_element();
    if !(root.has_tag_name("testsuites") || root.has_tag_name("testsuite")) {
        return Err(DocumentorError::LogFormat(format!(
            "junit: expected <testsuites>, found <{}>",
            root.tag_name().name()
        )));
    }

    let records = root
        .descendants()
        .filter(|n| n.has_tag_name("testcase"))
        .map(|case| {
            let name = case.attribute("name").unwrap_or_default();
            let class = case
                .attribute("class")
                .or_else(|| case.attribute("classname"))
                .unwrap_or_default();

            let outcome = if case
                .children()
                .any(|c| c.has_tag_name("failure") || c.has_tag_name("error"))
            {
                TestOutcome::Failed
            } else if case.children().any(|c| c.has_tag_name("skipped")) {
                TestOutcome::Skipped
            } else {
                TestOutcome::Passed
            };

            let subject = TestSubject::from_convention(class, name).or_else(|| {
                let path = case.attribute("file")?;
                let line = case.attribute("line")?.parse().ok()?;
                Some(TestSubject::Location {
                    path: path.to_string(),
                    line,
                })
            });

            let label = if class.is_empty() {
                name.to_string()
            } else {
                format!("{class}::{name}")
            };
            TestRecord {
                label,
                outcome,
                subject,
            }
        })
        .collect();
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuites>
  <testsuite name="Unit" tests="4">
    <testsuite name="Tests\FooTest" file="/work/tests/FooTest.php" tests="3">
      <testcase name="testBar" class="Tests\FooTest" classname="Tests.FooTest" file="/work/tests/FooTest.php" line="12" assertions="1" time="0.01"/>
      <testcase name="testBaz" class="Tests\FooTest" file="/work/tests/FooTest.php" line="18">
        <failure type="PHPUnit\Framework\ExpectationFailedException">boom</failure>
      </testcase>
      <testcase name="testLater" class="Tests\FooTest" file="/work/tests/FooTest.php" line="24">
        <skipped/>
      </testcase>
    </testsuite>
    <testcase name="it_checks" class="Checks" file="/work/src/Foo.php" line="7">
      <error type="Error">bad</error>
    </testcase>
    <testcase name="orphan"/>
  </testsuite>
</testsuites>"#;

    #[test]
    fn maps_outcomes_and_labels() {
        let records = parse_junit(LOG).unwrap();
        let outcomes: Vec<_> = records
            .iter()
            .map(|r| (r.label.as_str(), r.outcome))
            .collect();
        assert_eq!(
            outcomes,
            vec![
                ("Tests\\FooTest::testBar", TestOutcome::Passed),
                ("Tests\\FooTest::testBaz", TestOutcome::Failed),
                ("Tests\\FooTest::testLater", TestOutcome::Skipped),
                ("Checks::it_checks", TestOutcome::Failed),
                ("orphan", TestOutcome::Passed),
            ]
        );
    }

    #[test]
    fn subjects_prefer_naming_convention() {
        let records = parse_junit(LOG).unwrap();
        assert_eq!(
            records[0].subject,
            Some(TestSubject::Unit {
                unit: "Foo".into(),
                member: Some("bar".into())
            })
        );
        assert_eq!(
            records[3].subject,
            Some(TestSubject::Location {
                path: "/work/src/Foo.php".into(),
                line: 7
            })
        );
        assert_eq!(records[4].subject, None);
    }

    #[test]
    fn rejects_other_documents() {
        assert!(matches!(
            parse_junit("<coverage/>"),
            Err(DocumentorError::LogFormat(_))
        ));
    }
}
