//! Integration tests for the documentor pipeline: whole source trees on
//! disk, real coverage and test logs, and the JSON deliverables.

use documentor::{output, pipeline, Documentation, PipelineInput};
use documentor_core::{
    DocumentorConfig, DocumentorError, OutputConfig, Resolution, SourceUnit, WarningKind,
};
use documentor_toc::TocTarget;
use std::fs;
use std::path::Path;

const FOO: &str = "<?php
class Foo {
    /** Does X */
    public function bar() {
        return 1;
    }
}
";

const BAZ: &str = "<?php
class Baz extends Foo {
}
";

fn source_tree() -> tempfile::TempDir {
    let dir = tempfile::Builder::new()
        .prefix("documentor-")
        .tempdir()
        .unwrap();
    fs::write(dir.path().join("A.php"), FOO).unwrap();
    fs::write(dir.path().join("B.php"), BAZ).unwrap();
    dir
}

fn input(root: &Path) -> PipelineInput {
    PipelineInput {
        source: root.to_path_buf(),
        base_uri: Some("/docs".to_string()),
        ..PipelineInput::default()
    }
}

fn run(input: &PipelineInput) -> Documentation {
    pipeline::run(input, &DocumentorConfig::default()).unwrap()
}

// ── End to end ─────────────────────────────────────────────────────────────

#[test]
fn foo_bar_baz_scenario() {
    let dir = source_tree();
    let doc = run(&input(dir.path()));

    let names: Vec<_> = doc.declarations.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["Baz", "Foo", "Foo.bar"]);

    let bar = &doc.declarations["Foo.bar"];
    assert_eq!((bar.line_start, bar.line_end), (4, 6));
    assert_eq!(bar.documentation, "Does X");
    assert_eq!(bar.parent.as_deref(), Some("Foo"));

    let extends: Vec<_> = doc.references.references_to("Foo").collect();
    assert_eq!(extends.len(), 1);
    assert_eq!(extends[0].source, "Baz");
    assert_eq!(extends[0].resolution, Resolution::Resolved("Foo".into()));

    let top: Vec<_> = doc.toc.children.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(top, vec!["Baz", "Foo"]);
    assert_eq!(doc.toc.children[1].children[0].label, "bar");

    for (key, target) in [("foo", "Foo"), ("foo.bar", "Foo.bar"), ("baz", "Baz")] {
        assert_eq!(doc.search.lookup(key)[0].qualified_name, target);
    }

    assert_eq!(doc.base_uri.as_deref(), Some("/docs"));
    assert!(doc.warnings.is_empty());
}

#[test]
fn missing_source_root_is_fatal() {
    let result = pipeline::run(
        &input(Path::new("/nonexistent/documentor/src")),
        &DocumentorConfig::default(),
    );
    assert!(matches!(result, Err(DocumentorError::SourceRoot(_))));
}

// ── Determinism ────────────────────────────────────────────────────────────

#[test]
fn repeated_runs_are_byte_identical() {
    let dir = source_tree();
    let out_a = tempfile::tempdir().unwrap();
    let out_b = tempfile::tempdir().unwrap();

    for out in [&out_a, &out_b] {
        let doc = run(&input(dir.path()));
        output::write_documentation(&doc, out.path(), &OutputConfig::default()).unwrap();
    }

    for file in [
        output::DOCUMENTATION_FILE,
        output::TOC_FILE,
        output::SEARCH_FILE,
    ] {
        assert_eq!(
            fs::read(out_a.path().join(file)).unwrap(),
            fs::read(out_b.path().join(file)).unwrap(),
            "{file} differs between runs"
        );
    }
}

#[test]
fn unit_order_does_not_change_output() {
    let units = vec![
        SourceUnit::new("A.php", FOO),
        SourceUnit::new("B.php", BAZ),
        SourceUnit::new("C.php", "<?php\nclass Foo {}\nfunction parse() {}\n"),
    ];
    let mut reversed = units.clone();
    reversed.reverse();

    let config = DocumentorConfig::default();
    let forward = pipeline::document_units("src", &units, &config, None, None).unwrap();
    let backward = pipeline::document_units("src", &reversed, &config, None, None).unwrap();

    assert_eq!(
        serde_json::to_string(&forward).unwrap(),
        serde_json::to_string(&backward).unwrap()
    );
    assert_eq!(forward.declarations["Foo"].file_path, "A.php");
    assert_eq!(forward.warnings.len(), 1);
    assert_eq!(forward.warnings[0].kind, WarningKind::Declaration);
    assert_eq!(forward.warnings[0].path.as_deref(), Some("C.php"));
}

#[test]
fn parents_contain_their_children() {
    let source = "<?php
namespace App;

interface Shape {
    const SIDES = 0;
    public function area(): float;
}

enum Suit: string {
    case Hearts = 'H';
    case Spades = 'S';
    public function color(): string { return 'red'; }
}

class Square implements Shape {
    private int $side = 1;
    public function area(): float {
        return $this->side * $this->side;
    }
}
";
    let units = vec![SourceUnit::new("Shapes.php", source)];
    let doc =
        pipeline::document_units("src", &units, &DocumentorConfig::default(), None, None).unwrap();

    assert!(doc.declarations.contains_key("App\\Suit.Hearts"));
    assert!(doc.declarations.contains_key("App\\Square.$side"));
    for decl in doc.declarations.values() {
        assert!(decl.line_start <= decl.line_end);
        if let Some(parent) = &decl.parent {
            let parent = &doc.declarations[parent];
            assert!(
                parent.contains(decl),
                "{} escapes {}",
                decl.qualified_name,
                parent.qualified_name
            );
        }
    }
}

#[test]
fn truncated_class_is_recovered_with_a_warning() {
    let source = "<?php
class Good {
    public function ok() {}
}

class Broken {
    public function half( {
";
    let units = vec![SourceUnit::new("Broken.php", source)];
    let doc =
        pipeline::document_units("src", &units, &DocumentorConfig::default(), None, None).unwrap();

    assert!(doc.declarations.contains_key("Good.ok"));
    let broken = &doc.declarations["Broken"];
    assert_eq!(broken.line_start, 6);
    assert!(doc.search.lookup("broken").iter().any(|t| t.qualified_name == "Broken"));
    assert!(doc
        .warnings
        .iter()
        .any(|w| w.kind == WarningKind::Declaration && w.message.contains("`Broken`")));
}

// ── Metadata ───────────────────────────────────────────────────────────────

#[test]
fn coverage_and_test_logs_are_overlaid() {
    let dir = source_tree();
    let logs = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();

    let clover = logs.path().join("clover.xml");
    fs::write(
        &clover,
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<coverage generated="0">
  <project timestamp="0">
    <file name="{root}/A.php">
      <line num="4" type="method" name="bar" count="1"/>
      <line num="5" type="stmt" count="1"/>
    </file>
    <file name="/somewhere/else/Vendor.php">
      <line num="1" type="stmt" count="1"/>
    </file>
  </project>
</coverage>"#,
            root = root.display()
        ),
    )
    .unwrap();

    let junit = logs.path().join("junit.xml");
    fs::write(
        &junit,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuites>
  <testsuite name="Unit">
    <testcase name="testBar" class="Tests\FooTest" file="/ci/tests/FooTest.php" line="9"/>
    <testcase name="testBarAgain" class="Tests\FooTest" file="/ci/tests/FooTest.php" line="14">
      <failure>nope</failure>
    </testcase>
    <testcase name="testNothing" class="Tests\GhostTest" file="/ci/tests/GhostTest.php" line="3"/>
  </testsuite>
</testsuites>"#,
    )
    .unwrap();

    let mut input = input(dir.path());
    input.coverage_log = Some(clover);
    input.test_log = Some(junit);
    let doc = run(&input);

    assert_eq!(
        doc.metrics.coverage_status("Foo.bar").to_string(),
        "100% covered"
    );
    assert_eq!(doc.metrics.coverage_status("Baz").to_string(), "no data");

    let bar = doc.metrics.tests("Foo.bar").unwrap();
    assert_eq!((bar.passed, bar.failed), (1, 0));
    let foo = doc.metrics.tests("Foo").unwrap();
    assert_eq!((foo.passed, foo.failed), (1, 1));
    assert_eq!(doc.metrics.suite.as_ref().unwrap().total(), 3);

    let metadata: Vec<_> = doc
        .warnings
        .iter()
        .filter(|w| w.kind == WarningKind::Metadata)
        .collect();
    assert_eq!(metadata.len(), 2, "{metadata:?}");
}

#[test]
fn coverage_for_a_same_named_file_elsewhere_is_not_credited() {
    let dir = source_tree();
    let logs = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();

    let clover = logs.path().join("clover.xml");
    fs::write(
        &clover,
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<coverage generated="0">
  <project timestamp="0">
    <file name="{root}/A.php">
      <line num="5" type="stmt" count="0"/>
    </file>
    <file name="/opt/vendor/acme/A.php">
      <line num="5" type="stmt" count="7"/>
      <line num="6" type="stmt" count="7"/>
    </file>
  </project>
</coverage>"#,
            root = root.display()
        ),
    )
    .unwrap();

    let mut input = input(dir.path());
    input.coverage_log = Some(clover);
    let doc = run(&input);

    let bar = doc.metrics.coverage("Foo.bar").unwrap();
    assert_eq!((bar.executed, bar.sampled), (0, 1));
    assert_eq!(doc.metrics.coverage_status("Foo.bar").to_string(), "0% covered");

    let metadata: Vec<_> = doc
        .warnings
        .iter()
        .filter(|w| w.kind == WarningKind::Metadata)
        .collect();
    assert_eq!(metadata.len(), 1, "{metadata:?}");
    assert_eq!(metadata[0].path.as_deref(), Some("/opt/vendor/acme/A.php"));
}

#[test]
fn missing_logs_and_guide_are_warnings() {
    let dir = source_tree();
    let mut input = input(dir.path());
    input.coverage_log = Some(dir.path().join("missing-clover.xml"));
    input.guide = Some(dir.path().join("missing-guide"));

    let doc = run(&input);
    assert!(!doc.metrics.coverage_available);
    assert!(doc.guide.is_none());
    let kinds: Vec<_> = doc.warnings.iter().map(|w| w.kind).collect();
    assert_eq!(kinds, vec![WarningKind::File, WarningKind::Metadata]);
    assert!(doc.toc.find(&TocTarget::GuideSection(String::new())).is_none());
}

#[test]
fn guide_is_attached_and_copied() {
    let dir = source_tree();
    let guide = tempfile::tempdir().unwrap();
    fs::write(guide.path().join("index.html"), "<p>welcome</p>").unwrap();

    let mut input = input(dir.path());
    input.guide = Some(guide.path().to_path_buf());
    let doc = run(&input);

    let section = doc.toc.children.last().unwrap();
    assert_eq!(section.label, documentor_toc::GUIDE_LABEL);
    assert_eq!(
        section.children[0].target,
        TocTarget::GuidePage("index.html".into())
    );

    let out = tempfile::tempdir().unwrap();
    output::write_documentation(&doc, out.path(), &OutputConfig::default()).unwrap();
    assert_eq!(
        fs::read_to_string(out.path().join("guide/index.html")).unwrap(),
        "<p>welcome</p>"
    );
}
