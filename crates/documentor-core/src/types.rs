use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Source Units ────────────────────────────────────────────────────────────

/// One input file handed to the declaration parser.
///
/// `path` is relative to the source root and always `/`-separated, so the
/// same tree produces the same identities on every platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub path: String,
    pub text: String,
}

impl SourceUnit {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into().replace('\\', "/"),
            text: text.into(),
        }
    }

    /// Number of lines in the unit. A trailing newline does not open a new line.
    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }
}

/// What survives of a [`SourceUnit`] once it has been parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub line_count: usize,
    pub declarations: usize,
}

// ── Declarations ────────────────────────────────────────────────────────────

/// Coarse classification of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    Type,
    Member,
    Callable,
}

impl std::fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Type => write!(f, "type"),
            Self::Member => write!(f, "member"),
            Self::Callable => write!(f, "callable"),
        }
    }
}

/// The source construct a declaration was recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Construct {
    Class,
    Interface,
    Trait,
    Enum,
    Method,
    Function,
    Property,
    Constant,
    EnumCase,
}

impl Construct {
    pub fn kind(self) -> DeclarationKind {
        match self {
            Self::Class | Self::Interface | Self::Trait | Self::Enum => DeclarationKind::Type,
            Self::Method | Self::Function => DeclarationKind::Callable,
            Self::Property | Self::Constant | Self::EnumCase => DeclarationKind::Member,
        }
    }
}

impl std::fmt::Display for Construct {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Class => write!(f, "class"),
            Self::Interface => write!(f, "interface"),
            Self::Trait => write!(f, "trait"),
            Self::Enum => write!(f, "enum"),
            Self::Method => write!(f, "method"),
            Self::Function => write!(f, "function"),
            Self::Property => write!(f, "property"),
            Self::Constant => write!(f, "constant"),
            Self::EnumCase => write!(f, "enum_case"),
        }
    }
}

/// Visibility of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Protected => write!(f, "protected"),
            Self::Private => write!(f, "private"),
        }
    }
}

/// A documented structural element extracted from a source unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// Local name as written (`bar`, `$count`, `Foo`).
    pub name: String,
    /// Globally unique name (`App\Models\User.save`).
    pub qualified_name: String,
    pub kind: DeclarationKind,
    pub construct: Construct,
    /// Qualified name of the containing declaration.
    pub parent: Option<String>,
    /// PHPDoc text with comment delimiters stripped, otherwise untouched.
    pub documentation: String,
    /// Declaration head, up to the opening brace or terminating semicolon.
    pub signature: String,
    pub visibility: Visibility,
    pub modifiers: Vec<String>,
    /// Source-root relative path of the defining unit.
    pub file_path: String,
    /// 1-based first line.
    pub line_start: usize,
    /// 1-based last line, inclusive.
    pub line_end: usize,
}

impl Declaration {
    /// Whether `line` falls inside this declaration's range.
    pub fn spans(&self, line: usize) -> bool {
        self.line_start <= line && line <= self.line_end
    }

    /// Whether `other` lies entirely within this declaration's range and file.
    pub fn contains(&self, other: &Declaration) -> bool {
        self.file_path == other.file_path
            && self.line_start <= other.line_start
            && other.line_end <= self.line_end
    }
}

/// The last segment of a qualified name (`App\Foo.bar` → `bar`).
pub fn local_name(qualified: &str) -> &str {
    qualified.rsplit(['.', '\\']).next().unwrap_or(qualified)
}

// ── References ──────────────────────────────────────────────────────────────

/// How a declaration's signature or body mentions another symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Extends,
    Implements,
    UsesTrait,
    ParameterType,
    ReturnType,
    PropertyType,
    Instantiates,
    Calls,
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Extends => write!(f, "extends"),
            Self::Implements => write!(f, "implements"),
            Self::UsesTrait => write!(f, "uses_trait"),
            Self::ParameterType => write!(f, "parameter_type"),
            Self::ReturnType => write!(f, "return_type"),
            Self::PropertyType => write!(f, "property_type"),
            Self::Instantiates => write!(f, "instantiates"),
            Self::Calls => write!(f, "calls"),
        }
    }
}

/// A reference as the parser saw it, before resolution.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RawReference {
    /// Qualified name of the declaration the reference appears in.
    pub source: String,
    /// The name exactly as written (`Foo`, `\Foo\Bar`, `Foo::bar`).
    pub name: String,
    /// The name expanded through namespace and `use` rules, when that differs.
    pub hint: Option<String>,
    pub kind: ReferenceKind,
    pub line: usize,
}

/// Outcome of resolving one [`RawReference`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "target", rename_all = "snake_case")]
pub enum Resolution {
    Resolved(String),
    External,
    Unresolved,
}

impl Resolution {
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Resolved(target) => Some(target),
            _ => None,
        }
    }
}

/// A reference after resolution against the whole model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub source: String,
    pub raw_name: String,
    pub kind: ReferenceKind,
    pub line: usize,
    pub resolution: Resolution,
}

// ── Model ───────────────────────────────────────────────────────────────────

/// The frozen, globally consistent declaration set of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationModel {
    pub source_root: String,
    pub files: BTreeMap<String, FileSummary>,
    pub declarations: BTreeMap<String, Declaration>,
    pub references: Vec<RawReference>,
}

impl DocumentationModel {
    pub fn get(&self, qualified_name: &str) -> Option<&Declaration> {
        self.declarations.get(qualified_name)
    }

    /// Declarations without a container, ordered by qualified name.
    pub fn top_level(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.values().filter(|d| d.parent.is_none())
    }

    /// Direct children of `qualified_name`, ordered by qualified name.
    pub fn children_of<'a>(
        &'a self,
        qualified_name: &'a str,
    ) -> impl Iterator<Item = &'a Declaration> + 'a {
        self.declarations
            .values()
            .filter(move |d| d.parent.as_deref() == Some(qualified_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(qn: &str, parent: Option<&str>, start: usize, end: usize) -> Declaration {
        Declaration {
            name: local_name(qn).to_string(),
            qualified_name: qn.to_string(),
            kind: DeclarationKind::Type,
            construct: Construct::Class,
            parent: parent.map(str::to_string),
            documentation: String::new(),
            signature: String::new(),
            visibility: Visibility::Public,
            modifiers: Vec::new(),
            file_path: "a.php".to_string(),
            line_start: start,
            line_end: end,
        }
    }

    #[test]
    fn local_name_takes_last_segment() {
        assert_eq!(local_name("App\\Models\\User.save"), "save");
        assert_eq!(local_name("App\\Models\\User"), "User");
        assert_eq!(local_name("Foo"), "Foo");
        assert_eq!(local_name("Foo.$count"), "$count");
    }

    #[test]
    fn line_count_ignores_trailing_newline() {
        let unit = SourceUnit::new("a.php", "<?php\nclass A {}\n");
        assert_eq!(unit.line_count(), 2);
    }

    #[test]
    fn source_unit_normalizes_separators() {
        let unit = SourceUnit::new("src\\Models\\User.php", "");
        assert_eq!(unit.path, "src/Models/User.php");
    }

    #[test]
    fn construct_maps_to_kind() {
        assert_eq!(Construct::Trait.kind(), DeclarationKind::Type);
        assert_eq!(Construct::Method.kind(), DeclarationKind::Callable);
        assert_eq!(Construct::EnumCase.kind(), DeclarationKind::Member);
    }

    #[test]
    fn contains_checks_range() {
        let parent = decl("Foo", None, 2, 10);
        assert!(parent.contains(&decl("Foo.bar", Some("Foo"), 3, 5)));
        assert!(!parent.contains(&decl("Foo.baz", Some("Foo"), 9, 11)));
        assert!(parent.spans(10));
        assert!(!parent.spans(1));
    }

    #[test]
    fn model_children_are_ordered() {
        let mut model = DocumentationModel::default();
        for d in [
            decl("Foo", None, 1, 10),
            decl("Foo.zed", Some("Foo"), 2, 3),
            decl("Foo.alpha", Some("Foo"), 4, 5),
            decl("Bar", None, 11, 12),
        ] {
            model.declarations.insert(d.qualified_name.clone(), d);
        }
        let top: Vec<_> = model.top_level().map(|d| d.qualified_name.as_str()).collect();
        assert_eq!(top, vec!["Bar", "Foo"]);
        let children: Vec<_> = model
            .children_of("Foo")
            .map(|d| d.qualified_name.as_str())
            .collect();
        assert_eq!(children, vec!["Foo.alpha", "Foo.zed"]);
    }

    #[test]
    fn resolution_serializes_with_state_tag() {
        let json = serde_json::to_string(&Resolution::Resolved("Foo".into())).unwrap();
        assert_eq!(json, r#"{"state":"resolved","target":"Foo"}"#);
        let json = serde_json::to_string(&Resolution::External).unwrap();
        assert_eq!(json, r#"{"state":"external"}"#);
    }
}
