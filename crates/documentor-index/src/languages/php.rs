//! PHP language extractor using tree-sitter-php.
//!
//! Walks the syntax tree once, keeping track of the current namespace and
//! the `use` imports in effect, and emits declarations together with the raw
//! references found in their signatures and bodies.

use crate::extractor::{ExtractOptions, Extraction, LanguageExtractor};
use documentor_core::{Construct, Declaration, RawReference, ReferenceKind, Visibility, Warning};
use std::collections::{BTreeMap, HashSet};
use tree_sitter::{Node, Tree};

/// Names that look like types but never point at a declaration.
const PSEUDO_TYPES: &[&str] = &[
    "array", "bool", "callable", "false", "float", "int", "iterable", "mixed", "never", "null",
    "object", "parent", "self", "static", "string", "true", "void",
];

/// PHP language extractor for tree-sitter-based declaration parsing.
pub struct PhpExtractor;

impl PhpExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PhpExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageExtractor for PhpExtractor {
    fn language_name(&self) -> &str {
        "php"
    }

    fn file_extensions(&self) -> &[&str] {
        &["php"]
    }

    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_php::LANGUAGE_PHP.into()
    }

    fn extract(
        &self,
        tree: &Tree,
        source: &[u8],
        file_path: &str,
        options: &ExtractOptions,
    ) -> Extraction {
        let mut walker = Walker::new(source, file_path, *options);
        walker.visit_statements(tree.root_node());
        walker.out
    }
}

// ── Walker ────────────────────────────────────────────────────────────────

struct Walker<'a> {
    source: &'a [u8],
    file_path: &'a str,
    options: ExtractOptions,
    /// Current namespace, empty for the global one.
    namespace: String,
    /// Lower-cased alias -> fully qualified class name.
    imports: BTreeMap<String, String>,
    /// Qualified names already emitted from this file.
    claimed: HashSet<String>,
    /// (source, kind, name) triples already emitted.
    seen_refs: HashSet<(String, ReferenceKind, String)>,
    out: Extraction,
}

impl<'a> Walker<'a> {
    fn new(source: &'a [u8], file_path: &'a str, options: ExtractOptions) -> Self {
        Self {
            source,
            file_path,
            options,
            namespace: String::new(),
            imports: BTreeMap::new(),
            claimed: HashSet::new(),
            seen_refs: HashSet::new(),
            out: Extraction::default(),
        }
    }

    fn visit_statements(&mut self, node: Node) {
        for child in children(node) {
            match child.kind() {
                "namespace_definition" => self.visit_namespace(child),
                "namespace_use_declaration" => self.record_imports(child),
                "class_declaration" | "interface_declaration" | "trait_declaration"
                | "enum_declaration" => self.visit_type(child),
                "function_definition" => self.visit_callable(child, None, Construct::Function),
                "const_declaration" => self.visit_constants(child, None),
                "comment" | "php_tag" | "text" | "text_interpolation" => {}
                "ERROR" => {
                    self.visit_statements(child);
                    self.recover_declarations(child);
                }
                // Conditional declarations may still hold declarations.
                _ => self.visit_statements(child),
            }
        }
    }

    /// A `class Foo` or `function bar` token pair left loose inside an
    /// ERROR node still names a declaration. It is kept with a range that
    /// runs to the end of the broken region, and flagged with a warning.
    /// A `function` after a recovered type becomes one of its methods.
    fn recover_declarations(&mut self, node: Node) {
        let tokens = children(node);
        let mut container: Option<String> = None;

        for (i, token) in tokens.iter().enumerate() {
            let construct = match token.kind() {
                "class" => Construct::Class,
                "interface" => Construct::Interface,
                "trait" => Construct::Trait,
                "enum" => Construct::Enum,
                "function" if container.is_some() => Construct::Method,
                "function" => Construct::Function,
                _ => continue,
            };
            // `Foo::class`
            if i > 0 && tokens[i - 1].kind() == "::" {
                continue;
            }
            let Some(name_node) = tokens[i + 1..]
                .iter()
                .find(|t| t.is_named())
                .filter(|t| t.kind() == "name" && !t.is_missing())
            else {
                continue;
            };
            let name = self.text(*name_node);
            if !is_identifier(&name) {
                continue;
            }

            let first_modifier = tokens[..i]
                .iter()
                .rposition(|t| !t.kind().ends_with("_modifier"))
                .map_or(0, |p| p + 1);
            let modifiers = &tokens[first_modifier..i];
            let visibility = visibility_among(modifiers, self.source);
            if !self.visible(visibility) {
                continue;
            }

            let qualified_name = match (&container, construct) {
                (Some(c), Construct::Method) => format!("{c}.{name}"),
                _ => self.qualify(&name),
            };
            if !self.claim(&qualified_name, *token) {
                continue;
            }

            let head = modifiers.first().copied().unwrap_or(*token);
            let signature = self
                .source
                .get(head.start_byte()..name_node.end_byte())
                .map(String::from_utf8_lossy)
                .unwrap_or_default()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            let line_start = head.start_position().row + 1;
            let line_end = node.end_position().row + 1;

            self.out.declarations.push(Declaration {
                name,
                qualified_name: qualified_name.clone(),
                kind: construct.kind(),
                construct,
                parent: match construct {
                    Construct::Method => container.clone(),
                    _ => None,
                },
                documentation: doc_comment(head, self.source),
                signature,
                visibility,
                modifiers: modifiers_among(modifiers),
                file_path: self.file_path.to_string(),
                line_start,
                line_end,
            });
            self.out.warnings.push(Warning::declaration(
                self.file_path,
                line_start,
                format!("{construct} `{qualified_name}` recovered from a syntax error"),
            ));

            if matches!(
                construct,
                Construct::Class | Construct::Interface | Construct::Trait | Construct::Enum
            ) && container.is_none()
            {
                self.visit_members(node, &qualified_name);
                container = Some(qualified_name);
            }
        }
    }

    fn visit_namespace(&mut self, node: Node) {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n))
            .unwrap_or_default();

        match node.child_by_field_name("body") {
            Some(body) => {
                let saved_ns = std::mem::replace(&mut self.namespace, name);
                let saved_imports = std::mem::take(&mut self.imports);
                self.visit_statements(body);
                self.namespace = saved_ns;
                self.imports = saved_imports;
            }
            // `namespace Foo;` applies to every following statement.
            None => {
                self.namespace = name;
                self.imports.clear();
            }
        }
    }

    fn record_imports(&mut self, node: Node) {
        let mut prefix = String::new();
        for child in children(node) {
            match child.kind() {
                // `use function` / `use const` import into other symbol tables.
                "function" | "const" => return,
                "namespace_name" => prefix = self.text(child),
                _ => {}
            }
        }

        let mut clauses = Vec::new();
        collect_kinds(
            node,
            &["namespace_use_clause", "namespace_use_group_clause"],
            &mut clauses,
        );

        for clause in clauses {
            let Some(path_node) = children(clause)
                .into_iter()
                .find(|c| matches!(c.kind(), "name" | "qualified_name" | "namespace_name"))
            else {
                continue;
            };
            let path = self.text(path_node);
            let full = if prefix.is_empty() {
                path.trim_start_matches('\\').to_string()
            } else {
                format!("{}\\{}", prefix.trim_start_matches('\\'), path)
            };

            let alias = clause
                .child_by_field_name("alias")
                .or_else(|| {
                    children(clause)
                        .into_iter()
                        .find(|c| c.kind() == "namespace_aliasing_clause")
                        .and_then(|a| children(a).into_iter().find(|c| c.kind() == "name"))
                })
                .or_else(|| {
                    // `Foo as Bar` without a field name: the alias follows `as`.
                    children(clause)
                        .into_iter()
                        .skip_while(|c| c.kind() != "as")
                        .find(|c| c.kind() == "name")
                })
                .map(|n| self.text(n))
                .unwrap_or_else(|| last_segment(&full).to_string());

            if !full.is_empty() && !alias.is_empty() {
                self.imports.insert(alias.to_ascii_lowercase(), full);
            }
        }
    }

    fn visit_type(&mut self, node: Node) {
        let construct = match node.kind() {
            "interface_declaration" => Construct::Interface,
            "trait_declaration" => Construct::Trait,
            "enum_declaration" => Construct::Enum,
            _ => Construct::Class,
        };

        let Some(name) = self.name_of(node) else {
            self.drop_unnamed(node, construct);
            return;
        };
        let qualified_name = self.qualify(&name);
        if !self.claim(&qualified_name, node) {
            return;
        }

        self.push(node, name, qualified_name.clone(), construct, None, Visibility::Public);

        for child in children(node) {
            let kind = match child.kind() {
                "base_clause" => ReferenceKind::Extends,
                "class_interface_clause" => ReferenceKind::Implements,
                _ => continue,
            };
            for type_node in children(child) {
                if matches!(type_node.kind(), "name" | "qualified_name") {
                    self.class_reference(&qualified_name, type_node, kind);
                }
            }
        }

        if let Some(body) = node.child_by_field_name("body") {
            self.visit_members(body, &qualified_name);
        }
    }

    fn visit_members(&mut self, body: Node, container: &str) {
        for child in children(body) {
            match child.kind() {
                "method_declaration" => {
                    self.visit_callable(child, Some(container), Construct::Method)
                }
                "property_declaration" => self.visit_properties(child, container),
                "const_declaration" => self.visit_constants(child, Some(container)),
                "enum_case" => self.visit_enum_case(child, container),
                "use_declaration" => {
                    for used in children(child) {
                        if matches!(used.kind(), "name" | "qualified_name") {
                            self.class_reference(container, used, ReferenceKind::UsesTrait);
                        }
                    }
                }
                "ERROR" => self.visit_members(child, container),
                _ => {}
            }
        }
    }

    fn visit_callable(&mut self, node: Node, container: Option<&str>, construct: Construct) {
        let Some(name) = self.name_of(node) else {
            self.drop_unnamed(node, construct);
            return;
        };
        let visibility = visibility_of(node, self.source);
        if !self.visible(visibility) {
            return;
        }

        let qualified_name = match container {
            Some(c) => format!("{c}.{name}"),
            None => self.qualify(&name),
        };
        if !self.claim(&qualified_name, node) {
            return;
        }

        self.push(
            node,
            name,
            qualified_name.clone(),
            construct,
            container.map(str::to_string),
            visibility,
        );

        if let Some(params) = node.child_by_field_name("parameters") {
            for param in children(params) {
                if let Some(type_node) = param.child_by_field_name("type") {
                    self.type_references(&qualified_name, type_node, ReferenceKind::ParameterType);
                }
            }
        }
        if let Some(return_type) = node.child_by_field_name("return_type") {
            self.type_references(&qualified_name, return_type, ReferenceKind::ReturnType);
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.body_references(&qualified_name, container, body);
        }
    }

    fn visit_properties(&mut self, node: Node, container: &str) {
        let visibility = visibility_of(node, self.source);
        if !self.visible(visibility) {
            return;
        }
        let type_node = node.child_by_field_name("type");

        for element in children(node) {
            if element.kind() != "property_element" {
                continue;
            }
            let name = element
                .child_by_field_name("name")
                .or_else(|| {
                    children(element)
                        .into_iter()
                        .find(|c| c.kind() == "variable_name")
                })
                .filter(|n| !n.is_missing())
                .map(|n| self.text(n))
                .filter(|n| is_identifier(n.trim_start_matches('$')));
            let Some(name) = name else {
                self.drop_unnamed(element, Construct::Property);
                continue;
            };

            let qualified_name = format!("{container}.{name}");
            if !self.claim(&qualified_name, element) {
                continue;
            }
            self.push(
                node,
                name,
                qualified_name.clone(),
                Construct::Property,
                Some(container.to_string()),
                visibility,
            );
            if let Some(type_node) = type_node {
                self.type_references(&qualified_name, type_node, ReferenceKind::PropertyType);
            }
        }
    }

    fn visit_constants(&mut self, node: Node, container: Option<&str>) {
        let visibility = visibility_of(node, self.source);
        if !self.visible(visibility) {
            return;
        }

        for element in children(node) {
            if element.kind() != "const_element" {
                continue;
            }
            let name = children(element)
                .into_iter()
                .find(|c| c.kind() == "name")
                .filter(|n| !n.is_missing())
                .map(|n| self.text(n))
                .filter(|n| is_identifier(n));
            let Some(name) = name else {
                self.drop_unnamed(element, Construct::Constant);
                continue;
            };

            let qualified_name = match container {
                Some(c) => format!("{c}.{name}"),
                None => self.qualify(&name),
            };
            if !self.claim(&qualified_name, element) {
                continue;
            }
            self.push(
                node,
                name,
                qualified_name,
                Construct::Constant,
                container.map(str::to_string),
                visibility,
            );
        }
    }

    fn visit_enum_case(&mut self, node: Node, container: &str) {
        let Some(name) = self.name_of(node) else {
            self.drop_unnamed(node, Construct::EnumCase);
            return;
        };
        let qualified_name = format!("{container}.{name}");
        if !self.claim(&qualified_name, node) {
            return;
        }
        self.push(
            node,
            name,
            qualified_name,
            Construct::EnumCase,
            Some(container.to_string()),
            Visibility::Public,
        );
    }

    // ── References ────────────────────────────────────────────────────────

    /// Calls and instantiations inside a function or method body.
    fn body_references(&mut self, source_qn: &str, container: Option<&str>, body: Node) {
        let mut stack = vec![body];
        while let Some(node) = stack.pop() {
            match node.kind() {
                "function_call_expression" => {
                    if let Some(func) = node.child_by_field_name("function") {
                        if matches!(func.kind(), "name" | "qualified_name") {
                            let written = self.text(func);
                            let hint = self.expand(&written);
                            self.reference(source_qn, written, hint, ReferenceKind::Calls, func);
                        }
                    }
                }
                "scoped_call_expression" => {
                    if let (Some(scope), Some(member)) = (
                        node.child_by_field_name("scope"),
                        node.child_by_field_name("name"),
                    ) {
                        let member_name = self.text(member);
                        let scope_name = self.text(scope);
                        let written = format!("{scope_name}::{member_name}");
                        let hint = match scope.kind() {
                            "name" | "qualified_name" if !is_pseudo_type(&scope_name) => self
                                .expand(&scope_name)
                                .map(|class| format!("{class}.{member_name}")),
                            "relative_scope" | "name"
                                if matches!(scope_name.as_str(), "self" | "static") =>
                            {
                                container.map(|c| format!("{c}.{member_name}"))
                            }
                            _ => None,
                        };
                        if is_identifier(&member_name) {
                            self.reference(source_qn, written, hint, ReferenceKind::Calls, scope);
                        }
                    }
                }
                "member_call_expression" => {
                    if let (Some(object), Some(member), Some(container)) = (
                        node.child_by_field_name("object"),
                        node.child_by_field_name("name"),
                        container,
                    ) {
                        let member_name = self.text(member);
                        if self.text(object) == "$this" && is_identifier(&member_name) {
                            let written = format!("$this->{member_name}");
                            let hint = Some(format!("{container}.{member_name}"));
                            self.reference(source_qn, written, hint, ReferenceKind::Calls, member);
                        }
                    }
                }
                "object_creation_expression" => {
                    if let Some(class) = children(node)
                        .into_iter()
                        .find(|c| matches!(c.kind(), "name" | "qualified_name"))
                    {
                        self.class_reference(source_qn, class, ReferenceKind::Instantiates);
                    }
                }
                _ => {}
            }
            let mut kids = children(node);
            kids.reverse();
            stack.extend(kids);
        }
    }

    /// Every class name mentioned by a type annotation.
    fn type_references(&mut self, source_qn: &str, type_node: Node, kind: ReferenceKind) {
        let mut names = Vec::new();
        collect_type_names(type_node, &mut names);
        for name_node in names {
            self.class_reference(source_qn, name_node, kind);
        }
    }

    fn class_reference(&mut self, source_qn: &str, name_node: Node, kind: ReferenceKind) {
        let written = self.text(name_node);
        if written.is_empty() || is_pseudo_type(&written) {
            return;
        }
        let hint = self.expand(&written);
        self.reference(source_qn, written, hint, kind, name_node);
    }

    fn reference(
        &mut self,
        source_qn: &str,
        name: String,
        hint: Option<String>,
        kind: ReferenceKind,
        at: Node,
    ) {
        let key = (source_qn.to_string(), kind, name.clone());
        if !self.seen_refs.insert(key) {
            return;
        }
        let hint = hint.filter(|h| *h != name);
        self.out.references.push(RawReference {
            source: source_qn.to_string(),
            name,
            hint,
            kind,
            line: at.start_position().row + 1,
        });
    }

    /// Expand a class-like name through PHP's name resolution rules.
    fn expand(&self, written: &str) -> Option<String> {
        if let Some(fully_qualified) = written.strip_prefix('\\') {
            return Some(fully_qualified.to_string());
        }
        if let Some(relative) = written.strip_prefix("namespace\\") {
            return Some(self.qualify(relative));
        }
        let (first, rest) = match written.split_once('\\') {
            Some((first, rest)) => (first, Some(rest)),
            None => (written, None),
        };
        if let Some(imported) = self.imports.get(&first.to_ascii_lowercase()) {
            return Some(match rest {
                Some(rest) => format!("{imported}\\{rest}"),
                None => imported.clone(),
            });
        }
        (!self.namespace.is_empty()).then(|| self.qualify(written))
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    fn push(
        &mut self,
        node: Node,
        name: String,
        qualified_name: String,
        construct: Construct,
        parent: Option<String>,
        visibility: Visibility,
    ) {
        self.out.declarations.push(Declaration {
            name,
            qualified_name,
            kind: construct.kind(),
            construct,
            parent,
            documentation: doc_comment(node, self.source),
            signature: signature_of(node, self.source),
            visibility,
            modifiers: modifiers_of(node),
            file_path: self.file_path.to_string(),
            line_start: node.start_position().row + 1,
            line_end: node.end_position().row + 1,
        });
    }

    /// Reserve a qualified name. A second definition in the same file is
    /// dropped, together with everything nested in it.
    fn claim(&mut self, qualified_name: &str, node: Node) -> bool {
        if self.claimed.insert(qualified_name.to_string()) {
            return true;
        }
        self.out.warnings.push(Warning::declaration(
            self.file_path,
            node.start_position().row + 1,
            format!("duplicate declaration `{qualified_name}` dropped"),
        ));
        false
    }

    fn drop_unnamed(&mut self, node: Node, construct: Construct) {
        self.out.warnings.push(Warning::declaration(
            self.file_path,
            node.start_position().row + 1,
            format!("{construct} declaration without a recoverable name dropped"),
        ));
    }

    fn name_of(&self, node: Node) -> Option<String> {
        let name_node = node.child_by_field_name("name")?;
        if name_node.is_missing() {
            return None;
        }
        let name = self.text(name_node);
        is_identifier(&name).then_some(name)
    }

    fn qualify(&self, name: &str) -> String {
        if self.namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}\\{}", self.namespace, name)
        }
    }

    fn visible(&self, visibility: Visibility) -> bool {
        self.options.include_private || visibility != Visibility::Private
    }

    fn text(&self, node: Node) -> String {
        node_text(node, self.source)
    }
}

// ── Free helpers ──────────────────────────────────────────────────────────

fn children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

fn collect_kinds<'t>(node: Node<'t>, kinds: &[&str], out: &mut Vec<Node<'t>>) {
    for child in children(node) {
        if kinds.contains(&child.kind()) {
            out.push(child);
        } else {
            collect_kinds(child, kinds, out);
        }
    }
}

fn collect_type_names<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    match node.kind() {
        "primitive_type" => {}
        "name" | "qualified_name" => out.push(node),
        _ => {
            for child in children(node) {
                collect_type_names(child, out);
            }
        }
    }
}

fn node_text(node: Node, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or("").trim().to_string()
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '$' || !c.is_ascii())
}

fn is_pseudo_type(name: &str) -> bool {
    PSEUDO_TYPES.contains(&name.to_ascii_lowercase().as_str())
}

fn last_segment(name: &str) -> &str {
    name.rsplit('\\').next().unwrap_or(name)
}

fn visibility_of(node: Node, source: &[u8]) -> Visibility {
    visibility_among(&children(node), source)
}

fn visibility_among(nodes: &[Node], source: &[u8]) -> Visibility {
    nodes
        .iter()
        .find(|c| c.kind() == "visibility_modifier")
        .map(|c| match node_text(*c, source).to_ascii_lowercase().as_str() {
            "private" => Visibility::Private,
            "protected" => Visibility::Protected,
            _ => Visibility::Public,
        })
        .unwrap_or(Visibility::Public)
}

fn modifiers_of(node: Node) -> Vec<String> {
    modifiers_among(&children(node))
}

fn modifiers_among(nodes: &[Node]) -> Vec<String> {
    nodes
        .iter()
        .filter_map(|c| match c.kind() {
            "static_modifier" => Some("static"),
            "abstract_modifier" => Some("abstract"),
            "final_modifier" => Some("final"),
            "readonly_modifier" => Some("readonly"),
            _ => None,
        })
        .map(str::to_string)
        .collect()
}

/// The declaration head: everything before the body, whitespace collapsed.
fn signature_of(node: Node, source: &[u8]) -> String {
    let end = node
        .child_by_field_name("body")
        .map(|b| b.start_byte())
        .unwrap_or_else(|| node.end_byte());
    let head = source
        .get(node.start_byte()..end)
        .map(String::from_utf8_lossy)
        .unwrap_or_default();
    head.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches(';')
        .trim_end()
        .to_string()
}

/// The nearest preceding `/** */` block, provided it and any comments after
/// it sit on contiguous lines directly above the declaration.
fn doc_comment(node: Node, source: &[u8]) -> String {
    let mut boundary = node.start_position().row;
    let mut prev = node.prev_sibling();
    while let Some(sibling) = prev {
        if sibling.kind() != "comment" || sibling.end_position().row + 1 < boundary {
            break;
        }
        let text = node_text(sibling, source);
        if text.starts_with("/**") {
            return clean_phpdoc(&text);
        }
        boundary = sibling.start_position().row;
        prev = sibling.prev_sibling();
    }
    String::new()
}

/// Strip `/**`, `*/` and the leading `*` gutter; leave the markup alone.
fn clean_phpdoc(raw: &str) -> String {
    let inner = raw.strip_prefix("/**").unwrap_or(raw);
    let inner = inner.strip_suffix("*/").unwrap_or(inner);

    let mut lines: Vec<&str> = inner
        .lines()
        .map(|line| {
            let line = line.trim();
            match line.strip_prefix('*') {
                Some(rest) => rest.strip_prefix(' ').unwrap_or(rest).trim_end(),
                None => line,
            }
        })
        .collect();

    while lines.first().is_some_and(|l| l.is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}
