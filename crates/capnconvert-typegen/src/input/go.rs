//! Go source parsing.
//!
//! Reads the parts of a Go file the converter cares about (package clause,
//! imports, top-level type declarations) into a small syntax model. Type
//! expressions the schema cannot express are kept as
//! [`TypeExpr::Unsupported`] so that dependency packages full of maps and
//! channels still load; whether they are an error depends on where they are
//! referenced.

use crate::error::ConvertError;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree};

/// One parsed Go file.
#[derive(Debug, Clone)]
pub struct GoFile {
    pub path: PathBuf,
    /// Name from the package clause
    pub package: String,
    pub imports: Vec<GoImport>,
    /// Top-level type declarations in source order
    pub types: Vec<TypeSpec>,
    /// The file carries a `//go:build ignore` constraint.
    pub build_ignored: bool,
}

impl GoFile {
    pub fn type_spec(&self, name: &str) -> Option<&TypeSpec> {
        self.types.iter().find(|t| t.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoImport {
    pub path: String,
    /// Explicit local name: an identifier, `.` or `_`
    pub alias: Option<String>,
    pub line: usize,
}

impl GoImport {
    pub fn is_dot(&self) -> bool {
        self.alias.as_deref() == Some(".")
    }
}

/// `type Name T` or `type Name = T`.
#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub name: String,
    pub line: usize,
    pub alias: bool,
    /// Names of the declared type parameters, empty for non-generic types
    pub type_params: Vec<String>,
    pub ty: TypeExpr,
}

impl TypeSpec {
    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Ident(String),
    /// `pkg.Name`, where `pkg` is the importing file's local name for the package
    Qualified { package: String, name: String },
    Slice(Box<TypeExpr>),
    Pointer(Box<TypeExpr>),
    Struct(Vec<FieldSpec>),
    Interface(Vec<InterfaceElem>),
    /// Any other type construct, by tree-sitter node kind
    Unsupported { kind: String, line: usize },
}

impl TypeExpr {
    /// Name of the type under any pointers, as used for embedded fields.
    pub fn embedded_name(&self) -> Option<&str> {
        match self {
            Self::Ident(name) | Self::Qualified { name, .. } => Some(name),
            Self::Pointer(target) => target.embedded_name(),
            _ => None,
        }
    }
}

/// A struct field declaration. `names` is empty for an embedded field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub names: Vec<String>,
    pub ty: TypeExpr,
    pub line: usize,
}

impl FieldSpec {
    pub fn is_embedded(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterfaceElem {
    Method(MethodSpec),
    /// Embedded interface or type-set constraint
    Embedded(TypeExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodSpec {
    pub name: String,
    pub params: Vec<ParamSpec>,
    pub results: Vec<ParamSpec>,
    pub line: usize,
}

/// A parameter group. `names` is empty when the parameters are unnamed.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub names: Vec<String>,
    pub ty: TypeExpr,
    pub variadic: bool,
}

/// Read and parse a Go file.
pub fn parse_go_file(path: &Path) -> Result<GoFile, ConvertError> {
    let source = std::fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
    parse_go_source(path, &source)
}

/// Parse Go source text; `path` is only used for diagnostics.
pub fn parse_go_source(path: &Path, source: &str) -> Result<GoFile, ConvertError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|e| ConvertError::Parse {
            path: path.to_path_buf(),
            line: 0,
            column: 0,
            message: format!("tree-sitter init: {e}"),
        })?;

    let tree = parser.parse(source, None).ok_or_else(|| ConvertError::Parse {
        path: path.to_path_buf(),
        line: 0,
        column: 0,
        message: "parser produced no tree".into(),
    })?;

    let ctx = ExtractContext { source, path };
    ctx.check_syntax(&tree)?;
    Ok(ctx.extract_file(&tree))
}

struct ExtractContext<'a> {
    source: &'a str,
    path: &'a Path,
}

impl<'a> ExtractContext<'a> {
    fn node_text(&self, node: Node) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn check_syntax(&self, tree: &Tree) -> Result<(), ConvertError> {
        let root = tree.root_node();
        if !root.has_error() {
            return Ok(());
        }
        let node = first_error(root).unwrap_or(root);
        let pos = node.start_position();
        let message = if node.is_missing() {
            format!("missing {}", node.kind())
        } else {
            let text = self.node_text(node);
            let snippet = text.lines().next().unwrap_or("").trim();
            if snippet.is_empty() {
                "unexpected input".to_string()
            } else {
                format!("unexpected `{snippet}`")
            }
        };
        Err(ConvertError::Parse {
            path: self.path.to_path_buf(),
            line: pos.row + 1,
            column: pos.column + 1,
            message,
        })
    }

    fn extract_file(&self, tree: &Tree) -> GoFile {
        let root = tree.root_node();
        let mut file = GoFile {
            path: self.path.to_path_buf(),
            package: String::new(),
            imports: Vec::new(),
            types: Vec::new(),
            build_ignored: false,
        };

        let mut seen_package = false;
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            match child.kind() {
                "comment" if !seen_package => {
                    if is_ignore_constraint(self.node_text(child)) {
                        file.build_ignored = true;
                    }
                }
                "package_clause" => {
                    seen_package = true;
                    let mut inner = child.walk();
                    if let Some(name) = child
                        .named_children(&mut inner)
                        .find(|n| n.kind() == "package_identifier")
                    {
                        file.package = self.node_text(name).to_string();
                    }
                }
                "import_declaration" => self.extract_imports(child, &mut file.imports),
                "type_declaration" => {
                    let mut inner = child.walk();
                    for spec in child.named_children(&mut inner) {
                        if let Some(spec) = self.extract_type_spec(spec) {
                            file.types.push(spec);
                        }
                    }
                }
                _ => {}
            }
        }

        file
    }

    fn extract_imports(&self, node: Node, imports: &mut Vec<GoImport>) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "import_spec" => imports.extend(self.extract_import_spec(child)),
                "import_spec_list" => self.extract_imports(child, imports),
                _ => {}
            }
        }
    }

    fn extract_import_spec(&self, node: Node) -> Option<GoImport> {
        let path = node.child_by_field_name("path")?;
        let path = self
            .node_text(path)
            .trim_matches(|c| c == '"' || c == '`')
            .to_string();
        let alias = node
            .child_by_field_name("name")
            .map(|n| self.node_text(n).to_string());
        Some(GoImport {
            path,
            alias,
            line: line_of(node),
        })
    }

    fn extract_type_spec(&self, node: Node) -> Option<TypeSpec> {
        let alias = match node.kind() {
            "type_spec" => false,
            "type_alias" => true,
            _ => return None,
        };
        let name = self.node_text(node.child_by_field_name("name")?).to_string();
        let ty = self.extract_type(node.child_by_field_name("type")?);
        Some(TypeSpec {
            name,
            line: line_of(node),
            alias,
            type_params: node
                .child_by_field_name("type_parameters")
                .map(|list| self.extract_type_params(list))
                .unwrap_or_default(),
            ty,
        })
    }

    fn extract_type_params(&self, list: Node) -> Vec<String> {
        let mut names = Vec::new();
        let mut cursor = list.walk();
        for decl in list.named_children(&mut cursor) {
            let mut name_cursor = decl.walk();
            names.extend(
                decl.children_by_field_name("name", &mut name_cursor)
                    .map(|n| self.node_text(n).to_string()),
            );
        }
        names
    }

    fn extract_type(&self, node: Node) -> TypeExpr {
        match node.kind() {
            "type_identifier" => TypeExpr::Ident(self.node_text(node).to_string()),
            "qualified_type" => {
                match (
                    node.child_by_field_name("package"),
                    node.child_by_field_name("name"),
                ) {
                    (Some(package), Some(name)) => TypeExpr::Qualified {
                        package: self.node_text(package).to_string(),
                        name: self.node_text(name).to_string(),
                    },
                    _ => self.unsupported(node),
                }
            }
            "slice_type" => match node.child_by_field_name("element") {
                Some(element) => TypeExpr::Slice(Box::new(self.extract_type(element))),
                None => self.unsupported(node),
            },
            "pointer_type" | "parenthesized_type" => match first_type_child(node) {
                Some(inner) if node.kind() == "pointer_type" => {
                    TypeExpr::Pointer(Box::new(self.extract_type(inner)))
                }
                Some(inner) => self.extract_type(inner),
                None => self.unsupported(node),
            },
            "struct_type" => TypeExpr::Struct(self.extract_fields(node)),
            "interface_type" => TypeExpr::Interface(self.extract_interface(node)),
            _ => self.unsupported(node),
        }
    }

    fn unsupported(&self, node: Node) -> TypeExpr {
        TypeExpr::Unsupported {
            kind: node.kind().to_string(),
            line: line_of(node),
        }
    }

    fn extract_fields(&self, struct_node: Node) -> Vec<FieldSpec> {
        let mut fields = Vec::new();
        let mut cursor = struct_node.walk();
        let Some(list) = struct_node
            .named_children(&mut cursor)
            .find(|n| n.kind() == "field_declaration_list")
        else {
            return fields;
        };

        let mut list_cursor = list.walk();
        for decl in list.named_children(&mut list_cursor) {
            if decl.kind() != "field_declaration" {
                continue;
            }
            let Some(type_node) = decl.child_by_field_name("type") else {
                continue;
            };

            let mut name_cursor = decl.walk();
            let names: Vec<String> = decl
                .children_by_field_name("name", &mut name_cursor)
                .map(|n| self.node_text(n).to_string())
                .collect();

            let mut ty = self.extract_type(type_node);
            // Embedded `*T`: the star is an anonymous token, not a pointer_type
            if names.is_empty() && has_token(decl, "*") {
                ty = TypeExpr::Pointer(Box::new(ty));
            }

            fields.push(FieldSpec {
                names,
                ty,
                line: line_of(decl),
            });
        }
        fields
    }

    fn extract_interface(&self, node: Node) -> Vec<InterfaceElem> {
        let mut elems = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "method_elem" | "method_spec" => {
                    if let Some(method) = self.extract_method(child) {
                        elems.push(InterfaceElem::Method(method));
                    }
                }
                "comment" => {}
                "type_elem" | "constraint_elem" => {
                    if let Some(inner) = first_type_child(child) {
                        elems.push(InterfaceElem::Embedded(self.extract_type(inner)));
                    }
                }
                _ => elems.push(InterfaceElem::Embedded(self.extract_type(child))),
            }
        }
        elems
    }

    fn extract_method(&self, node: Node) -> Option<MethodSpec> {
        let name = self.node_text(node.child_by_field_name("name")?).to_string();
        let params = node
            .child_by_field_name("parameters")
            .map(|p| self.extract_params(p))
            .unwrap_or_default();
        let results = match node.child_by_field_name("result") {
            Some(result) if result.kind() == "parameter_list" => self.extract_params(result),
            Some(result) => vec![ParamSpec {
                names: Vec::new(),
                ty: self.extract_type(result),
                variadic: false,
            }],
            None => Vec::new(),
        };
        Some(MethodSpec {
            name,
            params,
            results,
            line: line_of(node),
        })
    }

    fn extract_params(&self, list: Node) -> Vec<ParamSpec> {
        let mut params = Vec::new();
        let mut cursor = list.walk();
        for decl in list.named_children(&mut cursor) {
            let variadic = match decl.kind() {
                "parameter_declaration" => false,
                "variadic_parameter_declaration" => true,
                _ => continue,
            };
            let Some(type_node) = decl.child_by_field_name("type") else {
                continue;
            };
            let mut name_cursor = decl.walk();
            let names = decl
                .children_by_field_name("name", &mut name_cursor)
                .map(|n| self.node_text(n).to_string())
                .collect();
            params.push(ParamSpec {
                names,
                ty: self.extract_type(type_node),
                variadic,
            });
        }
        params
    }
}

fn line_of(node: Node) -> usize {
    node.start_position().row + 1
}

/// First named child that is not a comment.
fn first_type_child(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .find(|n| n.kind() != "comment")
}

fn has_token(node: Node, token: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == token)
}

/// Depth-first search for the first ERROR or MISSING node.
fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error(child) {
            return Some(found);
        }
    }
    None
}

fn is_ignore_constraint(comment: &str) -> bool {
    let text = comment.trim();
    let constraint = text
        .strip_prefix("//go:build")
        .or_else(|| text.strip_prefix("// +build"));
    constraint.is_some_and(|rest| rest.split_whitespace().any(|term| term == "ignore"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> GoFile {
        parse_go_source(Path::new("test.go"), source).unwrap()
    }

    #[test]
    fn test_package_and_imports() {
        let file = parse(
            r#"package contract

import "fmt"

import (
	mp "github.com/acme/mypkg"
	. "github.com/acme/dot"
	_ "github.com/acme/side"
)
"#,
        );
        assert_eq!(file.package, "contract");
        assert_eq!(file.imports.len(), 4);
        assert_eq!(file.imports[0].path, "fmt");
        assert_eq!(file.imports[0].alias, None);
        assert_eq!(file.imports[1].alias.as_deref(), Some("mp"));
        assert!(file.imports[2].is_dot());
        assert_eq!(file.imports[3].alias.as_deref(), Some("_"));
        assert!(!file.build_ignored);
    }

    #[test]
    fn test_struct_fields() {
        let file = parse(
            r#"package p

type S struct {
	// comment
	ID, Other int `json:"id"`
	Tags  []string
	Next  *S
	Ext   mypkg.Item
	mypkg.Embedded
	*Base
}
"#,
        );
        let spec = file.type_spec("S").unwrap();
        assert!(!spec.alias);
        let TypeExpr::Struct(fields) = &spec.ty else {
            panic!("expected struct, got {:?}", spec.ty);
        };
        assert_eq!(fields.len(), 6);
        assert_eq!(fields[0].names, vec!["ID", "Other"]);
        assert_eq!(fields[0].ty, TypeExpr::Ident("int".into()));
        assert_eq!(
            fields[1].ty,
            TypeExpr::Slice(Box::new(TypeExpr::Ident("string".into())))
        );
        assert_eq!(
            fields[2].ty,
            TypeExpr::Pointer(Box::new(TypeExpr::Ident("S".into())))
        );
        assert_eq!(
            fields[3].ty,
            TypeExpr::Qualified {
                package: "mypkg".into(),
                name: "Item".into()
            }
        );
        assert!(fields[4].is_embedded());
        assert_eq!(fields[4].ty.embedded_name(), Some("Embedded"));
        assert!(fields[5].is_embedded());
        assert_eq!(
            fields[5].ty,
            TypeExpr::Pointer(Box::new(TypeExpr::Ident("Base".into())))
        );
    }

    #[test]
    fn test_interface_methods() {
        let file = parse(
            r#"package p

type I interface {
	fmt.Stringer
	Foo(x int, y, z string) (string, error)
	Bar() int
	Baz(args ...string)
	Named() (n int, err error)
	Anon(int, bool)
}
"#,
        );
        let TypeExpr::Interface(elems) = &file.type_spec("I").unwrap().ty else {
            panic!("expected interface");
        };
        assert_eq!(elems.len(), 6);
        assert!(matches!(elems[0], InterfaceElem::Embedded(_)));

        let InterfaceElem::Method(foo) = &elems[1] else {
            panic!("expected method");
        };
        assert_eq!(foo.name, "Foo");
        assert_eq!(foo.params.len(), 2);
        assert_eq!(foo.params[1].names, vec!["y", "z"]);
        assert_eq!(foo.results.len(), 2);
        assert!(foo.results[0].names.is_empty());

        let InterfaceElem::Method(bar) = &elems[2] else {
            panic!("expected method");
        };
        assert_eq!(bar.results.len(), 1);
        assert_eq!(bar.results[0].ty, TypeExpr::Ident("int".into()));

        let InterfaceElem::Method(baz) = &elems[3] else {
            panic!("expected method");
        };
        assert!(baz.params[0].variadic);

        let InterfaceElem::Method(named) = &elems[4] else {
            panic!("expected method");
        };
        assert_eq!(named.results[0].names, vec!["n"]);

        let InterfaceElem::Method(anon) = &elems[5] else {
            panic!("expected method");
        };
        assert_eq!(anon.params.len(), 2);
        assert!(anon.params.iter().all(|p| p.names.is_empty()));
    }

    #[test]
    fn test_unsupported_types_are_kept() {
        let file = parse(
            r#"package p

type M struct {
	Lookup map[string]int
	Events chan int
}

type G[K comparable, V any] struct {
	Value V
}

type A = mypkg.Item
"#,
        );
        let TypeExpr::Struct(fields) = &file.type_spec("M").unwrap().ty else {
            panic!("expected struct");
        };
        assert!(matches!(&fields[0].ty, TypeExpr::Unsupported { kind, .. } if kind == "map_type"));
        assert!(
            matches!(&fields[1].ty, TypeExpr::Unsupported { kind, .. } if kind == "channel_type")
        );
        let generic = file.type_spec("G").unwrap();
        assert!(generic.is_generic());
        assert_eq!(generic.type_params, vec!["K", "V"]);
        assert!(!file.type_spec("M").unwrap().is_generic());
        assert!(file.type_spec("A").unwrap().alias);
    }

    #[test]
    fn test_build_ignore() {
        let file = parse("//go:build ignore\n\npackage p\n");
        assert!(file.build_ignored);
        let file = parse("//go:build linux\n\npackage p\n");
        assert!(!file.build_ignored);
    }

    #[test]
    fn test_syntax_error_location() {
        let err = parse_go_source(
            Path::new("bad.go"),
            "package p\n\ntype S struct {\n\tID int\n",
        )
        .unwrap_err();
        match err {
            ConvertError::Parse { path, line, .. } => {
                assert_eq!(path, Path::new("bad.go"));
                assert!(line >= 3, "line {line}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
