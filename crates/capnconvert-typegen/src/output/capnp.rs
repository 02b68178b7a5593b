//! Cap'n Proto schema text.

use crate::ir::{FieldDecl, ImportedStructDecl, InterfaceDecl, MethodDecl, SchemaDocument, StructDecl};
use crate::mapper::capnp_type;
use crate::naming::result_name;
use std::fmt::Write;

/// Values for the `$Go` annotations in the schema header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOptions {
    /// Go package name for code generated from the schema
    pub go_package: String,
    /// Go import path for code generated from the schema
    pub go_import: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            go_package: "contract_impl".into(),
            go_import: "github.com/RedUndercover/capnconvert-go/testdata/contract".into(),
        }
    }
}

/// Render a schema document.
///
/// Section order is fixed: local structs, imported structs, interfaces. Each
/// section keeps the document's first-seen order.
pub fn render(doc: &SchemaDocument, options: &EmitOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "using Go = import \"/go.capnp\";");
    let _ = writeln!(out, "@0x{}", doc.id);
    let _ = writeln!(out, "$Go.package(\"{}\");", options.go_package);
    let _ = writeln!(out, "$Go.import(\"{}\");", options.go_import);
    out.push('\n');

    for decl in &doc.declarations.structs {
        render_struct(&mut out, decl);
    }
    for decl in &doc.declarations.imported_structs {
        render_imported_struct(&mut out, decl);
    }
    for decl in &doc.declarations.interfaces {
        render_interface(&mut out, decl);
    }
    out
}

fn render_struct(out: &mut String, decl: &StructDecl) {
    let _ = writeln!(out, "struct {} {{", decl.name);
    render_fields(out, &decl.fields);
    out.push_str("}\n");
}

fn render_imported_struct(out: &mut String, decl: &ImportedStructDecl) {
    let _ = writeln!(out, "struct {} {{", decl.name());
    render_fields(out, &decl.fields);
    out.push_str("}\n");
}

fn render_fields(out: &mut String, fields: &[FieldDecl]) {
    for field in fields {
        let _ = writeln!(
            out,
            "  {} @{} :{};",
            field.names.join(", "),
            field.ordinal,
            capnp_type(&field.shape)
        );
    }
}

fn render_interface(out: &mut String, decl: &InterfaceDecl) {
    let _ = writeln!(out, "interface {} {{", decl.name);
    for method in &decl.methods {
        render_method(out, method);
    }
    out.push_str("}\n");
}

fn render_method(out: &mut String, method: &MethodDecl) {
    let params: Vec<String> = method
        .params
        .iter()
        .map(|p| format!("{} :{}", p.name, capnp_type(&p.shape)))
        .collect();
    let results: Vec<String> = method
        .results
        .iter()
        .enumerate()
        .map(|(i, shape)| format!("{} :{}", result_name(i), capnp_type(shape)))
        .collect();
    let _ = writeln!(
        out,
        "  {} @{} ({}) -> ({});",
        method.name,
        method.ordinal,
        params.join(", "),
        results.join(", ")
    );
}
