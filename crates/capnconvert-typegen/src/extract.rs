//! Declaration extraction.
//!
//! Pass one walks the input file's top-level type declarations and collects
//! local structs and interfaces, recording every qualified reference they
//! make. Pass two drains those references as a worklist: each one that
//! resolves to a struct becomes an [`ImportedStructDecl`], and the qualified
//! references found in its fields are queued in turn.
//!
//! References made by the input file's structs and interfaces are strict: a
//! target that is not a struct, or a struct with a field the schema cannot
//! express, fails the conversion. References reached only through imported
//! structs or through the input file's aliases and defined types are lenient
//! and degrade with a warning.

use crate::error::ConvertError;
use crate::input::go::{
    FieldSpec, GoFile, InterfaceElem, MethodSpec, ParamSpec, TypeExpr, TypeSpec,
};
use crate::input::{GoPackage, Resolution, ResolutionIndex, ResolvedStruct};
use crate::ir::{
    Declarations, FieldDecl, ImportedStructDecl, InterfaceDecl, MethodDecl, ParamDecl,
    QualifiedName, StructDecl, TypeShape, is_predeclared,
};
use crate::naming::{param_name, to_field_name};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::rc::Rc;

/// Extract all emitted declarations for the index's input file.
pub fn extract(index: &mut ResolutionIndex<'_>) -> Result<Declarations, ConvertError> {
    let mut extractor = Extractor {
        index,
        references: Vec::new(),
        seen: HashSet::new(),
        strict: HashSet::new(),
    };
    let mut decls = extractor.local_declarations()?;
    decls.imported_structs = extractor.imported_structs()?;
    check_name_conflicts(&decls)?;
    Ok(decls)
}

/// Where the identifiers of a type expression are looked up.
struct Scope<'s> {
    file: &'s GoFile,
    /// Declaring package, or `None` for the input file
    home: Option<&'s GoPackage>,
    /// Type parameters of the enclosing declaration
    type_params: &'s [String],
}

/// Location of a type expression, for diagnostics.
struct Site<'s> {
    path: &'s Path,
    line: usize,
    context: String,
}

struct Extractor<'i, 'r> {
    index: &'i mut ResolutionIndex<'r>,
    /// Qualified references in first-seen order
    references: Vec<QualifiedName>,
    seen: HashSet<QualifiedName>,
    /// References made by the input file's structs and interfaces
    strict: HashSet<QualifiedName>,
}

impl Extractor<'_, '_> {
    fn local_declarations(&mut self) -> Result<Declarations, ConvertError> {
        let input = self.index.input();
        let mut decls = Declarations::default();

        for spec in &input.types {
            let scope = Scope {
                file: &input,
                home: None,
                type_params: &spec.type_params,
            };
            let emitted = matches!(spec.ty, TypeExpr::Struct(_) | TypeExpr::Interface(_));
            if spec.alias || !emitted {
                self.definition_target(&scope, spec)?;
                continue;
            }
            if spec.is_generic() {
                tracing::debug!(
                    name = %spec.name,
                    params = ?spec.type_params,
                    "generic declaration"
                );
            }

            match &spec.ty {
                TypeExpr::Struct(fields) => {
                    let fields = self.local_fields(&scope, &spec.name, fields)?;
                    tracing::debug!(name = %spec.name, fields = fields.len(), "extracted struct");
                    decls.structs.push(StructDecl {
                        name: spec.name.clone(),
                        fields,
                    });
                }
                TypeExpr::Interface(elems) => {
                    let mut methods = Vec::new();
                    for elem in elems {
                        match elem {
                            InterfaceElem::Method(method) => {
                                let ordinal = methods.len() as u32;
                                methods.push(self.method(&scope, &spec.name, method, ordinal)?);
                            }
                            InterfaceElem::Embedded(ty) => {
                                tracing::debug!(
                                    interface = %spec.name,
                                    embedded = ?ty,
                                    "skipping embedded interface element"
                                );
                            }
                        }
                    }
                    tracing::debug!(name = %spec.name, methods = methods.len(), "extracted interface");
                    decls.interfaces.push(InterfaceDecl {
                        name: spec.name.clone(),
                        methods,
                    });
                }
                _ => {}
            }
        }

        Ok(decls)
    }

    /// Queue the qualified type behind `type A = pkg.T` or `type A pkg.T`.
    ///
    /// The declaration itself is not emitted. References to `A` render as
    /// `A`, which names the target struct when the two share a name.
    fn definition_target(
        &mut self,
        scope: &Scope<'_>,
        spec: &TypeSpec,
    ) -> Result<(), ConvertError> {
        let site = Site {
            path: &scope.file.path,
            line: spec.line,
            context: format!("declaration of {}", spec.name),
        };
        match self.shape_of(scope, &spec.ty, &site) {
            Ok(shape) => {
                tracing::debug!(
                    name = %spec.name,
                    target = %shape,
                    "skipping non-struct declaration"
                );
                self.record(&shape, false);
                Ok(())
            }
            Err(ConvertError::UnsupportedType { kind, .. }) => {
                tracing::debug!(name = %spec.name, %kind, "skipping non-struct declaration");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Fields of a local struct: one declaration per Go field declaration.
    fn local_fields(
        &mut self,
        scope: &Scope<'_>,
        struct_name: &str,
        fields: &[FieldSpec],
    ) -> Result<Vec<FieldDecl>, ConvertError> {
        let mut decls = Vec::with_capacity(fields.len());
        for (ordinal, field) in fields.iter().enumerate() {
            let site = Site {
                path: &scope.file.path,
                line: field.line,
                context: format!("field of struct {struct_name}"),
            };
            let shape = self.shape_of(scope, &field.ty, &site)?;
            self.record(&shape, true);
            decls.push(FieldDecl {
                names: field_names(field),
                shape: shape.without_indirection(),
                ordinal: ordinal as u32,
            });
        }
        Ok(decls)
    }

    fn method(
        &mut self,
        scope: &Scope<'_>,
        interface: &str,
        method: &MethodSpec,
        ordinal: u32,
    ) -> Result<MethodDecl, ConvertError> {
        let site = Site {
            path: &scope.file.path,
            line: method.line,
            context: format!("method {} of interface {interface}", method.name),
        };

        let mut params = Vec::new();
        for group in &method.params {
            let shape = self.param_shape(scope, group, &site)?;
            if group.names.is_empty() {
                params.push(ParamDecl {
                    name: param_name(params.len()),
                    shape,
                });
            } else {
                for name in &group.names {
                    params.push(ParamDecl {
                        name: to_field_name(name),
                        shape: shape.clone(),
                    });
                }
            }
        }

        let mut results = Vec::new();
        for group in &method.results {
            let shape = self.param_shape(scope, group, &site)?;
            let count = group.names.len().max(1);
            results.extend(std::iter::repeat_n(shape, count));
        }

        Ok(MethodDecl {
            name: to_field_name(&method.name),
            ordinal,
            params,
            results,
        })
    }

    fn param_shape(
        &mut self,
        scope: &Scope<'_>,
        param: &ParamSpec,
        site: &Site<'_>,
    ) -> Result<TypeShape, ConvertError> {
        let mut shape = self.shape_of(scope, &param.ty, site)?;
        self.record(&shape, true);
        if param.variadic {
            shape = TypeShape::Slice(Box::new(shape));
        }
        Ok(shape.without_indirection())
    }

    fn imported_structs(&mut self) -> Result<Vec<ImportedStructDecl>, ConvertError> {
        let mut imported = Vec::new();
        let mut next = 0;

        while next < self.references.len() {
            let origin = self.references[next].clone();
            let is_direct = self.strict.contains(&origin);
            next += 1;

            match self.index.resolve_struct(&origin)? {
                Resolution::Struct(resolved) => {
                    let fields = self.imported_fields(&origin, &resolved, is_direct)?;
                    tracing::debug!(
                        origin = %origin,
                        fields = fields.len(),
                        transitive = !is_direct,
                        "extracted imported struct"
                    );
                    imported.push(ImportedStructDecl { origin, fields });
                }
                Resolution::NotStruct(found) if is_direct => {
                    return Err(ConvertError::UnresolvedType {
                        name: origin.to_string(),
                        found,
                    });
                }
                Resolution::Missing if is_direct => {
                    return Err(ConvertError::UnresolvedType {
                        name: origin.to_string(),
                        found: "no declaration".into(),
                    });
                }
                Resolution::NotStruct(found) => {
                    tracing::debug!(reference = %origin, %found, "transitive reference is not a struct");
                }
                Resolution::Missing => {
                    tracing::warn!(reference = %origin, "cannot load transitive reference, emitting name only");
                }
            }
        }

        Ok(imported)
    }

    /// Fields of an imported struct, flattened to one declaration per name.
    ///
    /// Unless `strict`, a field of unsupported type is dropped and the
    /// remaining fields are numbered without a gap.
    fn imported_fields(
        &mut self,
        origin: &QualifiedName,
        resolved: &ResolvedStruct,
        strict: bool,
    ) -> Result<Vec<FieldDecl>, ConvertError> {
        let package = Rc::clone(&resolved.package);
        let file = &package.files[resolved.file];
        let scope = Scope {
            file,
            home: Some(package.as_ref()),
            type_params: &[],
        };

        let mut decls = Vec::new();
        for field in &resolved.fields {
            let site = Site {
                path: &file.path,
                line: field.line,
                context: format!("field of imported struct {origin}"),
            };
            let shape = match self.shape_of(&scope, &field.ty, &site) {
                Ok(shape) => shape,
                Err(ConvertError::UnsupportedType { kind, .. }) if !strict => {
                    tracing::warn!(
                        origin = %origin,
                        fields = ?field_names(field),
                        %kind,
                        "dropping field of unsupported type from transitive struct"
                    );
                    continue;
                }
                Err(err) => return Err(err),
            };
            self.record(&shape, false);
            let shape = shape.without_indirection();
            for name in field_names(field) {
                decls.push(FieldDecl {
                    names: vec![name],
                    shape: shape.clone(),
                    ordinal: decls.len() as u32,
                });
            }
        }
        Ok(decls)
    }

    /// Remember the qualified type under `shape`, once per identity.
    fn record(&mut self, shape: &TypeShape, strict: bool) {
        if let Some(name) = shape.qualified_base() {
            if strict {
                self.strict.insert(name.clone());
            }
            if self.seen.insert(name.clone()) {
                self.references.push(name);
            }
        }
    }

    fn shape_of(
        &mut self,
        scope: &Scope<'_>,
        expr: &TypeExpr,
        site: &Site<'_>,
    ) -> Result<TypeShape, ConvertError> {
        match expr {
            TypeExpr::Ident(name) => self.ident_shape(scope, name),
            TypeExpr::Qualified { package, name } => {
                match self.index.import_path_in(scope.file, package)? {
                    Some(path) => Ok(TypeShape::qualified(path, name.clone())),
                    None => {
                        tracing::warn!(
                            file = %scope.file.path.display(),
                            package = %package,
                            "no import for package qualifier"
                        );
                        Ok(TypeShape::Named(name.clone()))
                    }
                }
            }
            TypeExpr::Slice(element) => Ok(TypeShape::Slice(Box::new(
                self.shape_of(scope, element, site)?,
            ))),
            TypeExpr::Pointer(target) => Ok(TypeShape::Pointer(Box::new(
                self.shape_of(scope, target, site)?,
            ))),
            TypeExpr::Struct(_) => Err(unsupported(site, "inline struct")),
            TypeExpr::Interface(_) => Err(unsupported(site, "inline interface")),
            TypeExpr::Unsupported { kind, line } => Err(ConvertError::UnsupportedType {
                path: site.path.to_path_buf(),
                line: *line,
                kind: kind.trim_end_matches("_type").to_string(),
                context: site.context.clone(),
            }),
        }
    }

    fn ident_shape(&mut self, scope: &Scope<'_>, name: &str) -> Result<TypeShape, ConvertError> {
        if scope.type_params.iter().any(|p| p == name) {
            return Ok(TypeShape::Named(name.to_string()));
        }
        if is_predeclared(name) {
            return Ok(TypeShape::Primitive(name.to_string()));
        }
        match scope.home {
            None if scope.file.type_spec(name).is_some() => {
                return Ok(TypeShape::Named(name.to_string()));
            }
            Some(package) if package.declares(name) => {
                return Ok(TypeShape::qualified(package.import_path.clone(), name));
            }
            _ => {}
        }
        if let Some(path) = self.index.dot_import_declaring(scope.file, name)? {
            return Ok(TypeShape::qualified(path, name));
        }
        tracing::warn!(
            file = %scope.file.path.display(),
            name,
            "unresolved identifier, emitting verbatim"
        );
        Ok(TypeShape::Named(name.to_string()))
    }
}

fn unsupported(site: &Site<'_>, kind: &str) -> ConvertError {
    ConvertError::UnsupportedType {
        path: site.path.to_path_buf(),
        line: site.line,
        kind: kind.to_string(),
        context: site.context.clone(),
    }
}

/// Schema names of a field; embedded fields are named after their type.
fn field_names(field: &FieldSpec) -> Vec<String> {
    if field.is_embedded() {
        field
            .ty
            .embedded_name()
            .map(|name| vec![to_field_name(name)])
            .unwrap_or_default()
    } else {
        field.names.iter().map(|n| to_field_name(n)).collect()
    }
}

fn check_name_conflicts(decls: &Declarations) -> Result<(), ConvertError> {
    let mut claimed: HashMap<&str, String> = HashMap::new();
    for name in decls
        .structs
        .iter()
        .map(|s| s.name.as_str())
        .chain(decls.interfaces.iter().map(|i| i.name.as_str()))
    {
        claimed.insert(name, format!("local declaration {name}"));
    }

    for imported in &decls.imported_structs {
        let name = imported.name();
        if let Some(first) = claimed.get(name) {
            return Err(ConvertError::NameConflict {
                name: name.to_string(),
                first: first.clone(),
                second: imported.origin.to_string(),
            });
        }
        claimed.insert(name, imported.origin.to_string());
    }
    Ok(())
}
