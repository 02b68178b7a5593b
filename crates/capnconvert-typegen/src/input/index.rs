//! Type resolution for one input file and the packages it reaches.

use super::go::{FieldSpec, GoFile, InterfaceElem, TypeExpr};
use super::package::{GoPackage, is_exported};
use crate::error::ConvertError;
use crate::ir::{QualifiedName, is_predeclared};
use capnconvert_local_deps::PackageResolver;
use std::collections::HashMap;
use std::rc::Rc;

/// Upper bound on `type A B` hops while looking for a struct literal.
const MAX_DEFINITION_HOPS: usize = 32;

/// What a qualified reference turned out to be.
#[derive(Debug)]
pub enum Resolution {
    Struct(ResolvedStruct),
    /// Declared, but not as a struct; carries a short description of what was found
    NotStruct(String),
    /// The package cannot be loaded or does not declare the name
    Missing,
}

/// A struct literal reached from a qualified reference.
#[derive(Debug)]
pub struct ResolvedStruct {
    /// Package holding the struct literal (may differ from the referenced one
    /// when an alias crosses packages)
    pub package: Rc<GoPackage>,
    /// Index into `package.files` of the declaring file
    pub file: usize,
    pub fields: Vec<FieldSpec>,
}

/// Type-checked view of an input file with on-demand package loading.
///
/// Packages are loaded through the [`PackageResolver`] the first time they are
/// needed and cached for the lifetime of the index, including failures.
pub struct ResolutionIndex<'r> {
    resolver: &'r dyn PackageResolver,
    input: Rc<GoFile>,
    packages: HashMap<String, Option<Rc<GoPackage>>>,
}

impl<'r> ResolutionIndex<'r> {
    /// Load the input file's imports and check every type reference made by
    /// its type declarations.
    pub fn build(input: GoFile, resolver: &'r dyn PackageResolver) -> Result<Self, ConvertError> {
        let mut index = Self {
            resolver,
            input: Rc::new(input),
            packages: HashMap::new(),
        };
        index.check_imports()?;
        index.check_declarations()?;
        Ok(index)
    }

    pub fn input(&self) -> Rc<GoFile> {
        Rc::clone(&self.input)
    }

    /// Load (or fetch from cache) the package at `import_path`.
    pub fn package(&mut self, import_path: &str) -> Result<Option<Rc<GoPackage>>, ConvertError> {
        if let Some(cached) = self.packages.get(import_path) {
            return Ok(cached.clone());
        }

        let loaded = match self.resolver.resolve_package(import_path) {
            Some(resolved) => {
                tracing::debug!(
                    import_path,
                    dir = %resolved.path.display(),
                    origin = ?resolved.origin,
                    "loading package"
                );
                GoPackage::load(import_path, &resolved.path)?.map(Rc::new)
            }
            None => {
                tracing::debug!(import_path, "import not found");
                None
            }
        };
        self.packages
            .insert(import_path.to_string(), loaded.clone());
        Ok(loaded)
    }

    /// Import path that `local` names inside `file`.
    ///
    /// Unaliased imports are matched on their last path segment first and
    /// only loaded when that fails, since the package clause may differ.
    pub fn import_path_in(
        &mut self,
        file: &GoFile,
        local: &str,
    ) -> Result<Option<String>, ConvertError> {
        if let Some(import) = file
            .imports
            .iter()
            .find(|i| i.alias.as_deref() == Some(local))
        {
            return Ok(Some(import.path.clone()));
        }

        let unaliased: Vec<&str> = file
            .imports
            .iter()
            .filter(|i| i.alias.is_none())
            .map(|i| i.path.as_str())
            .collect();
        if let Some(path) = unaliased.iter().find(|p| last_segment(p) == local) {
            return Ok(Some(path.to_string()));
        }
        for path in unaliased {
            if let Some(pkg) = self.package(path)?
                && pkg.name == local
            {
                return Ok(Some(path.to_string()));
            }
        }
        Ok(None)
    }

    /// Import path of a dot-imported package in `file` that exports `name`.
    pub fn dot_import_declaring(
        &mut self,
        file: &GoFile,
        name: &str,
    ) -> Result<Option<String>, ConvertError> {
        if !is_exported(name) {
            return Ok(None);
        }
        for import in file.imports.iter().filter(|i| i.is_dot()) {
            if let Some(pkg) = self.package(&import.path)?
                && pkg.declares(name)
            {
                return Ok(Some(import.path.clone()));
            }
        }
        Ok(None)
    }

    /// Follow defined types and aliases from `name` to a struct literal.
    pub fn resolve_struct(&mut self, name: &QualifiedName) -> Result<Resolution, ConvertError> {
        let mut current = name.clone();
        for _ in 0..MAX_DEFINITION_HOPS {
            let Some(pkg) = self.package(&current.package)? else {
                return Ok(Resolution::Missing);
            };
            let Some((file_idx, spec)) = pkg.lookup(&current.name) else {
                return Ok(Resolution::Missing);
            };
            if spec.is_generic() {
                return Ok(Resolution::NotStruct("generic type".into()));
            }

            let next = match &spec.ty {
                TypeExpr::Struct(fields) => {
                    return Ok(Resolution::Struct(ResolvedStruct {
                        package: Rc::clone(&pkg),
                        file: file_idx,
                        fields: fields.clone(),
                    }));
                }
                TypeExpr::Ident(ident) if !is_predeclared(ident) => {
                    let home = if pkg.declares(ident) {
                        Some(current.package.clone())
                    } else {
                        self.dot_import_declaring(&pkg.files[file_idx], ident)?
                    };
                    home.map(|package| QualifiedName {
                        package,
                        name: ident.clone(),
                    })
                }
                TypeExpr::Qualified { package, name } => self
                    .import_path_in(&pkg.files[file_idx], package)?
                    .map(|package| QualifiedName {
                        package,
                        name: name.clone(),
                    }),
                other => return Ok(Resolution::NotStruct(describe(other))),
            };

            match next {
                Some(next) => {
                    tracing::trace!(from = %current, to = %next, "following type definition");
                    current = next;
                }
                None => return Ok(Resolution::Missing),
            }
        }
        Ok(Resolution::NotStruct("cyclic type definition".into()))
    }

    fn check_imports(&mut self) -> Result<(), ConvertError> {
        let input = self.input();
        for import in &input.imports {
            if self.package(&import.path)?.is_none() {
                return Err(ConvertError::type_check(
                    &input.path,
                    format!("could not import {}", import.path),
                ));
            }
        }
        Ok(())
    }

    fn check_declarations(&mut self) -> Result<(), ConvertError> {
        let input = self.input();

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for spec in &input.types {
            if let Some(first_line) = seen.insert(&spec.name, spec.line) {
                return Err(ConvertError::type_check(
                    &input.path,
                    format!(
                        "{} redeclared in this block (line {}, first declared on line {})",
                        spec.name, spec.line, first_line
                    ),
                ));
            }
        }

        for spec in &input.types {
            self.check_expr(&input, &spec.type_params, &spec.ty)?;
        }
        Ok(())
    }

    /// Check the names in `expr`; `params` are the enclosing type parameters.
    fn check_expr(
        &mut self,
        input: &GoFile,
        params: &[String],
        expr: &TypeExpr,
    ) -> Result<(), ConvertError> {
        match expr {
            TypeExpr::Ident(name) => {
                if is_predeclared(name)
                    || params.contains(name)
                    || input.type_spec(name).is_some()
                    || self.dot_import_declaring(input, name)?.is_some()
                {
                    Ok(())
                } else {
                    Err(ConvertError::type_check(
                        &input.path,
                        format!("undefined: {name}"),
                    ))
                }
            }
            TypeExpr::Qualified { package, name } => {
                let pkg = match self.import_path_in(input, package)? {
                    Some(path) => self.package(&path)?,
                    None => None,
                };
                let Some(pkg) = pkg else {
                    return Err(ConvertError::type_check(
                        &input.path,
                        format!("undefined: {package}"),
                    ));
                };
                if !pkg.declares(name) {
                    Err(ConvertError::type_check(
                        &input.path,
                        format!("undefined: {package}.{name}"),
                    ))
                } else if !is_exported(name) {
                    Err(ConvertError::type_check(
                        &input.path,
                        format!("name {name} not exported by package {}", pkg.name),
                    ))
                } else {
                    Ok(())
                }
            }
            TypeExpr::Slice(inner) | TypeExpr::Pointer(inner) => {
                self.check_expr(input, params, inner)
            }
            TypeExpr::Struct(fields) => {
                for field in fields {
                    self.check_expr(input, params, &field.ty)?;
                }
                Ok(())
            }
            TypeExpr::Interface(elems) => {
                for elem in elems {
                    match elem {
                        InterfaceElem::Method(method) => {
                            for param in method.params.iter().chain(&method.results) {
                                self.check_expr(input, params, &param.ty)?;
                            }
                        }
                        InterfaceElem::Embedded(ty) => self.check_expr(input, params, ty)?,
                    }
                }
                Ok(())
            }
            TypeExpr::Unsupported { .. } => Ok(()),
        }
    }
}

/// Last element of an import path, ignoring a `/vN` major-version suffix.
fn last_segment(import_path: &str) -> &str {
    let mut segments = import_path.rsplit('/');
    let last = segments.next().unwrap_or(import_path);
    let is_major_version = last.len() > 1
        && last.starts_with('v')
        && last[1..].chars().all(|c| c.is_ascii_digit());
    match segments.next() {
        Some(parent) if is_major_version => parent,
        _ => last,
    }
}

fn describe(expr: &TypeExpr) -> String {
    match expr {
        TypeExpr::Ident(name) => name.clone(),
        TypeExpr::Qualified { package, name } => format!("{package}.{name}"),
        TypeExpr::Slice(_) => "slice".into(),
        TypeExpr::Pointer(_) => "pointer".into(),
        TypeExpr::Struct(_) => "struct".into(),
        TypeExpr::Interface(_) => "interface".into(),
        TypeExpr::Unsupported { kind, .. } => kind.trim_end_matches("_type").to_string(),
    }
}
