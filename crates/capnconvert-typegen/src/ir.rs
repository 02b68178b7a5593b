//! Intermediate representation between Go declarations and schema text.

use serde::Serialize;
use std::fmt;

/// Go's predeclared type identifiers.
pub const PREDECLARED_TYPES: &[&str] = &[
    "any",
    "bool",
    "byte",
    "comparable",
    "complex64",
    "complex128",
    "error",
    "float32",
    "float64",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "rune",
    "string",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
];

pub fn is_predeclared(name: &str) -> bool {
    PREDECLARED_TYPES.contains(&name)
}

/// Language-neutral shape of a type expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeShape {
    /// A predeclared Go type (`int`, `string`, `error`, ...)
    Primitive(String),
    Slice(Box<TypeShape>),
    Pointer(Box<TypeShape>),
    /// A type declared in the same package as the reference
    Named(String),
    /// A type declared in another package, identified by its import path
    Qualified { package: String, name: String },
}

impl TypeShape {
    /// Classify a bare identifier.
    pub fn ident(name: &str) -> Self {
        if is_predeclared(name) {
            Self::Primitive(name.to_string())
        } else {
            Self::Named(name.to_string())
        }
    }

    pub fn qualified(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Qualified {
            package: package.into(),
            name: name.into(),
        }
    }

    /// The same shape with every pointer indirection removed.
    ///
    /// The wire format has no notion of pointers, so `*T` and `T` map alike.
    pub fn without_indirection(&self) -> Self {
        match self {
            Self::Pointer(target) => target.without_indirection(),
            Self::Slice(element) => Self::Slice(Box::new(element.without_indirection())),
            other => other.clone(),
        }
    }

    /// The qualified type referenced through any pointer/slice wrappers.
    pub fn qualified_base(&self) -> Option<QualifiedName> {
        match self {
            Self::Qualified { package, name } => Some(QualifiedName {
                package: package.clone(),
                name: name.clone(),
            }),
            Self::Slice(inner) | Self::Pointer(inner) => inner.qualified_base(),
            Self::Primitive(_) | Self::Named(_) => None,
        }
    }
}

impl fmt::Display for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(name) | Self::Named(name) => f.write_str(name),
            Self::Slice(inner) => write!(f, "[]{inner}"),
            Self::Pointer(inner) => write!(f, "*{inner}"),
            Self::Qualified { package, name } => write!(f, "{package}.{name}"),
        }
    }
}

/// Identity of a type declared in another package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct QualifiedName {
    /// Import path of the declaring package
    pub package: String,
    pub name: String,
}

impl QualifiedName {
    /// Simple name used in the schema: the package prefix is dropped.
    pub fn flatten(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.package, self.name)
    }
}

/// A struct field. Grouped Go fields (`X, Y int`) share one declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDecl {
    /// Schema field names, already case-transformed
    pub names: Vec<String>,
    pub shape: TypeShape,
    pub ordinal: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
}

/// A struct declared in another package and pulled in by reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportedStructDecl {
    pub origin: QualifiedName,
    pub fields: Vec<FieldDecl>,
}

impl ImportedStructDecl {
    pub fn name(&self) -> &str {
        self.origin.flatten()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamDecl {
    pub name: String,
    pub shape: TypeShape,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodDecl {
    pub name: String,
    pub ordinal: u32,
    pub params: Vec<ParamDecl>,
    pub results: Vec<TypeShape>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceDecl {
    pub name: String,
    pub methods: Vec<MethodDecl>,
}

/// Everything extracted from one source file, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Declarations {
    pub structs: Vec<StructDecl>,
    pub imported_structs: Vec<ImportedStructDecl>,
    pub interfaces: Vec<InterfaceDecl>,
}

/// A complete schema ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaDocument {
    /// 16 lowercase hex digits, without the `0x` prefix
    pub id: String,
    #[serde(flatten)]
    pub declarations: Declarations,
}
