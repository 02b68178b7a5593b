//! Cap'n Proto schema generation from Go type declarations.
//!
//! `capnconvert-typegen` reads one Go source file and emits a self-contained
//! Cap'n Proto schema for its structs and interfaces, pulling in the structs
//! they reference from other packages.
//!
//! # Architecture
//!
//! ```text
//! Go file ──> input::go ──> input::index ──> extract ──> ir ──> output::capnp
//!             (tree-sitter)  (type check,     (two-pass   (Schema   (schema
//!                             package cache)   walk)      Document)  text)
//! ```
//!
//! Imports are located through a [`PackageResolver`]; [`GoResolver`] is the
//! go.mod-aware default.
//!
//! # Example
//!
//! ```no_run
//! use capnconvert_typegen::{ConvertOptions, convert};
//! use std::path::Path;
//!
//! let schema = convert(Path::new("testdata/test_file.go"), &ConvertOptions::default())?;
//! print!("{schema}");
//! # Ok::<(), capnconvert_typegen::ConvertError>(())
//! ```

pub mod error;
pub mod extract;
pub mod id;
pub mod input;
pub mod ir;
pub mod mapper;
pub mod naming;
pub mod output;

pub use capnconvert_local_deps::{GoEnv, GoResolver, PackageResolver};
pub use error::ConvertError;
pub use ir::SchemaDocument;
pub use output::EmitOptions;

use input::{ResolutionIndex, parse_go_file};
use std::path::Path;

/// Everything a conversion needs besides the input path.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub emit: EmitOptions,
    /// Toolchain locations for import resolution
    pub env: GoEnv,
}

/// Convert a Go file to Cap'n Proto schema text.
///
/// Imports are resolved with a [`GoResolver`] rooted at the file's module.
pub fn convert(path: &Path, options: &ConvertOptions) -> Result<String, ConvertError> {
    let resolver = GoResolver::for_file(path, options.env.clone().with_process_env());
    convert_with_resolver(path, &resolver, &options.emit)
}

/// Convert using a caller-supplied resolver.
pub fn convert_with_resolver(
    path: &Path,
    resolver: &dyn PackageResolver,
    emit: &EmitOptions,
) -> Result<String, ConvertError> {
    let doc = extract_document(path, resolver)?;
    Ok(output::render(&doc, emit))
}

/// Parse, type-check and extract a file without rendering it.
///
/// Every call assigns a fresh file ID.
pub fn extract_document(
    path: &Path,
    resolver: &dyn PackageResolver,
) -> Result<SchemaDocument, ConvertError> {
    tracing::debug!(file = %path.display(), "converting");
    let file = parse_go_file(path)?;
    let mut index = ResolutionIndex::build(file, resolver)?;
    let declarations = extract::extract(&mut index)?;
    tracing::debug!(
        structs = declarations.structs.len(),
        imported = declarations.imported_structs.len(),
        interfaces = declarations.interfaces.len(),
        "extraction complete"
    );
    Ok(SchemaDocument {
        id: id::new_file_id(),
        declarations,
    })
}
