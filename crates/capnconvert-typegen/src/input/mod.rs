//! Go source loading and type resolution.
//!
//! [`go`] parses a single file, [`package`] loads whole dependency packages
//! and [`index`] ties them together into a type-checked view of the input.

pub mod go;
pub mod index;
pub mod package;

pub use go::{GoFile, GoImport, TypeExpr, TypeSpec, parse_go_file, parse_go_source};
pub use index::{Resolution, ResolutionIndex, ResolvedStruct};
pub use package::GoPackage;
