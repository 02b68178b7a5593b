//! Conversion errors.
//!
//! Every variant is fatal to the conversion: there is no partial schema.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The source file (or a file of an imported package) is not valid Go.
    #[error("{}:{line}:{column}: syntax error: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// An import or identifier could not be resolved.
    #[error("{}: {message}", .path.display())]
    TypeCheck { path: PathBuf, message: String },

    /// A qualified reference made by the input file does not underlie a struct.
    #[error("{name} does not resolve to a struct type (found {found})")]
    UnresolvedType { name: String, found: String },

    /// Two distinct declarations would be emitted under the same schema name.
    #[error("schema name {name} is claimed by both {first} and {second}")]
    NameConflict {
        name: String,
        first: String,
        second: String,
    },

    /// A type construct with no schema counterpart (map, chan, func, array, ...).
    #[error("{}:{line}: unsupported type {kind} in {context}", .path.display())]
    UnsupportedType {
        path: PathBuf,
        line: usize,
        kind: String,
        context: String,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    pub(crate) fn type_check(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::TypeCheck {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
