//! Output backends.
//!
//! Only Cap'n Proto schema text is produced here; structured dumps of the
//! [`SchemaDocument`](crate::ir::SchemaDocument) go through its `Serialize`
//! implementation.

pub mod capnp;

pub use capnp::{EmitOptions, render};
