//! T-SQL DDL generation.
//!
//! The emitter turns a [`SchemaCatalog`](crate::core::SchemaCatalog) into a
//! fixed set of scripts built from structured [`Statement`]s; text is only
//! produced when a script is rendered or written.

mod emitter;
pub mod script;
pub mod statement;
mod writer;

pub use emitter::{DdlEmitter, EmitOptions, EmitOutput};
pub use script::{ArtifactKind, Script};
pub use statement::Statement;
pub use writer::{write_scripts, WrittenArtifact};
