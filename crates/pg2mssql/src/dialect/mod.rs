//! SQL Server dialect support.
//!
//! [`PostgresToMssqlMapper`] is the [`TypeMapper`](crate::core::TypeMapper)
//! used by the emitter.

mod typemap;

pub use typemap::{render_sized, PgType, PostgresToMssqlMapper};
