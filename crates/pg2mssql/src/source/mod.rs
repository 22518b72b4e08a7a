//! Source catalog access.
//!
//! Two [`CatalogReader`](crate::core::CatalogReader) implementations are
//! provided: [`PgCatalogReader`] over a live PostgreSQL connection and
//! [`InMemoryCatalog`] over a captured [`CatalogSnapshot`].

pub mod memory;
pub mod postgres;
pub mod rows;
mod tls;

pub use memory::{CatalogSnapshot, InMemoryCatalog};
pub use postgres::PgCatalogReader;
pub use tls::{SslMode, TlsBuilder};
