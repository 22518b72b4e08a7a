//! Catalog model building.

pub mod builder;
pub mod foreign_keys;
pub mod indexes;

pub use builder::{build_catalog, BuildOptions, BuildOutput, CatalogRows};
