//! Model transforms applied between building and emitting.
//!
//! - [`array`]: array columns become numbered scalar columns
//! - [`defaults`]: PostgreSQL default expressions become T-SQL defaults
//! - [`sequence`]: sequence maxima are clamped to the target integer type

pub mod array;
pub mod defaults;
pub mod sequence;

pub use array::{
    flatten_catalog, flatten_column, size_binary_columns, Cardinalities, FlattenResult,
    FlattenSummary,
};
pub use defaults::translate as translate_default;
