//! Import engine.
//!
//! - Normalize: header canonicalization
//! - Resolver: header → role binding
//! - Dates: expiry date coercion
//! - Rows: per-row classification
//! - Pipeline: import entry points

pub mod dates;
pub mod normalize;
pub mod pipeline;
pub mod resolver;
pub mod rows;

pub use dates::coerce_date;
pub use normalize::normalize;
pub use pipeline::*;
pub use resolver::{resolve_columns, ColumnMap};
pub use rows::{process_row, RowOutcome};
