//! Sheet storage and dependency tracking for Tabula.
//!
//! A [`Sheet`] owns every materialized [`Cell`]. Writes are validated against the
//! dependency graph before anything changes, and formula results are memoized
//! until one of their inputs changes.

pub mod cell;
pub mod dependency;
pub mod error;
pub mod sheet;

pub use cell::{Cell, CellContent, ESCAPE_SIGN, FORMULA_SIGN};
pub use error::SheetError;
pub use sheet::{CellRef, CellSnapshot, Sheet};
