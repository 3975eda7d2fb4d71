use thiserror::Error;

use tabula_core::Position;
use tabula_formula::ParseError;

/// Reasons a sheet operation is rejected
///
/// A rejected write leaves every cell's content and edges as they were.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SheetError {
    #[error("Invalid position: ({}, {})", .0.row, .0.col)]
    InvalidPosition(Position),

    #[error("Circular dependency: formula in {0} would depend on itself")]
    CircularDependency(Position),

    #[error("Formula error: {0}")]
    FormulaParse(#[from] ParseError),
}
