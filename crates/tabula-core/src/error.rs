use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Represents possible evaluation errors of a formula
///
/// These are values, not failures: a formula that evaluates to one of them caches it
/// and dependent formulas propagate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum FormulaError {
    /// #REF! - Reference to a position outside the sheet
    #[error("#REF!")]
    Ref,
    /// #VALUE! - Operand cannot be interpreted as a number
    #[error("#VALUE!")]
    Value,
    /// #ARITHM! - Division by zero or a non-finite result
    #[error("#ARITHM!")]
    Arithmetic,
}

/// A label could not be decoded into a [`crate::Position`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid position: {input}")]
pub struct PositionParseError {
    pub input: String,
}

impl PositionParseError {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}
