use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FormulaError;

/// The evaluated value of a cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum CellValue {
    Text(String),
    Number(f64),
    Error(FormulaError),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Number(0.0)
    }
}

impl CellValue {
    /// Try to get the value as a number
    ///
    /// Text converts only when the whole string is a finite number; empty text is zero.
    pub fn as_number(&self) -> Result<f64, FormulaError> {
        match self {
            CellValue::Number(n) => Ok(*n),
            CellValue::Text(s) if s.is_empty() => Ok(0.0),
            CellValue::Text(s) => parse_number_text(s).ok_or(FormulaError::Value),
            CellValue::Error(e) => Err(*e),
        }
    }

    /// Render the value the way it is printed in a grid
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Error(e) => e.to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<Result<f64, FormulaError>> for CellValue {
    fn from(result: Result<f64, FormulaError>) -> Self {
        match result {
            Ok(n) => CellValue::Number(n),
            Err(e) => CellValue::Error(e),
        }
    }
}

/// Format numbers without unnecessary decimals
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        // Avoid rendering negative zero as "-0"
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Parse a whole string as a finite decimal number
///
/// Rejects the spellings `inf`/`nan` that `f64::from_str` would otherwise accept.
pub fn parse_number_text(s: &str) -> Option<f64> {
    let numeric = s
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !numeric {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_as_number() {
        assert_eq!(CellValue::Number(42.0).as_number(), Ok(42.0));
        assert_eq!(CellValue::Text("123".to_string()).as_number(), Ok(123.0));
        assert_eq!(CellValue::Text("1.5e2".to_string()).as_number(), Ok(150.0));
        assert_eq!(CellValue::Text(String::new()).as_number(), Ok(0.0));
        assert_eq!(
            CellValue::Text("hello".to_string()).as_number(),
            Err(FormulaError::Value)
        );
        assert_eq!(
            CellValue::Text("inf".to_string()).as_number(),
            Err(FormulaError::Value)
        );
        assert_eq!(
            CellValue::Error(FormulaError::Ref).as_number(),
            Err(FormulaError::Ref)
        );
    }

    #[test]
    fn test_cell_value_as_text() {
        assert_eq!(CellValue::Number(42.0).as_text(), "42");
        assert_eq!(CellValue::Number(42.5).as_text(), "42.5");
        assert_eq!(CellValue::Number(-0.0).as_text(), "0");
        assert_eq!(CellValue::Text("hello".to_string()).as_text(), "hello");
        assert_eq!(CellValue::Error(FormulaError::Arithmetic).as_text(), "#ARITHM!");
    }

    #[test]
    fn test_default_is_numeric_zero() {
        assert_eq!(CellValue::default(), CellValue::Number(0.0));
    }
}
