use std::cell::OnceCell;
use std::collections::BTreeSet;

use tabula_core::{CellLookup, CellValue, Position};
use tabula_formula::{parse_formula, Formula, ParseError};

/// Leading character that marks a formula
pub const FORMULA_SIGN: char = '=';
/// Leading character that keeps text from being read as a formula
pub const ESCAPE_SIGN: char = '\'';

/// The content of a cell
#[derive(Debug, Clone, Default)]
pub enum CellContent {
    #[default]
    Empty,
    /// Raw text exactly as written, escape sign included
    Text(String),
    Formula(Formula),
}

impl CellContent {
    /// Classify user input
    ///
    /// Empty input is [`CellContent::Empty`]; input starting with `=` and longer than
    /// the sign alone is parsed as a formula; everything else is stored verbatim.
    pub fn parse(text: String) -> Result<Self, ParseError> {
        if text.is_empty() {
            return Ok(CellContent::Empty);
        }

        match text.strip_prefix(FORMULA_SIGN) {
            Some(expression) if !expression.is_empty() => {
                parse_formula(expression).map(CellContent::Formula)
            }
            _ => Ok(CellContent::Text(text)),
        }
    }

    /// Get the text a user would see when editing
    pub fn text(&self) -> String {
        match self {
            CellContent::Empty => String::new(),
            CellContent::Text(text) => text.clone(),
            CellContent::Formula(formula) => format!("{}{}", FORMULA_SIGN, formula.expression()),
        }
    }

    /// Positions this content reads from, sorted and deduplicated
    pub fn referenced_cells(&self) -> Vec<Position> {
        match self {
            CellContent::Formula(formula) => formula.referenced_cells(),
            _ => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellContent::Empty)
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, CellContent::Formula(_))
    }
}

/// A materialized cell: its content, the memoized formula result, and both
/// directions of its dependency edges
///
/// Edges are positions, never references, so a removed cell simply stops resolving.
#[derive(Debug, Default)]
pub struct Cell {
    content: CellContent,
    /// Written only by evaluation, cleared only by invalidation
    cache: OnceCell<CellValue>,
    /// Cells this cell's formula reads from
    references: BTreeSet<Position>,
    /// Cells whose formulas read from this cell
    dependents: BTreeSet<Position>,
}

impl Cell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &CellContent {
        &self.content
    }

    pub fn text(&self) -> String {
        self.content.text()
    }

    pub fn references(&self) -> &BTreeSet<Position> {
        &self.references
    }

    pub fn dependents(&self) -> &BTreeSet<Position> {
        &self.dependents
    }

    /// The memoized formula result, if one is present
    pub fn cached_value(&self) -> Option<&CellValue> {
        self.cache.get()
    }

    /// Whether reading this cell's value would run the formula engine
    pub fn needs_evaluation(&self) -> bool {
        self.content.is_formula() && self.cache.get().is_none()
    }

    /// Compute the value, reading other cells through `lookup`
    ///
    /// Formula results, including error values, are memoized until invalidated.
    pub fn value_with<L>(&self, lookup: &L) -> CellValue
    where
        L: CellLookup + ?Sized,
    {
        match &self.content {
            CellContent::Empty => CellValue::Number(0.0),
            CellContent::Text(text) => {
                let value = text.strip_prefix(ESCAPE_SIGN).unwrap_or(text);
                CellValue::Text(value.to_string())
            }
            CellContent::Formula(formula) => self
                .cache
                .get_or_init(|| formula.evaluate(lookup).into())
                .clone(),
        }
    }

    pub(crate) fn set_content(&mut self, content: CellContent) {
        self.content = content;
        self.cache = OnceCell::new();
    }

    /// Drop the memoized result, reporting whether one was present
    pub(crate) fn clear_cache(&mut self) -> bool {
        self.cache.take().is_some()
    }

    pub(crate) fn references_mut(&mut self) -> &mut BTreeSet<Position> {
        &mut self.references
    }

    pub(crate) fn dependents_mut(&mut self) -> &mut BTreeSet<Position> {
        &mut self.dependents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::FormulaError;

    fn no_cells(_: Position) -> Option<CellValue> {
        None
    }

    fn cell_with(text: &str) -> Cell {
        let mut cell = Cell::new();
        cell.set_content(CellContent::parse(text.to_string()).unwrap());
        cell
    }

    #[test]
    fn test_classification() {
        assert!(matches!(CellContent::parse(String::new()), Ok(CellContent::Empty)));
        assert!(matches!(CellContent::parse("hello".to_string()), Ok(CellContent::Text(t)) if t == "hello"));
        assert!(matches!(CellContent::parse("=".to_string()), Ok(CellContent::Text(t)) if t == "="));
        assert!(matches!(CellContent::parse("=1+2".to_string()), Ok(CellContent::Formula(_))));
        assert!(matches!(CellContent::parse("'=1+2".to_string()), Ok(CellContent::Text(t)) if t == "'=1+2"));
        assert!(CellContent::parse("=1+".to_string()).is_err());
    }

    #[test]
    fn test_empty_cell() {
        let cell = Cell::new();
        assert_eq!(cell.value_with(&no_cells), CellValue::Number(0.0));
        assert_eq!(cell.text(), "");
        assert!(cell.references().is_empty());
    }

    #[test]
    fn test_escape_sign_only_affects_value() {
        let cell = cell_with("'=1+2");
        assert_eq!(cell.text(), "'=1+2");
        assert_eq!(cell.value_with(&no_cells), CellValue::Text("=1+2".to_string()));

        let cell = cell_with("''quoted");
        assert_eq!(cell.value_with(&no_cells), CellValue::Text("'quoted".to_string()));

        let cell = cell_with("'");
        assert_eq!(cell.value_with(&no_cells), CellValue::Text(String::new()));
    }

    #[test]
    fn test_formula_text_is_canonical() {
        let cell = cell_with("= ( 1 + 2 ) * A1 ");
        assert_eq!(cell.text(), "=(1+2)*A1");
        assert_eq!(cell.content().referenced_cells(), vec![Position::new(0, 0)]);
    }

    #[test]
    fn test_formula_value_is_memoized() {
        let mut cell = cell_with("=1/0");
        assert!(cell.needs_evaluation());
        assert_eq!(cell.value_with(&no_cells), CellValue::Error(FormulaError::Arithmetic));
        assert_eq!(cell.cached_value(), Some(&CellValue::Error(FormulaError::Arithmetic)));
        assert!(!cell.needs_evaluation());

        assert!(cell.clear_cache());
        assert!(!cell.clear_cache());
        assert!(cell.needs_evaluation());
    }
}
