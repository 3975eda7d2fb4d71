use crate::position::Position;
use crate::value::CellValue;

/// Read-only view of a sheet, handed to formulas during evaluation
///
/// Implementations return `None` for positions that hold no content; formulas read
/// those as zero, the same convention an empty cell's value follows.
pub trait CellLookup {
    fn cell_value(&self, pos: Position) -> Option<CellValue>;
}

impl<F> CellLookup for F
where
    F: Fn(Position) -> Option<CellValue>,
{
    fn cell_value(&self, pos: Position) -> Option<CellValue> {
        self(pos)
    }
}
