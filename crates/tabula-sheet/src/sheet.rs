use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::io::{self, Write};

use tabula_core::{CellLookup, CellValue, Position, Size};

use crate::cell::{Cell, CellContent};
use crate::dependency::{self, CellMap};
use crate::error::SheetError;

/// A single sheet: sparse storage for cells plus the printable bounding box
///
/// The sheet is the only place cells are created or destroyed. A cell is
/// materialized the first time its position is written or referenced by a formula.
#[derive(Debug, Default)]
pub struct Sheet {
    cells: CellMap,
    size: Size,
}

impl Sheet {
    /// Create a new empty sheet
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the content of a cell from user input
    ///
    /// Fails on an invalid position, an unparsable formula, or a formula that would
    /// close a reference cycle; in the last two cases the cell keeps its previous
    /// content and edges. The printable size grows to cover `pos` even when the
    /// write is rejected.
    pub fn set_cell(&mut self, pos: Position, text: impl Into<String>) -> Result<(), SheetError> {
        check_position(pos)?;

        self.materialize(pos);

        let text = text.into();
        let content = CellContent::parse(text).map_err(|e| {
            tracing::warn!("Rejected formula for {}: {}", pos, e);
            SheetError::from(e)
        })?;

        let new_refs: BTreeSet<Position> = content.referenced_cells().into_iter().collect();
        if dependency::would_create_cycle(&self.cells, pos, &new_refs) {
            tracing::warn!("Rejected formula for {}: circular dependency", pos);
            return Err(SheetError::CircularDependency(pos));
        }

        for target in &new_refs {
            self.materialize(*target);
        }
        dependency::replace_references(&mut self.cells, pos, new_refs);

        if let Some(cell) = self.cells.get_mut(&pos) {
            cell.set_content(content);
        }

        let invalidated = dependency::invalidate(&mut self.cells, pos);
        tracing::debug!("Set {}; invalidated {} cells", pos, invalidated.len());

        Ok(())
    }

    /// Get a read-only view of a cell, or `None` if nothing is materialized there
    pub fn get_cell(&self, pos: Position) -> Result<Option<CellRef<'_>>, SheetError> {
        check_position(pos)?;

        Ok(self.cells.get(&pos).map(|cell| CellRef {
            sheet: self,
            pos,
            cell,
        }))
    }

    /// Clear a cell
    ///
    /// Outgoing edges are removed and dependents invalidated. A cell that other
    /// formulas still reference stays materialized as empty; any other cell is
    /// destroyed and the printable size shrinks if it sat on the boundary.
    pub fn clear_cell(&mut self, pos: Position) -> Result<(), SheetError> {
        check_position(pos)?;

        if !self.cells.contains_key(&pos) {
            return Ok(());
        }

        dependency::replace_references(&mut self.cells, pos, BTreeSet::new());

        let referenced = self
            .cells
            .get(&pos)
            .is_some_and(|cell| !cell.dependents().is_empty());

        if referenced {
            if let Some(cell) = self.cells.get_mut(&pos) {
                cell.set_content(CellContent::Empty);
            }
            let invalidated = dependency::invalidate(&mut self.cells, pos);
            tracing::debug!(
                "Cleared {}; kept as empty for dependents, invalidated {} cells",
                pos,
                invalidated.len()
            );
        } else {
            self.cells.remove(&pos);
            tracing::debug!("Removed {}", pos);
            if self.size.is_on_boundary(pos) {
                self.recompute_size();
            }
        }

        Ok(())
    }

    /// Get the bounding box covering every materialized cell
    pub fn printable_size(&self) -> Size {
        self.size
    }

    /// Get the number of materialized cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Cells whose formulas read `pos` directly, sorted
    pub fn dependents_of(&self, pos: Position) -> Vec<Position> {
        self.cells
            .get(&pos)
            .map(|cell| cell.dependents().iter().copied().collect())
            .unwrap_or_default()
    }

    /// Cells whose values change when `pos` changes, sorted
    pub fn transitive_dependents_of(&self, pos: Position) -> Vec<Position> {
        dependency::transitive_dependents(&self.cells, pos)
    }

    /// Whether the formula at `pos` currently holds a memoized result
    pub fn is_cached(&self, pos: Position) -> bool {
        self.cells
            .get(&pos)
            .is_some_and(|cell| cell.cached_value().is_some())
    }

    /// Write evaluated values, tab-separated, one line per row of the printable area
    pub fn print_values<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.print_with(out, |pos, _| self.evaluate(pos).as_text())
    }

    /// Write raw cell texts, tab-separated, one line per row of the printable area
    pub fn print_texts<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.print_with(out, |_, cell| cell.text())
    }

    fn print_with<W, F>(&self, out: &mut W, render: F) -> io::Result<()>
    where
        W: Write,
        F: Fn(Position, &Cell) -> String,
    {
        for row in 0..self.size.rows {
            for col in 0..self.size.cols {
                if col > 0 {
                    out.write_all(b"\t")?;
                }
                let pos = Position::new(row, col);
                if let Some(cell) = self.cells.get(&pos) {
                    out.write_all(render(pos, cell).as_bytes())?;
                }
            }
            out.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Ensure a cell exists at `pos` and the printable size covers it
    fn materialize(&mut self, pos: Position) {
        self.cells.entry(pos).or_default();
        self.size = self.size.covering(pos);
    }

    /// Rebuild the bounding box from the remaining cells
    fn recompute_size(&mut self) {
        self.size = self
            .cells
            .keys()
            .fold(Size::default(), |size, pos| size.covering(*pos));
        tracing::trace!("Printable size is now {}x{}", self.size.rows, self.size.cols);
    }

    /// Get the value of the cell at `pos`
    fn evaluate(&self, pos: Position) -> CellValue {
        self.warm_cache(pos);
        match self.cells.get(&pos) {
            Some(cell) => cell.value_with(self),
            None => CellValue::default(),
        }
    }

    /// Evaluate the uncached formulas below `root` bottom-up
    ///
    /// Post-order walk on an explicit stack: when a formula is evaluated every
    /// formula it reads is already memoized, so evaluation never nests deeper than
    /// one cell regardless of chain length.
    fn warm_cache(&self, root: Position) {
        let mut expanded = HashSet::new();
        let mut stack = vec![(root, false)];

        while let Some((pos, children_done)) = stack.pop() {
            let Some(cell) = self.cells.get(&pos) else {
                continue;
            };
            if !cell.needs_evaluation() {
                continue;
            }

            if children_done {
                cell.value_with(self);
                continue;
            }

            if !expanded.insert(pos) {
                continue;
            }

            stack.push((pos, true));
            for target in cell.references() {
                if !expanded.contains(target) {
                    stack.push((*target, false));
                }
            }
        }
    }
}

/// Formulas read other cells through the sheet; empty cells read as absent
impl CellLookup for Sheet {
    fn cell_value(&self, pos: Position) -> Option<CellValue> {
        let cell = self.cells.get(&pos)?;
        if cell.content().is_empty() {
            return None;
        }
        Some(cell.value_with(self))
    }
}

fn check_position(pos: Position) -> Result<(), SheetError> {
    if pos.is_valid() {
        Ok(())
    } else {
        Err(SheetError::InvalidPosition(pos))
    }
}

/// Read-only view of a materialized cell
#[derive(Debug, Clone, Copy)]
pub struct CellRef<'a> {
    sheet: &'a Sheet,
    pos: Position,
    cell: &'a Cell,
}

impl<'a> CellRef<'a> {
    pub fn position(&self) -> Position {
        self.pos
    }

    /// Evaluated value; formulas are computed on first read and memoized
    pub fn value(&self) -> CellValue {
        self.sheet.evaluate(self.pos)
    }

    /// Raw text; formulas render in canonical form behind `=`
    pub fn text(&self) -> String {
        self.cell.text()
    }

    /// Positions the cell's formula reads, sorted
    pub fn referenced_cells(&self) -> Vec<Position> {
        self.cell.references().iter().copied().collect()
    }

    pub fn snapshot(&self) -> CellSnapshot {
        CellSnapshot {
            position: self.pos,
            text: self.text(),
            value: self.value().as_text(),
            references: self.referenced_cells(),
        }
    }
}

/// Serializable summary of one cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellSnapshot {
    pub position: Position,
    pub text: String,
    pub value: String,
    pub references: Vec<Position>,
}
