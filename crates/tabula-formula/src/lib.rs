pub mod ast;
pub mod evaluator;
pub mod parser;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use evaluator::Evaluator;
pub use parser::ParseError;

use tabula_core::{CellLookup, FormulaError, Position};

/// A parsed formula expression
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    ast: Expr,
}

/// Parse formula text, given without the leading `=`
pub fn parse_formula(expression: &str) -> Result<Formula, ParseError> {
    parser::parse(expression).map(|ast| Formula { ast })
}

impl Formula {
    /// Evaluate against a read-only view of the sheet
    pub fn evaluate<L>(&self, lookup: &L) -> Result<f64, FormulaError>
    where
        L: CellLookup + ?Sized,
    {
        Evaluator::new(lookup).evaluate(&self.ast)
    }

    /// Canonical text of the expression, without the leading `=`
    pub fn expression(&self) -> String {
        self.ast.to_string()
    }

    /// In-bounds positions this formula reads, sorted and deduplicated
    pub fn referenced_cells(&self) -> Vec<Position> {
        let mut refs = Vec::new();
        collect_references(&self.ast, &mut refs);
        refs.sort();
        refs.dedup();
        refs
    }
}

/// Recursively collect cell references from an AST
fn collect_references(expr: &Expr, refs: &mut Vec<Position>) {
    match expr {
        Expr::CellRef(pos) => refs.push(*pos),
        Expr::Binary { left, right, .. } => {
            collect_references(left, refs);
            collect_references(right, refs);
        }
        Expr::Unary { operand, .. } => collect_references(operand, refs),
        Expr::Number(_) | Expr::InvalidRef(_) => {}
    }
}
