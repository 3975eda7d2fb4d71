use crate::ast::{BinaryOp, Expr, UnaryOp};
use tabula_core::{CellLookup, FormulaError};

/// Evaluator for formula AST
pub struct Evaluator<'a, L>
where
    L: CellLookup + ?Sized,
{
    lookup: &'a L,
}

impl<'a, L> Evaluator<'a, L>
where
    L: CellLookup + ?Sized,
{
    pub fn new(lookup: &'a L) -> Self {
        Self { lookup }
    }

    /// Evaluate an expression AST to a number, or the error it produces
    pub fn evaluate(&self, expr: &Expr) -> Result<f64, FormulaError> {
        match expr {
            Expr::Number(n) => Ok(*n),

            Expr::CellRef(pos) => match self.lookup.cell_value(*pos) {
                Some(value) => value.as_number(),
                None => Ok(0.0),
            },

            Expr::InvalidRef(_) => Err(FormulaError::Ref),

            Expr::Binary { left, op, right } => self.evaluate_binary(left, *op, right),

            Expr::Unary { op, operand } => {
                let value = self.evaluate(operand)?;
                Ok(match op {
                    UnaryOp::Neg => -value,
                    UnaryOp::Pos => value,
                })
            }
        }
    }

    fn evaluate_binary(&self, left: &Expr, op: BinaryOp, right: &Expr) -> Result<f64, FormulaError> {
        // Errors propagate left to right
        let left_val = self.evaluate(left)?;
        let right_val = self.evaluate(right)?;

        let result = match op {
            BinaryOp::Add => left_val + right_val,
            BinaryOp::Sub => left_val - right_val,
            BinaryOp::Mul => left_val * right_val,
            BinaryOp::Div => left_val / right_val,
        };

        if result.is_finite() {
            Ok(result)
        } else {
            Err(FormulaError::Arithmetic)
        }
    }
}
