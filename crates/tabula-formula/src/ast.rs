use std::fmt;

use tabula_core::{format_number, Position};

/// Abstract Syntax Tree for formula expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),

    // Cell reference inside the sheet bounds (e.g., A1, XFD16384)
    CellRef(Position),

    // Well-formed reference that does not address a cell (e.g., ZZZZ1, A0);
    // keeps its source label and evaluates to #REF!
    InvalidRef(String),

    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },

    Unary { op: UnaryOp, operand: Box<Expr> },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    /// Get the precedence of this operator (higher = binds tighter)
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Mul | BinaryOp::Div => 2,
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg, // -
    Pos, // +
}

const UNARY_PRECEDENCE: u8 = 3;
const ATOM_PRECEDENCE: u8 = 4;

impl Expr {
    /// Create a cell reference expression
    pub fn cell_ref(row: i32, col: i32) -> Self {
        Expr::CellRef(Position::new(row, col))
    }

    /// Create a binary expression
    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Create a unary expression
    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// Number of nodes on the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];

        while let Some((expr, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            match expr {
                Expr::Binary { left, right, .. } => {
                    stack.push((left, depth + 1));
                    stack.push((right, depth + 1));
                }
                Expr::Unary { operand, .. } => stack.push((operand, depth + 1)),
                _ => {}
            }
        }

        deepest
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Binary { op, .. } => op.precedence(),
            Expr::Unary { .. } => UNARY_PRECEDENCE,
            _ => ATOM_PRECEDENCE,
        }
    }

    /// Whether `child`, written as the right operand of `op`, must be parenthesized
    /// to keep its meaning.
    fn right_needs_parens(op: BinaryOp, child: &Expr) -> bool {
        let child_prec = child.precedence();
        if child_prec < op.precedence() {
            return true;
        }
        if child_prec != op.precedence() {
            return false;
        }
        match (op, child) {
            (BinaryOp::Sub | BinaryOp::Div, _) => true,
            (BinaryOp::Mul, Expr::Binary { op: BinaryOp::Div, .. }) => true,
            _ => false,
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

/// Renders the canonical form: no whitespace and only the parentheses the
/// operator precedence requires.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => f.write_str(&format_number(*n)),
            Expr::CellRef(pos) => write!(f, "{}", pos),
            Expr::InvalidRef(label) => f.write_str(label),
            Expr::Binary { left, op, right } => {
                write_operand(f, left, left.precedence() < op.precedence())?;
                write!(f, "{}", op)?;
                write_operand(f, right, Expr::right_needs_parens(*op, right))
            }
            Expr::Unary { op, operand } => {
                write!(f, "{}", op)?;
                write_operand(f, operand, operand.precedence() < BinaryOp::Mul.precedence())
            }
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Pos => write!(f, "+"),
        }
    }
}
