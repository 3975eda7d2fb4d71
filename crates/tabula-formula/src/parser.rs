//! Nom-based formula parser.
//!
//! Parses formula text (without the leading `=`) directly into an AST.

use nom::{
    branch::alt,
    character::complete::{char, digit0, digit1, multispace0, one_of, satisfy},
    combinator::{map, opt, recognize},
    multi::{fold_many0, many1_count},
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};
use thiserror::Error;

use tabula_core::Position;

use crate::ast::{BinaryOp, Expr, UnaryOp};

/// Longest formula text accepted, in bytes
pub const MAX_FORMULA_LENGTH: usize = 8_192;
/// Deepest run of parentheses and prefix signs accepted
pub const MAX_NESTING: usize = 64;
/// Deepest expression tree accepted; long operator chains nest on the left
pub const MAX_DEPTH: usize = 512;

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

// =============================================================================
// Helper Combinators
// =============================================================================

/// Skip whitespace
fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn exponent(input: &str) -> IResult<&str, &str> {
    recognize(tuple((one_of("eE"), opt(one_of("+-")), digit1)))(input)
}

/// Parse an unsigned decimal number (`12`, `1.5`, `.5`, `3.`, `2e-3`)
fn parse_number(input: &str) -> IResult<&str, Expr> {
    let (rest, num_str) = recognize(pair(
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
        opt(exponent),
    ))(input)?;

    match num_str.parse::<f64>() {
        Ok(num) if num.is_finite() => Ok((rest, Expr::Number(num))),
        _ => Err(nom::Err::Failure(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Float,
        ))),
    }
}

/// Parse a cell reference (e.g., A1, AA10)
///
/// Any run of uppercase letters followed by digits is a reference; labels that do
/// not decode to a position inside the sheet become [`Expr::InvalidRef`].
fn parse_cell_ref(input: &str) -> IResult<&str, Expr> {
    let (rest, label) = recognize(pair(
        many1_count(satisfy(|c| c.is_ascii_uppercase())),
        digit1,
    ))(input)?;

    let expr = match Position::parse(label) {
        Some(pos) => Expr::CellRef(pos),
        None => Expr::InvalidRef(label.to_string()),
    };
    Ok((rest, expr))
}

// =============================================================================
// Operator Parsers
// =============================================================================

fn parse_additive_op(input: &str) -> IResult<&str, BinaryOp> {
    alt((
        map(char('+'), |_| BinaryOp::Add),
        map(char('-'), |_| BinaryOp::Sub),
    ))(input)
}

fn parse_multiplicative_op(input: &str) -> IResult<&str, BinaryOp> {
    alt((
        map(char('*'), |_| BinaryOp::Mul),
        map(char('/'), |_| BinaryOp::Div),
    ))(input)
}

// =============================================================================
// Expression Parsers (Precedence Climbing)
// =============================================================================

/// Parse a primary expression (literals, cell refs, parentheses)
fn parse_primary(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (input, _) = multispace0(input)?;

    alt((
        // Parentheses only group; the canonical printer re-derives them
        delimited(char('('), |i| parse_additive(i, depth + 1), ws(char(')'))),
        parse_number,
        parse_cell_ref,
    ))(input)
}

/// Parse a unary expression (prefix - or +)
fn parse_unary(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (input, _) = multispace0(input)?;

    if depth > MAX_NESTING {
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            nom::error::ErrorKind::TooLarge,
        )));
    }

    alt((
        map(preceded(char('-'), |i| parse_unary(i, depth + 1)), |e| {
            Expr::unary(UnaryOp::Neg, e)
        }),
        map(preceded(char('+'), |i| parse_unary(i, depth + 1)), |e| {
            Expr::unary(UnaryOp::Pos, e)
        }),
        |i| parse_primary(i, depth),
    ))(input)
}

/// Parse multiplicative expressions (*, /)
fn parse_multiplicative(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (input, init) = parse_unary(input, depth)?;

    fold_many0(
        pair(ws(parse_multiplicative_op), |i| parse_unary(i, depth)),
        move || init.clone(),
        |acc, (op, val)| Expr::binary(acc, op, val),
    )(input)
}

/// Parse additive expressions (+, -)
fn parse_additive(input: &str, depth: usize) -> IResult<&str, Expr> {
    let (input, init) = parse_multiplicative(input, depth)?;

    fold_many0(
        pair(ws(parse_additive_op), |i| parse_multiplicative(i, depth)),
        move || init.clone(),
        |acc, (op, val)| Expr::binary(acc, op, val),
    )(input)
}

/// Parse a complete expression
pub fn parse_expression(input: &str) -> IResult<&str, Expr> {
    let (input, _) = multispace0(input)?;
    parse_additive(input, 0)
}

// =============================================================================
// Public API
// =============================================================================

/// Parse formula text into an AST, requiring all input to be consumed
///
/// Input longer than [`MAX_FORMULA_LENGTH`], nested deeper than [`MAX_NESTING`]
/// parentheses or signs, or producing a tree deeper than [`MAX_DEPTH`] is rejected.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    if input.len() > MAX_FORMULA_LENGTH {
        return Err(ParseError {
            message: format!("Formula is longer than {} bytes", MAX_FORMULA_LENGTH),
            position: MAX_FORMULA_LENGTH,
        });
    }

    let expr = match parse_expression(input) {
        Ok((remaining, expr)) => {
            let remaining = remaining.trim_start();
            if !remaining.is_empty() {
                return Err(ParseError {
                    message: format!("Unexpected input: '{}'", remaining),
                    position: input.len() - remaining.len(),
                });
            }
            expr
        }
        Err(nom::Err::Failure(e)) if e.code == nom::error::ErrorKind::TooLarge => {
            return Err(ParseError {
                message: format!("Nesting deeper than {} levels", MAX_NESTING),
                position: input.len() - e.input.len(),
            });
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            return Err(ParseError {
                message: format!("Unexpected input: '{}'", e.input),
                position: input.len() - e.input.len(),
            });
        }
        Err(nom::Err::Incomplete(_)) => {
            return Err(ParseError {
                message: "Unexpected end of input".to_string(),
                position: input.len(),
            });
        }
    };

    if expr.depth() > MAX_DEPTH {
        return Err(ParseError {
            message: format!("Expression deeper than {} levels", MAX_DEPTH),
            position: 0,
        });
    }

    Ok(expr)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number() {
        assert_eq!(parse("123"), Ok(Expr::Number(123.0)));
        assert_eq!(parse("3.14"), Ok(Expr::Number(3.14)));
        assert_eq!(parse(".5"), Ok(Expr::Number(0.5)));
        assert_eq!(parse("1e10"), Ok(Expr::Number(1e10)));
        assert_eq!(parse("1.5e-3"), Ok(Expr::Number(1.5e-3)));
        assert_eq!(parse("-5"), Ok(Expr::unary(UnaryOp::Neg, Expr::Number(5.0))));
    }

    #[test]
    fn test_cell_reference() {
        assert_eq!(parse("A1"), Ok(Expr::cell_ref(0, 0)));
        assert_eq!(parse("B2"), Ok(Expr::cell_ref(1, 1)));
        assert_eq!(parse("AA10"), Ok(Expr::cell_ref(9, 26)));
    }

    #[test]
    fn test_out_of_bounds_reference() {
        assert_eq!(parse("ZZZZ1"), Ok(Expr::InvalidRef("ZZZZ1".to_string())));
        assert_eq!(parse("A0"), Ok(Expr::InvalidRef("A0".to_string())));
        assert_eq!(parse("A99999"), Ok(Expr::InvalidRef("A99999".to_string())));
    }

    #[test]
    fn test_arithmetic_precedence() {
        // 1 + 2 * 3 = 1 + (2 * 3)
        assert_eq!(
            parse("1 + 2 * 3"),
            Ok(Expr::binary(
                Expr::Number(1.0),
                BinaryOp::Add,
                Expr::binary(Expr::Number(2.0), BinaryOp::Mul, Expr::Number(3.0)),
            ))
        );
    }

    #[test]
    fn test_left_associative() {
        // 8 - 2 - 1 = (8 - 2) - 1
        assert_eq!(
            parse("8-2-1"),
            Ok(Expr::binary(
                Expr::binary(Expr::Number(8.0), BinaryOp::Sub, Expr::Number(2.0)),
                BinaryOp::Sub,
                Expr::Number(1.0),
            ))
        );
    }

    #[test]
    fn test_parentheses() {
        assert_eq!(
            parse(" ( 1 + 2 ) * 3 "),
            Ok(Expr::binary(
                Expr::binary(Expr::Number(1.0), BinaryOp::Add, Expr::Number(2.0)),
                BinaryOp::Mul,
                Expr::Number(3.0),
            ))
        );
    }

    #[test]
    fn test_nested_unary() {
        assert_eq!(
            parse("-+A1"),
            Ok(Expr::unary(
                UnaryOp::Neg,
                Expr::unary(UnaryOp::Pos, Expr::cell_ref(0, 0))
            ))
        );
    }

    #[test]
    fn test_rejects_bad_input() {
        for input in ["", "   ", "1+", "(1", "1)", "a1", "A", "1 2", "SUM(A1)", "1++", "$A$1", "A1:B2"] {
            assert!(parse(input).is_err(), "expected error for {:?}", input);
        }
    }

    #[test]
    fn test_nesting_limit() {
        let parens = format!("{}1{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert_eq!(parse(&parens), Ok(Expr::Number(1.0)));

        let signs = format!("{}1", "-".repeat(MAX_NESTING));
        assert!(parse(&signs).is_ok());

        for input in [
            format!("{}1", "-".repeat(MAX_NESTING + 1)),
            format!("{}1{}", "(".repeat(1_000), ")".repeat(1_000)),
            format!("{}1", "-+".repeat(2_000)),
        ] {
            let err = parse(&input).unwrap_err();
            assert!(err.message.starts_with("Nesting deeper"), "{}", err);
        }
    }

    #[test]
    fn test_long_operator_chain() {
        let sum = vec!["A1"; 300].join("+");
        assert!(parse(&sum).is_ok());

        let sum = vec!["A1"; MAX_DEPTH + 2].join("+");
        let err = parse(&sum).unwrap_err();
        assert!(err.message.starts_with("Expression deeper"), "{}", err);
    }

    #[test]
    fn test_length_limit() {
        let err = parse(&format!("{}1", "-".repeat(10_000))).unwrap_err();
        assert_eq!(err.position, MAX_FORMULA_LENGTH);

        let err = parse(&vec!["1"; 5_000].join("+")).unwrap_err();
        assert_eq!(err.position, MAX_FORMULA_LENGTH);
    }

    #[test]
    fn test_error_position() {
        let err = parse("1 + 2 )").unwrap_err();
        assert_eq!(err.position, 6);
        assert!(err.to_string().starts_with("Parse error at position 6"));
    }
}
