use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PositionParseError;

/// Maximum number of rows addressable in a sheet
pub const MAX_ROWS: i32 = 16_384;
/// Maximum number of columns addressable in a sheet (column XFD)
pub const MAX_COLS: i32 = 16_384;
/// Longest A1 label accepted by the decoder
pub const MAX_POSITION_LENGTH: usize = 17;
/// Most column letters an A1 label may carry
pub const MAX_POS_LETTER_COUNT: usize = 3;

const LETTERS: i32 = 26;

/// Cell coordinate (0-indexed internally)
///
/// Ordered by `(row, col)`, so sorted collections of positions iterate row-major.
#[derive(
    Debug, Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(into = "String", try_from = "String")]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    /// The "no position" sentinel, also returned by [`Position::from_a1`] on failure
    pub const NONE: Position = Position { row: -1, col: -1 };

    pub const fn new(row: i32, col: i32) -> Self {
        Position { row, col }
    }

    /// Check if this position lies inside the fixed sheet bounds
    pub fn is_valid(&self) -> bool {
        self.row >= 0 && self.row < MAX_ROWS && self.col >= 0 && self.col < MAX_COLS
    }

    /// Decode an A1 label, returning [`Position::NONE`] if it is malformed or out of bounds
    pub fn from_a1(label: &str) -> Self {
        Self::parse(label).unwrap_or(Position::NONE)
    }

    /// Decode an A1 label (e.g., "A1" -> (0, 0), "B2" -> (1, 1))
    ///
    /// Only uppercase letters are accepted and the row may not have a leading zero.
    pub fn parse(label: &str) -> Option<Self> {
        if label.is_empty() || label.len() > MAX_POSITION_LENGTH {
            return None;
        }

        let bytes = label.as_bytes();
        let mut letters = 0;
        while letters < bytes.len() && bytes[letters].is_ascii_alphabetic() {
            if !bytes[letters].is_ascii_uppercase() || letters >= MAX_POS_LETTER_COUNT {
                return None;
            }
            letters += 1;
        }

        if letters == 0 || letters == bytes.len() {
            return None;
        }

        let (col_str, row_str) = label.split_at(letters);
        if row_str.starts_with('0') || !row_str.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        // At most 16 digits survive the length check, so this cannot overflow
        let row: i64 = row_str.parse().ok()?;
        let row = row - 1;
        if row < 0 || row >= MAX_ROWS as i64 {
            return None;
        }

        let col = col_from_label(col_str)?;
        if col >= MAX_COLS {
            return None;
        }

        Some(Position::new(row as i32, col))
    }

    /// Encode to A1 notation (e.g., (0, 0) -> "A1"); invalid positions encode as ""
    pub fn to_a1(&self) -> String {
        if !self.is_valid() {
            return String::new();
        }
        format!("{}{}", col_to_label(self.col), self.row + 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1())
    }
}

impl FromStr for Position {
    type Err = PositionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::parse(s).ok_or_else(|| PositionParseError::new(s))
    }
}

impl From<Position> for String {
    fn from(pos: Position) -> Self {
        pos.to_a1()
    }
}

impl TryFrom<String> for Position {
    type Error = PositionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Convert column index (0-indexed) to label (A, B, ..., Z, AA, AB, ...)
pub fn col_to_label(col: i32) -> String {
    let mut label = String::new();
    let mut n = col;

    while n >= 0 {
        label.insert(0, char::from(b'A' + (n % LETTERS) as u8));
        n = n / LETTERS - 1;
    }

    label
}

/// Convert column label (A, B, ..., Z, AA, AB, ...) to index (0-indexed)
///
/// Accepts uppercase letters only; labels longer than three letters are rejected.
pub fn col_from_label(label: &str) -> Option<i32> {
    if label.is_empty() || label.len() > MAX_POS_LETTER_COUNT {
        return None;
    }

    let mut col: i32 = 0;
    for c in label.bytes() {
        if !c.is_ascii_uppercase() {
            return None;
        }
        col = col * LETTERS + (c - b'A') as i32 + 1;
    }

    Some(col - 1)
}

/// Printable bounding box of a sheet: one past the maximum occupied row and column
#[derive(Debug, Clone, Copy, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub rows: i32,
    pub cols: i32,
}

impl Size {
    pub const fn new(rows: i32, cols: i32) -> Self {
        Size { rows, cols }
    }

    /// Smallest size covering both `self` and `pos`
    pub fn covering(self, pos: Position) -> Self {
        Size {
            rows: self.rows.max(pos.row + 1),
            cols: self.cols.max(pos.col + 1),
        }
    }

    /// Check if `pos` sits on the last row or last column of this box
    pub fn is_on_boundary(&self, pos: Position) -> bool {
        pos.row + 1 == self.rows || pos.col + 1 == self.cols
    }
}
