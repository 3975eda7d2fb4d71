pub mod error;
pub mod lookup;
pub mod position;
pub mod value;

pub use error::{FormulaError, PositionParseError};
pub use lookup::CellLookup;
pub use position::{
    col_from_label, col_to_label, Position, Size, MAX_COLS, MAX_POSITION_LENGTH,
    MAX_POS_LETTER_COUNT, MAX_ROWS,
};
pub use value::{format_number, parse_number_text, CellValue};
