use thiserror::Error;

use tabula_core::PositionParseError;
use tabula_sheet::SheetError;

/// Shell error type
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Missing argument for {command}: expected {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },

    #[error("Unexpected argument for {command}: {argument}")]
    UnexpectedArgument {
        command: &'static str,
        argument: String,
    },

    #[error(transparent)]
    Position(#[from] PositionParseError),

    #[error(transparent)]
    Sheet(#[from] SheetError),

    #[error("Serialization error: {0}")]
    Serialization(serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the underlying writer stay I/O errors
impl From<serde_json::Error> for CommandError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            CommandError::Io(e.into())
        } else {
            CommandError::Serialization(e)
        }
    }
}
