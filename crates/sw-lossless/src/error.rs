//! Errors raised by the disk-backed pipe, hand-written in the
//! journal/uplink style used by the lower half of this workspace.

use std::fmt;
use std::io;

#[derive(Debug)]
pub enum LosslessError {
    Io(io::Error),
    /// `history.txt` exists but could not be parsed.
    CorruptHistory(String),
    /// A data file's line didn't match the `^,<index>,<payload>` grammar.
    CorruptLine { file: String, line: usize },
}

impl fmt::Display for LosslessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LosslessError::Io(e) => write!(f, "i/o error: {e}"),
            LosslessError::CorruptHistory(detail) => write!(f, "corrupt history.txt: {detail}"),
            LosslessError::CorruptLine { file, line } => {
                write!(f, "corrupt data line in {file} at line {line}")
            }
        }
    }
}

impl std::error::Error for LosslessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LosslessError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for LosslessError {
    fn from(e: io::Error) -> Self {
        LosslessError::Io(e)
    }
}
