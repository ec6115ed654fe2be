use std::path::PathBuf;
use thiserror::Error;

/// A column range the user typed that is not `N` or `N-M`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("invalid column range {0:?}: expected a column number like `3` or a span like `2-4`")]
    Invalid(String),
}

/// Why a single input file could not be read.
///
/// These never abort a batch: the counter turns them into the failure marker
/// and the splitter skips the file.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("unsupported file type: {}", .0.display())]
    Unsupported(PathBuf),

    #[error("cannot decode {} with any of: {}", .path.display(), .tried.join(", "))]
    Encoding { path: PathBuf, tried: Vec<&'static str> },

    /// `column` is 1-based, as the user typed it.
    #[error("column {column} is beyond the {width} column(s) present")]
    ColumnOutOfRange { column: usize, width: usize },

    #[error("csv parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
