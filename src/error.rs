use std::path::PathBuf;

use thiserror::Error;

use crate::model::Path;

pub type Result<T> = std::result::Result<T, ToolError>;

/// Everything that can go wrong while walking, flattening, or persisting
/// records.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Raised when a leaf holds a value that has no textual form, such as a
    /// callable or a channel.
    #[error("unsupported value kind '{kind}' at '{path}'")]
    UnsupportedKind { path: Path, kind: String },

    /// Raised when a shape is requested from an empty collection that does
    /// not declare an element shape.
    #[error("cannot derive a shape from an empty collection at '{path}'")]
    EmptyCollection { path: Path },

    /// Raised when the top-level value is absent and absent branches are not
    /// excluded.
    #[error("cannot derive a shape from an absent value at '{path}'")]
    AbsentValue { path: Path },

    /// Raised when the top-level value is a scalar and therefore has no paths.
    #[error("top-level value is a scalar; expected a composite, mapping, or sequence")]
    LeafRoot,

    /// Raised when traversal nests deeper than the configured limit, which
    /// only happens for self-referential element shapes.
    #[error("nesting deeper than {limit} levels at '{path}'")]
    RecursionLimit { path: Path, limit: usize },

    /// Raised when a header row cannot be used to rebuild records.
    #[error("invalid header row: {0}")]
    InvalidHeader(String),

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON document or header list could not be parsed or written.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The workbook could not be written.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// The workbook could not be opened or decoded.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when a workbook does not contain the expected sheet.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// An input path given on the command line does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// The tracing subscriber could not be installed.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
