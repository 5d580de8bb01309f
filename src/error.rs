use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkatError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Data inconsistency: {0}")]
    DataInconsistency(String),

    #[error("No data: {0}")]
    NoData(String),

    #[error("Out of range: {0}")]
    Overflow(String),

    #[error("Failed to replace {path}: {source}")]
    Persist {
        path: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Excel error: {0}")]
    Excel(#[from] rust_xlsxwriter::XlsxError),
}

impl SkatError {
    /// Whether the caller can recover by asking for another key
    pub fn is_not_found(&self) -> bool {
        matches!(self, SkatError::NotFound(_))
    }

    pub(crate) fn overflow(what: &str) -> Self {
        SkatError::Overflow(format!("{} does not fit into the score range", what))
    }
}

pub type Result<T> = std::result::Result<T, SkatError>;
