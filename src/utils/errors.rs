use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranslatorError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Spreadsheet read error: {0}")]
    XlsxReadError(#[from] calamine::Error),

    #[error("Spreadsheet write error: {0}")]
    XlsxWriteError(#[from] rust_xlsxwriter::XlsxError),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid column reference: {0:?} (expected a single letter A-Z)")]
    InvalidColumnReference(String),

    #[error("Column {column} is out of range for a table with {width} columns")]
    ColumnOutOfRange { column: String, width: usize },

    #[error("Source unreachable: {0}")]
    SourceUnreachable(String),

    #[error("Sink write failed: {0}")]
    SinkWriteFailure(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown {kind}: {value}")]
    UnknownOption { kind: &'static str, value: String },

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

pub type Result<T> = std::result::Result<T, TranslatorError>;

impl TranslatorError {
    /// Structural errors abort a batch before (or instead of) producing a table.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TranslatorError::SinkWriteFailure(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_errors_name_the_input() {
        let err = TranslatorError::InvalidColumnReference("AB".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid column reference: \"AB\" (expected a single letter A-Z)"
        );

        let err = TranslatorError::ColumnOutOfRange {
            column: "D".to_string(),
            width: 2,
        };
        assert_eq!(
            err.to_string(),
            "Column D is out of range for a table with 2 columns"
        );
    }

    #[test]
    fn sink_failures_are_not_fatal() {
        assert!(!TranslatorError::SinkWriteFailure("403".into()).is_fatal());
        assert!(TranslatorError::SourceUnreachable("private".into()).is_fatal());
    }
}
