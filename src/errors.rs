//! Error types for exchange-rate analysis

use thiserror::Error;

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur while loading, analysing or charting a table
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Column not found: {column}")]
    ColumnNotFound { column: String },

    #[error("Column '{column}' is not numeric")]
    NonNumericColumn { column: String },

    #[error("Column '{column}' contains {count} missing value(s)")]
    MissingValues { column: String, count: usize },

    #[error("Index value at row {row} is not a date/time: {value:?}")]
    InvalidIndex { row: usize, value: String },

    #[error("Insufficient data: {message}")]
    InsufficientData { message: String },

    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    #[error("Shape mismatch: {message}")]
    ShapeMismatch { message: String },

    #[error("Regression failed: {message}")]
    Regression { message: String },

    #[error("Chart rendering failed: {message}")]
    Rendering { message: String },

    #[error("CSV error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    #[error("File I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[cfg(feature = "dataframe")]
    #[error("DataFrame error: {source}")]
    DataFrame {
        #[from]
        source: polars::prelude::PolarsError,
    },
}

impl<T: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<T>>
    for AnalysisError
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<T>) -> Self {
        AnalysisError::Rendering {
            message: format!("Drawing area error: {}", err),
        }
    }
}

impl From<config::ConfigError> for AnalysisError {
    fn from(err: config::ConfigError) -> Self {
        AnalysisError::Config {
            message: err.to_string(),
        }
    }
}

impl AnalysisError {
    pub(crate) fn column_not_found(column: &str) -> Self {
        AnalysisError::ColumnNotFound {
            column: column.to_string(),
        }
    }

    pub(crate) fn insufficient(message: impl Into<String>) -> Self {
        AnalysisError::InsufficientData {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_parameter(message: impl Into<String>) -> Self {
        AnalysisError::InvalidParameter {
            message: message.into(),
        }
    }
}
