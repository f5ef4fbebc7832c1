//! Error types for the statistics core.
//!
//! Every failure in this crate is a data-quality or data-sufficiency condition:
//! the caller is expected to show the message and let the user adjust inputs.
//! Analyzers detect these conditions before computing, so NaN or infinite
//! values never leak into results.
//!
//! Errors are serializable as `{ code, message }` so a UI layer can hand them
//! straight to its frontend.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

use crate::config::ConfigValidationError;

/// The main error type for the statistics core.
#[derive(Error, Debug)]
pub enum StatsError {
    /// Column was not found in the dataset or schema.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Ingestion left no usable rows.
    #[error("No valid records after cleaning ({dropped_count} rows dropped): {reason}")]
    EmptyDataset { dropped_count: usize, reason: String },

    /// A column has no non-missing values.
    #[error("No valid values found in column '{0}'")]
    EmptyColumn(String),

    /// Too few observations remain for the requested procedure.
    #[error("Insufficient data for {context}: need at least {required}, found {found}")]
    InsufficientData {
        context: String,
        required: usize,
        found: usize,
    },

    /// A statistical precondition on spread was violated (zero variance).
    #[error("Not computable, zero variance: {0}")]
    DegenerateVariance(String),

    /// A filter matched no records.
    #[error("No data: {0}")]
    NoData(String),

    /// A caller-supplied parameter is out of range or malformed.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Invalid analysis configuration.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigValidationError),

    /// A probability distribution could not be constructed.
    #[error("Distribution error: {0}")]
    Distribution(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<StatsError>,
    },
}

impl StatsError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        StatsError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Shorthand for [`StatsError::InsufficientData`].
    pub fn insufficient(context: impl Into<String>, required: usize, found: usize) -> Self {
        StatsError::InsufficientData {
            context: context.into(),
            required,
            found,
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::EmptyDataset { .. } => "EMPTY_DATASET",
            Self::EmptyColumn(_) => "EMPTY_COLUMN",
            Self::InsufficientData { .. } => "INSUFFICIENT_DATA",
            Self::DegenerateVariance(_) => "DEGENERATE_VARIANCE",
            Self::NoData(_) => "NO_DATA",
            Self::InvalidParameter(_) => "INVALID_PARAMETER",
            Self::Config(_) => "INVALID_CONFIG",
            Self::Distribution(_) => "DISTRIBUTION_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error is recoverable by adjusting inputs and retrying.
    ///
    /// Data-quality and data-sufficiency conditions are always recoverable;
    /// IO and polars failures depend on the caller's file and are not.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) | Self::Polars(_) | Self::Distribution(_) => false,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => true,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for StatsError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("StatsError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for statistics operations.
pub type Result<T> = std::result::Result<T, StatsError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| StatsError::Polars(e).with_context(context))
    }
}
