use thiserror::Error;

/// Error types for the clustering engine.
///
/// Every variant is raised before the first iteration starts. Empty clusters
/// and hitting the iteration cap are normal outcomes, not errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KMeansError {
    /// Malformed input: bad `k`, empty or ragged point set, non-finite
    /// coordinates, zero iteration cap, or mis-shaped initial centroids.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl KMeansError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        KMeansError::InvalidArgument(msg.into())
    }
}

/// Errors raised while loading a dataset from disk.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A requested column is absent from the header row
    #[error("Column '{0}' not found in dataset header")]
    MissingColumn(String),

    #[error("Row {row}, column '{column}': '{value}' is not a number")]
    NotNumeric {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Cannot shape dataset: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Dataset contains no rows")]
    Empty,
}
