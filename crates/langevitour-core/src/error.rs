//! Error types for render input and session state
//!
//! Nothing inside a simulation step returns an error. Anomalies during a
//! step are reported as [`crate::Advisory`] values instead; these errors
//! only occur at the data/state boundary.

use thiserror::Error;

/// Errors raised while loading data or applying session state
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TourError {
    /// Data matrix is empty or not rectangular
    #[error("malformed data matrix: {0}")]
    Shape(String),

    /// A tour needs at least two variables to project onto a plane
    #[error("the number of columns in data should be at least 2, got {0}")]
    TooFewColumns(usize),

    /// A per-row or per-column vector has the wrong length
    #[error("length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Group value not present in the supplied levels
    #[error("level '{0}' in group is not in the specified levels")]
    UnknownLevel(String),

    /// Group index outside 0..levels.len()
    #[error("group index {index} out of range for {levels} levels")]
    GroupOutOfRange { index: usize, levels: usize },

    /// Guide name not recognised
    #[error("unknown guide type: {0}")]
    UnknownGuide(String),

    /// Projection in a state snapshot is not 2 x m
    #[error("projection must be 2 x {expected}, got {rows} x {cols}")]
    ProjectionShape {
        expected: usize,
        rows: usize,
        cols: usize,
    },

    /// Label index outside the label list
    #[error("label {index} out of range for {count} labels")]
    LabelOutOfRange { index: usize, count: usize },

    /// No data has been rendered yet
    #[error("no data loaded")]
    NoData,

    /// JSON (de)serialization failure
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for TourError {
    fn from(e: serde_json::Error) -> Self {
        TourError::Serialization(e.to_string())
    }
}

/// Result type for data and state operations
pub type Result<T> = std::result::Result<T, TourError>;
