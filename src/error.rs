use thiserror::Error;

/// Error types for the cvfit-rs library.
#[derive(Error, Debug)]
pub enum CvFitError {
    /// Peak detection found no qualifying peak of a required polarity.
    #[error("No peak found: {0}")]
    NoPeak(String),

    /// A requested window needs more samples than are available.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// The nonlinear solve failed to converge or violated its bounds.
    #[error("Fitting failed: {0}")]
    Fitting(String),

    /// R² cannot be computed because the observed data has zero variance.
    #[error("Fit quality undefined: observed data has zero variance ({0} samples)")]
    UndefinedFitQuality(usize),

    /// A manual time range is empty, negative or inverted.
    #[error("Invalid range: {start} - {end} s ({reason})")]
    InvalidRange {
        start: f64,
        end: f64,
        reason: &'static str,
    },

    /// The time series violates a structural invariant.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Error indicating a mismatch in array dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error for boundary constraint violations.
    #[error("Bounds error: {0}")]
    Bounds(String),

    /// Error while reading a data file.
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<crate::bounds::BoundsError> for CvFitError {
    fn from(err: crate::bounds::BoundsError) -> Self {
        CvFitError::Bounds(err.to_string())
    }
}

/// Result type alias for cvfit-rs operations.
pub type Result<T> = std::result::Result<T, CvFitError>;
