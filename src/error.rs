//! Error types for dicom-codec-eval operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for dicom-codec-eval operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during an evaluation run.
///
/// Every variant is fatal to the batch that raised it: nothing is retried and
/// rows collected before the failure are discarded.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An input image directory does not exist or is not a directory.
    #[error("Image source not found: {}", path.display())]
    SourceNotFound {
        /// The missing directory.
        path: PathBuf,
    },

    /// A file could not be parsed as a DICOM image or its pixel data could
    /// not be decoded.
    #[error("Decode failed: {}: {reason}", path.display())]
    Decode {
        /// Path to the file that failed to decode.
        path: PathBuf,
        /// Reason reported by the decoder.
        reason: String,
    },

    /// The pixel data type has no entry in the data-range table.
    #[error("Unsupported pixel data type: {0}")]
    UnsupportedDataType(String),

    /// Reference and reconstructed pixel arrays differ in shape.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Shape of the reference image.
        expected: Vec<usize>,
        /// Shape of the reconstructed image.
        actual: Vec<usize>,
    },

    /// Writing a reconstructed image (or its directory) failed.
    #[error("Persist failed: {}: {reason}", path.display())]
    Persist {
        /// Destination that could not be written.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// The summarizer received no rows.
    #[error("No metric rows were collected")]
    EmptyInput,

    /// A caller-supplied compression or decompression step failed.
    #[error("Compression step failed: {0}")]
    Compression(String),

    /// Failed to calculate a quality metric.
    #[error("Metric calculation failed: {metric}: {reason}")]
    MetricCalculation {
        /// Name of the metric that failed.
        metric: String,
        /// Reason for the failure.
        reason: String,
    },

    /// Invalid evaluation configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// I/O error wrapper.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
