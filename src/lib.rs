//! # dicom-codec-eval
//!
//! Compression evaluation for medical DICOM images.
//!
//! The caller supplies a compression step (and optionally a decompression
//! step) as a callback over a decoded DICOM object. This library handles the
//! rest of the protocol: walking the input image sets, timing the
//! compression, persisting and re-reading the result, scoring SSIM and FSIM
//! against the original, computing on-disk compression ratios and reducing
//! everything to descriptive statistics.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dicom_codec_eval::{EvalConfig, EvalSession};
//!
//! let config = EvalConfig::builder()
//!     .image_sets(vec!["./CT-1".into(), "./CT-2".into()])
//!     .out_dir("./compressed")
//!     .build()?;
//!
//! let session = EvalSession::new(config, Box::new(|object| {
//!     // Compress `object` in place
//!     Ok(())
//! }));
//!
//! let summary = session.evaluate()?;
//! println!("{summary}");
//! ```
//!
//! ## Modules
//!
//! - [`error`]: Error types for the library
//! - [`decode`]: Pixel types, data ranges and pixel decoding
//! - [`source`]: Image sets and DICOM file loading
//! - [`metrics`]: Quality assessment (SSIM, FSIM)
//! - [`eval`]: Compression harness, evaluation session and metric tables
//! - [`stats`]: Descriptive statistics over metric tables

pub mod decode;
pub mod error;
pub mod eval;
pub mod metrics;
pub mod source;
pub mod stats;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use decode::{PixelImage, PixelType};
pub use error::{Error, Result};
pub use eval::{
    harness::{CompressionHarness, HarnessOutput, OutputNaming, TransformFn},
    report::{MetricColumn, MetricRow, MetricTable},
    session::{EvalConfig, EvalSession},
};
pub use metrics::{QualityAssessor, QualityScores};
pub use source::{DicomImage, ImageSet, Volume};
pub use stats::{Summary, SummaryTable};
