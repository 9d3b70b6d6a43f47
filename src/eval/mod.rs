//! Compression harness, evaluation session and metric tables.
//!
//! - [`harness::CompressionHarness`]: runs the compression callback on one
//!   image, times it and persists the result
//! - [`session::EvalSession`]: walks the image sets and scores every image
//! - [`session::EvalConfig`]: configuration for a run
//! - [`report`]: per-image metric rows and their CSV form

pub mod harness;
pub mod report;
pub mod session;

pub use harness::{CompressionHarness, OutputNaming, TransformFn};
pub use report::{MetricColumn, MetricRow, MetricTable};
pub use session::{EvalConfig, EvalSession};
