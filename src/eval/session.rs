//! Evaluation session with a callback-based compression interface.
//!
//! This module provides [`EvalSession`], the main entry point for compression
//! evaluation. The caller provides a compression callback (and optionally a
//! decompression callback); the session walks the image sets, runs the
//! harness, scores every reconstruction and summarises the run.

use std::fs;
use std::path::PathBuf;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::decode::PixelImage;
use crate::error::{Error, Result};
use crate::eval::harness::{CompressionHarness, OutputNaming, TransformFn};
use crate::eval::report::{MetricRow, MetricTable, compression_ratio};
use crate::metrics::QualityAssessor;
use crate::metrics::fsim::FeatureSimilarity;
use crate::source::{DicomImage, ImageSet};
use crate::stats::SummaryTable;

/// File name of the per-image metric table written after a run.
pub const METRICS_CSV: &str = "metrics.csv";
/// File name of the CSV summary written after a run.
pub const SUMMARY_CSV: &str = "summary.csv";
/// File name of the JSON summary written after a run.
pub const SUMMARY_JSON: &str = "summary.json";

/// Configuration for an evaluation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Input directories, processed in this order.
    pub image_sets: Vec<PathBuf>,

    /// Root directory for reconstructed files and reports.
    pub out_dir: PathBuf,

    /// Naming scheme for reconstructed files.
    pub naming: OutputNaming,

    /// Fixed SSIM data range; `None` uses the pixel-type table.
    pub data_range: Option<f64>,

    /// Write metric and summary reports into `out_dir` after a run.
    pub write_reports: bool,
}

impl EvalConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> EvalConfigBuilder {
        EvalConfigBuilder::default()
    }

    /// Image sets in processing order.
    #[must_use]
    pub fn sets(&self) -> Vec<ImageSet> {
        self.image_sets
            .iter()
            .enumerate()
            .map(|(index, path)| ImageSet::new(index, path))
            .collect()
    }
}

/// Builder for [`EvalConfig`].
#[derive(Debug, Default)]
pub struct EvalConfigBuilder {
    image_sets: Vec<PathBuf>,
    out_dir: Option<PathBuf>,
    naming: Option<OutputNaming>,
    data_range: Option<f64>,
    write_reports: Option<bool>,
}

impl EvalConfigBuilder {
    /// Set the input directories.
    #[must_use]
    pub fn image_sets(mut self, sets: Vec<PathBuf>) -> Self {
        self.image_sets = sets;
        self
    }

    /// Append one input directory.
    #[must_use]
    pub fn image_set(mut self, path: impl Into<PathBuf>) -> Self {
        self.image_sets.push(path.into());
        self
    }

    /// Set the output root.
    #[must_use]
    pub fn out_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.out_dir = Some(path.into());
        self
    }

    /// Set the output naming scheme.
    #[must_use]
    pub fn naming(mut self, naming: OutputNaming) -> Self {
        self.naming = Some(naming);
        self
    }

    /// Override the SSIM data range.
    #[must_use]
    pub fn data_range(mut self, data_range: Option<f64>) -> Self {
        self.data_range = data_range;
        self
    }

    /// Enable or disable report files (enabled by default).
    #[must_use]
    pub fn write_reports(mut self, enabled: bool) -> Self {
        self.write_reports = Some(enabled);
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `out_dir` is not set or the data range
    /// override is zero or not finite.
    pub fn build(self) -> Result<EvalConfig> {
        let out_dir = self
            .out_dir
            .ok_or_else(|| Error::Config("out_dir is required".to_string()))?;

        if let Some(range) = self.data_range
            && (!range.is_finite() || range == 0.0)
        {
            return Err(Error::Config(format!("invalid data range {range}")));
        }

        Ok(EvalConfig {
            image_sets: self.image_sets,
            out_dir,
            naming: self.naming.unwrap_or_default(),
            data_range: self.data_range,
            write_reports: self.write_reports.unwrap_or(true),
        })
    }
}

/// Evaluation session for one compression strategy.
///
/// # Example
///
/// ```rust,ignore
/// use dicom_codec_eval::{EvalConfig, EvalSession};
///
/// let config = EvalConfig::builder()
///     .image_set("./CT-1")
///     .out_dir("./compressed")
///     .build()?;
///
/// let session = EvalSession::new(config, Box::new(|object| {
///     // Compress the object in place
///     Ok(())
/// }));
///
/// let summary = session.evaluate()?;
/// ```
pub struct EvalSession {
    config: EvalConfig,
    harness: CompressionHarness,
    assessor: QualityAssessor,
}

impl std::fmt::Debug for EvalSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvalSession")
            .field("config", &self.config)
            .field("harness", &self.harness)
            .field("assessor", &self.assessor)
            .finish()
    }
}

impl EvalSession {
    /// Create a new evaluation session.
    #[must_use]
    pub fn new(config: EvalConfig, compress: TransformFn) -> Self {
        let harness = CompressionHarness::new(compress).with_naming(config.naming);
        let assessor = match config.data_range {
            Some(range) => QualityAssessor::new().with_data_range(range),
            None => QualityAssessor::new(),
        };
        Self {
            config,
            harness,
            assessor,
        }
    }

    /// Run `decompress` after each compression, before the file is written.
    #[must_use]
    pub fn with_decompression(mut self, decompress: TransformFn) -> Self {
        self.harness = self.harness.with_decompression(decompress);
        self
    }

    /// Use a different FSIM backend.
    #[must_use]
    pub fn with_feature_similarity(mut self, backend: Box<dyn FeatureSimilarity>) -> Self {
        self.assessor = self.assessor.with_feature_similarity(backend);
        self
    }

    /// The session configuration.
    #[must_use]
    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Compress, persist, re-read and score one image.
    ///
    /// The reference pixels are decoded before the compression callback
    /// runs; the reconstruction is decoded from the persisted file.
    pub fn evaluate_image(&self, set_index: usize, mut image: DicomImage) -> Result<MetricRow> {
        let reference = image.decode()?;

        let output = self.harness.apply(&mut image, set_index, &self.config.out_dir)?;

        let reconstructed = PixelImage::from_file(&output.persisted_path)?;
        let scores = self.assessor.assess(&reference, &reconstructed)?;
        let ratio = compression_ratio(image.path(), &output.persisted_path)?;

        let row = MetricRow {
            set_index,
            source: image.path().to_path_buf(),
            output: output.persisted_path,
            time: output.elapsed.as_secs_f64(),
            compression_ratio: ratio,
            ssim: scores.ssim,
            fsim: scores.fsim,
        };

        debug!(
            "{}: {:.3} ms, ratio {:.3}, ssim {:.6}, fsim {:.4} -> {}",
            image.file_name(),
            row.time * 1000.0,
            row.compression_ratio,
            row.ssim,
            row.fsim,
            row.output.display()
        );

        Ok(row)
    }

    /// Evaluate every image of every set, in order.
    ///
    /// All input directories are checked before anything is written, so a
    /// missing directory leaves the output root untouched.
    pub fn collect_metrics(&self) -> Result<MetricTable> {
        let sets = self.config.sets();
        for set in &sets {
            set.ensure_exists()?;
        }

        let mut table = MetricTable::new();
        for set in &sets {
            info!("Evaluating image set {} ({})", set.index(), set.path().display());

            let images = set.read_images()?;
            if images.is_empty() {
                warn!("Image set {} has no DICOM files", set.path().display());
                continue;
            }

            let count = images.len();
            for image in images.into_values() {
                table.push(self.evaluate_image(set.index(), image)?);
            }

            info!("Image set {} done: {count} images", set.index());
        }

        Ok(table)
    }

    /// Evaluate all sets and summarise, writing reports when configured.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyInput`] if no image was found in any set, and
    /// the first error raised while processing an image otherwise.
    pub fn run(&self) -> Result<(MetricTable, SummaryTable)> {
        let table = self.collect_metrics()?;
        let summary = table.summarize()?;

        if self.config.write_reports {
            self.write_reports(&table, &summary)?;
        }

        info!(
            "Evaluated {} images across {} sets",
            table.len(),
            self.config.image_sets.len()
        );

        Ok((table, summary))
    }

    /// Evaluate all sets and return the summary table.
    pub fn evaluate(&self) -> Result<SummaryTable> {
        self.run().map(|(_, summary)| summary)
    }

    /// Write the metric table and summary into the output root.
    pub fn write_reports(&self, table: &MetricTable, summary: &SummaryTable) -> Result<()> {
        let dir = &self.config.out_dir;
        fs::create_dir_all(dir)?;

        table.write_csv(&dir.join(METRICS_CSV))?;
        summary.write_csv(&dir.join(SUMMARY_CSV))?;
        summary.write_json(&dir.join(SUMMARY_JSON))?;

        Ok(())
    }
}
