//! Quality metrics for comparing a reference image with its reconstruction.
//!
//! - **SSIM**: Gaussian-window structural similarity ([`ssim`]), 1 = identical
//! - **FSIM**: feature similarity ([`fsim`]), 1 = identical, rounded to 4 digits
//!
//! ## Data range
//!
//! SSIM needs the numeric span of the pixel format. It is taken from the
//! *reference* image's pixel type via [`crate::decode::DATA_RANGES`]:
//!
//! | Pixel type | Data range |
//! |------------|------------|
//! | uint8 | 255 |
//! | uint16 | 65535 |
//! | uint32 | 2^32 - 1 |
//! | int8 | 128 |
//! | int16 | -32768 |
//! | int32 | 2^31 |
//! | float | 1 |

pub mod fsim;
pub mod ssim;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::decode::PixelImage;
use crate::error::{Error, Result};
use fsim::{ConstantFeatureSimilarity, FeatureSimilarity};

/// Scores for one reference/reconstruction pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityScores {
    /// Mean structural similarity over all planes.
    pub ssim: f64,
    /// Feature similarity, rounded to 4 decimals.
    pub fsim: f64,
}

/// Computes SSIM and FSIM between a reference and a reconstructed image.
pub struct QualityAssessor {
    data_range: Option<f64>,
    fsim: Box<dyn FeatureSimilarity>,
}

impl Default for QualityAssessor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for QualityAssessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QualityAssessor")
            .field("data_range", &self.data_range)
            .field("fsim", &self.fsim.name())
            .finish()
    }
}

impl QualityAssessor {
    /// Assessor with table-driven data range and the constant FSIM backend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data_range: None,
            fsim: Box::new(ConstantFeatureSimilarity::default()),
        }
    }

    /// Use a fixed data range instead of the pixel-type table.
    #[must_use]
    pub fn with_data_range(mut self, data_range: f64) -> Self {
        self.data_range = Some(data_range);
        self
    }

    /// Use a different FSIM backend.
    #[must_use]
    pub fn with_feature_similarity(mut self, backend: Box<dyn FeatureSimilarity>) -> Self {
        self.fsim = backend;
        self
    }

    /// Data range used for `reference`.
    pub fn data_range_for(&self, reference: &PixelImage) -> Result<f64> {
        match self.data_range {
            Some(range) => Ok(range),
            None => reference.pixel_type().data_range(),
        }
    }

    /// Score `reconstructed` against `reference`.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedDataType`] if the reference pixel type has no
    ///   data range and no override is set.
    /// - [`Error::ShapeMismatch`] if the images differ in shape.
    /// - [`Error::MetricCalculation`] if a plane is smaller than the SSIM
    ///   window or the FSIM backend fails.
    pub fn assess(&self, reference: &PixelImage, reconstructed: &PixelImage) -> Result<QualityScores> {
        let data_range = self.data_range_for(reference)?;

        if reference.shape() != reconstructed.shape() {
            return Err(Error::ShapeMismatch {
                expected: reference.shape().to_vec(),
                actual: reconstructed.shape().to_vec(),
            });
        }

        let ref_planes = reference.planes();
        let rec_planes = reconstructed.planes();
        let mut ssim_total = 0.0;
        for (r, t) in ref_planes.iter().zip(&rec_planes) {
            ssim_total += ssim::structural_similarity(r.view(), t.view(), data_range)?;
        }
        let ssim = ssim_total / ref_planes.len().max(1) as f64;

        let fsim = fsim::feature_similarity(self.fsim.as_ref(), reference, reconstructed)?;

        Ok(QualityScores { ssim, fsim })
    }

    /// Decode both files from disk and score them.
    pub fn assess_files(&self, reference: &Path, reconstructed: &Path) -> Result<QualityScores> {
        let reference = PixelImage::from_file(reference)?;
        let reconstructed = PixelImage::from_file(reconstructed)?;
        self.assess(&reference, &reconstructed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::PixelType;
    use crate::test_support;
    use ndarray::Array4;
    use tempfile::TempDir;

    fn image(pixel_type: PixelType, rows: usize, cols: usize, offset: f64) -> PixelImage {
        let data = Array4::from_shape_fn((1, rows, cols, 1), |(_, r, c, _)| {
            ((r * 5 + c * 3 + (r * c) % 7) % 200) as f64 + offset
        });
        PixelImage::new("mem.dcm", pixel_type, data)
    }

    #[test]
    fn test_identity_scores_one() {
        let assessor = QualityAssessor::new();
        let a = image(PixelType::U8, 16, 16, 0.0);
        let scores = assessor.assess(&a, &a.clone()).unwrap();
        assert!((scores.ssim - 1.0).abs() < 1e-12);
        assert_eq!(scores.fsim, 1.0);
    }

    #[test]
    fn test_data_range_follows_reference() {
        let assessor = QualityAssessor::new();
        assert_eq!(assessor.data_range_for(&image(PixelType::U16, 2, 2, 0.0)).unwrap(), 65535.0);
        assert_eq!(assessor.data_range_for(&image(PixelType::I16, 2, 2, 0.0)).unwrap(), -32768.0);

        let fixed = QualityAssessor::new().with_data_range(255.0);
        assert_eq!(fixed.data_range_for(&image(PixelType::U16, 2, 2, 0.0)).unwrap(), 255.0);
    }

    #[test]
    fn test_unsupported_reference_type() {
        let assessor = QualityAssessor::new();
        let a = image(PixelType::U64, 16, 16, 0.0);
        let b = image(PixelType::U8, 16, 16, 0.0);
        assert!(matches!(assessor.assess(&a, &b), Err(Error::UnsupportedDataType(_))));
    }

    #[test]
    fn test_shape_mismatch() {
        let assessor = QualityAssessor::new();
        let a = image(PixelType::U8, 16, 16, 0.0);
        let b = image(PixelType::U8, 12, 16, 0.0);
        assert!(matches!(assessor.assess(&a, &b), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_wider_range_is_more_forgiving() {
        let a = image(PixelType::U8, 16, 16, 0.0);
        let b = image(PixelType::U8, 16, 16, 3.0);
        let narrow = QualityAssessor::new().assess(&a, &b).unwrap();
        let wide = QualityAssessor::new().with_data_range(65535.0).assess(&a, &b).unwrap();
        assert!(narrow.ssim < 1.0);
        assert!(wide.ssim > narrow.ssim);
    }

    #[test]
    fn test_assess_files_identity() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.dcm");
        let b = dir.path().join("b.dcm");
        let pixels: Vec<u16> = (0..16 * 16).map(|i| (i * 97 % 4096) as u16).collect();
        test_support::write_mono16(&a, 16, 16, &pixels);
        test_support::write_mono16(&b, 16, 16, &pixels);

        let scores = QualityAssessor::new().assess_files(&a, &b).unwrap();
        assert!((scores.ssim - 1.0).abs() < 1e-12);
        assert_eq!(scores.fsim, 1.0);
    }
}
