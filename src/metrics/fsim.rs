//! Feature similarity (FSIM) input preparation and backends.
//!
//! FSIM is scored on an 8-bit, 3-channel rendition of each image: the plane
//! is min-max normalised to `0..=255`, the grey value is replicated across
//! R, G and B, and the result is handed to a [`FeatureSimilarity`] backend as
//! a `(3, rows, columns)` tensor with values in `[0, 1]`. Backends compute
//! the luminance-only index (chromatic weighting disabled).
//!
//! The phase-congruency computation itself belongs to the backend. The
//! bundled [`ConstantFeatureSimilarity`] reports a fixed score and is the
//! default; plug a real backend in through [`QualityAssessor`].
//!
//! [`QualityAssessor`]: crate::metrics::QualityAssessor

use imgref::ImgVec;
use ndarray::{Array3, ArrayView2};
use rgb::RGB8;

use crate::decode::PixelImage;
use crate::error::{Error, Result};

/// Decimal digits kept in reported FSIM values.
pub const FSIM_DECIMALS: i32 = 4;

/// A feature-similarity implementation.
pub trait FeatureSimilarity: Send + Sync {
    /// Backend name for logs and error messages.
    fn name(&self) -> &str;

    /// Score two `(3, rows, columns)` tensors with values in `[0, 1]`.
    fn compute(&self, reference: &Array3<f32>, test: &Array3<f32>) -> Result<f64>;
}

/// Backend that reports the same score for every pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantFeatureSimilarity(pub f64);

impl Default for ConstantFeatureSimilarity {
    fn default() -> Self {
        Self(1.0)
    }
}

impl FeatureSimilarity for ConstantFeatureSimilarity {
    fn name(&self) -> &str {
        "constant"
    }

    fn compute(&self, reference: &Array3<f32>, test: &Array3<f32>) -> Result<f64> {
        if reference.dim() != test.dim() {
            return Err(Error::ShapeMismatch {
                expected: reference.shape().to_vec(),
                actual: test.shape().to_vec(),
            });
        }
        Ok(self.0)
    }
}

/// Score every plane pair with `backend` and return the mean, rounded to
/// [`FSIM_DECIMALS`] digits.
pub fn feature_similarity(
    backend: &dyn FeatureSimilarity,
    reference: &PixelImage,
    test: &PixelImage,
) -> Result<f64> {
    if reference.shape() != test.shape() {
        return Err(Error::ShapeMismatch {
            expected: reference.shape().to_vec(),
            actual: test.shape().to_vec(),
        });
    }

    let ref_planes = reference.planes();
    let test_planes = test.planes();
    if ref_planes.is_empty() {
        return Err(Error::MetricCalculation {
            metric: format!("FSIM ({})", backend.name()),
            reason: "image has no pixel planes".to_string(),
        });
    }

    let mut total = 0.0;
    for (r, t) in ref_planes.iter().zip(&test_planes) {
        let ref_tensor = rgb8_to_tensor(&plane_to_rgb8(r.view()));
        let test_tensor = rgb8_to_tensor(&plane_to_rgb8(t.view()));
        total += backend.compute(&ref_tensor, &test_tensor)?;
    }

    Ok(round_to(total / ref_planes.len() as f64, FSIM_DECIMALS))
}

/// Min-max normalise a plane to 8 bits and replicate it into RGB.
///
/// A flat plane maps to black.
#[must_use]
pub fn plane_to_rgb8(plane: ArrayView2<'_, f64>) -> ImgVec<RGB8> {
    let (rows, cols) = plane.dim();
    let (min, max) = plane
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = max - min;

    let pixels: Vec<RGB8> = plane
        .iter()
        .map(|&v| {
            let g = if span > 0.0 {
                ((v - min) / span * 255.0).round().clamp(0.0, 255.0) as u8
            } else {
                0
            };
            RGB8::new(g, g, g)
        })
        .collect();

    ImgVec::new(pixels, cols, rows)
}

/// Convert an RGB8 image to a `(3, rows, columns)` tensor in `[0, 1]`.
#[must_use]
pub fn rgb8_to_tensor(img: &ImgVec<RGB8>) -> Array3<f32> {
    let width = img.width();
    let pixels = img.buf();
    Array3::from_shape_fn((3, img.height(), width), |(ch, y, x)| {
        let p = pixels[y * img.stride() + x];
        let v = match ch {
            0 => p.r,
            1 => p.g,
            _ => p.b,
        };
        f32::from(v) / 255.0
    })
}

/// Round to `decimals` digits after the point.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10_f64.powi(decimals);
    (value * scale).round() / scale
}
