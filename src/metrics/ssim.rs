//! Structural similarity (SSIM) with Gaussian-weighted local windows.
//!
//! Follows Wang et al. 2004 as used by scikit-image with
//! `gaussian_weights=True, sigma=1.5, use_sample_covariance=False`:
//!
//! - local statistics come from a separable Gaussian filter (sigma 1.5,
//!   truncated at 3.5 sigma, so an 11x11 window) with half-sample symmetric
//!   boundary handling
//! - variances and covariance use the population normalisation
//! - the mean SSIM is taken over the map with a half-window border cropped
//!
//! Inputs are raw sample values; `data_range` sets the stabilising constants
//! `C1 = (0.01 * L)^2` and `C2 = (0.03 * L)^2`.

use ndarray::{Array2, ArrayView2, s};
use rayon::prelude::*;

use crate::error::{Error, Result};

/// Gaussian window standard deviation.
pub const SIGMA: f64 = 1.5;

/// Kernel radius in units of sigma.
pub const TRUNCATE: f64 = 3.5;

const K1: f64 = 0.01;
const K2: f64 = 0.03;

/// Side length of the Gaussian window.
#[must_use]
pub fn window_size() -> usize {
    2 * kernel_radius() + 1
}

fn kernel_radius() -> usize {
    (TRUNCATE * SIGMA + 0.5) as usize
}

/// Normalised 1D Gaussian kernel of length [`window_size`].
#[must_use]
pub fn gaussian_kernel() -> Vec<f64> {
    let radius = kernel_radius() as isize;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|x| (-0.5 * (x * x) as f64 / (SIGMA * SIGMA)).exp())
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

/// Mean SSIM between two equally shaped planes.
///
/// # Errors
///
/// - [`Error::ShapeMismatch`] if the planes differ in shape.
/// - [`Error::MetricCalculation`] if a side is shorter than the window.
pub fn structural_similarity(
    reference: ArrayView2<'_, f64>,
    test: ArrayView2<'_, f64>,
    data_range: f64,
) -> Result<f64> {
    if reference.dim() != test.dim() {
        return Err(Error::ShapeMismatch {
            expected: reference.shape().to_vec(),
            actual: test.shape().to_vec(),
        });
    }

    let (rows, cols) = reference.dim();
    let win = window_size();
    if rows < win || cols < win {
        return Err(Error::MetricCalculation {
            metric: "SSIM".to_string(),
            reason: format!("{rows}x{cols} image is smaller than the {win}x{win} window"),
        });
    }

    let kernel = gaussian_kernel();
    let x = reference.to_owned();
    let y = test.to_owned();

    let ux = gaussian_filter(&x, &kernel);
    let uy = gaussian_filter(&y, &kernel);
    let uxx = gaussian_filter(&(&x * &x), &kernel);
    let uyy = gaussian_filter(&(&y * &y), &kernel);
    let uxy = gaussian_filter(&(&x * &y), &kernel);

    let c1 = (K1 * data_range).powi(2);
    let c2 = (K2 * data_range).powi(2);

    let mut map = Array2::<f64>::zeros((rows, cols));
    ndarray::Zip::from(&mut map)
        .and(&ux)
        .and(&uy)
        .and(&uxx)
        .and(&uyy)
        .and(&uxy)
        .for_each(|s, &mx, &my, &mxx, &myy, &mxy| {
            let vx = mxx - mx * mx;
            let vy = myy - my * my;
            let vxy = mxy - mx * my;
            let a = (2.0 * mx * my + c1) * (2.0 * vxy + c2);
            let b = (mx * mx + my * my + c1) * (vx + vy + c2);
            *s = a / b;
        });

    let pad = (win - 1) / 2;
    let cropped = map.slice(s![pad..rows - pad, pad..cols - pad]);
    Ok(cropped.mean().unwrap_or(f64::NAN))
}

/// Separable Gaussian filter, rows first, then columns.
fn gaussian_filter(input: &Array2<f64>, kernel: &[f64]) -> Array2<f64> {
    let (rows, cols) = input.dim();
    let radius = kernel.len() / 2;

    let mut horizontal = vec![0.0; rows * cols];
    horizontal
        .par_chunks_mut(cols)
        .enumerate()
        .for_each(|(r, out)| {
            let row = input.row(r);
            for (c, value) in out.iter_mut().enumerate() {
                *value = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, w)| w * row[reflect(c + k, radius, cols)])
                    .sum();
            }
        });

    let mut filtered = vec![0.0; rows * cols];
    filtered
        .par_chunks_mut(cols)
        .enumerate()
        .for_each(|(r, out)| {
            for (k, w) in kernel.iter().enumerate() {
                let src = reflect(r + k, radius, rows) * cols;
                for (value, h) in out.iter_mut().zip(&horizontal[src..src + cols]) {
                    *value += w * h;
                }
            }
        });

    Array2::from_shape_fn((rows, cols), |(r, c)| filtered[r * cols + c])
}

/// Map `shifted - radius` into `0..len` by half-sample symmetric reflection
/// (`d c b a | a b c d | d c b a`).
fn reflect(shifted: usize, radius: usize, len: usize) -> usize {
    let period = 2 * len as isize;
    let mut i = (shifted as isize - radius as isize).rem_euclid(period);
    if i >= len as isize {
        i = period - 1 - i;
    }
    i as usize
}
