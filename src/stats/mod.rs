//! Descriptive statistics over metric tables.
//!
//! - [`Summary`]: count, mean, std, min, quartiles and max of one column
//! - [`SummaryTable`]: one [`Summary`] per [`MetricColumn`]
//! - [`mean`], [`std_dev`]: the underlying functions
//!
//! Conventions: standard deviation uses Bessel's correction (N-1) and is 0
//! for a single value; percentiles interpolate linearly between closest
//! ranks (R-7, the NumPy default).

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::eval::report::{MetricColumn, MetricRow};

/// Row labels of a summary, in order.
pub const STATISTICS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

/// Descriptive statistics for a set of measurements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of values.
    pub count: usize,
    /// Mean value.
    pub mean: f64,
    /// Sample standard deviation.
    pub std: f64,
    /// Minimum value.
    pub min: f64,
    /// 25th percentile.
    pub p25: f64,
    /// Median.
    pub p50: f64,
    /// 75th percentile.
    pub p75: f64,
    /// Maximum value.
    pub max: f64,
}

impl Summary {
    /// Compute summary statistics for a slice of values.
    ///
    /// Returns `None` if the slice is empty.
    #[must_use]
    pub fn compute(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        Some(Self {
            count,
            mean: mean(&sorted),
            std: std_dev(&sorted),
            min: sorted[0],
            p25: quantile(&sorted, 0.25),
            p50: quantile(&sorted, 0.5),
            p75: quantile(&sorted, 0.75),
            max: sorted[count - 1],
        })
    }

    /// Values in [`STATISTICS`] order.
    #[must_use]
    pub fn values(&self) -> [f64; 8] {
        [
            self.count as f64,
            self.mean,
            self.std,
            self.min,
            self.p25,
            self.p50,
            self.p75,
            self.max,
        ]
    }
}

/// Statistics for every metric column of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    /// One entry per column, in [`MetricColumn::ALL`] order.
    pub columns: Vec<(MetricColumn, Summary)>,
}

impl SummaryTable {
    /// Summarise metric rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyInput`] if `rows` is empty.
    pub fn from_rows(rows: &[MetricRow]) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::EmptyInput);
        }

        let columns = MetricColumn::ALL
            .iter()
            .map(|&column| {
                let values: Vec<f64> = rows.iter().map(|r| r.value(column)).collect();
                Summary::compute(&values)
                    .map(|summary| (column, summary))
                    .ok_or(Error::EmptyInput)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { columns })
    }

    /// Summary of one column.
    #[must_use]
    pub fn get(&self, column: MetricColumn) -> Option<&Summary> {
        self.columns
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, s)| s)
    }

    /// Write a statistic x metric grid as CSV.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;

        let mut header = vec!["statistic".to_string()];
        header.extend(self.columns.iter().map(|(c, _)| c.name().to_string()));
        wtr.write_record(&header)?;

        for (i, stat) in STATISTICS.iter().enumerate() {
            let mut record = vec![(*stat).to_string()];
            record.extend(self.columns.iter().map(|(_, s)| s.values()[i].to_string()));
            wtr.write_record(&record)?;
        }

        wtr.flush()?;
        Ok(())
    }

    /// Write the table as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl fmt::Display for SummaryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<6}", "")?;
        for (column, _) in &self.columns {
            write!(f, " {:>18}", column.name())?;
        }
        writeln!(f)?;

        for (i, stat) in STATISTICS.iter().enumerate() {
            write!(f, "{stat:<6}")?;
            for (_, summary) in &self.columns {
                write!(f, " {:>18.6}", summary.values()[i])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Arithmetic mean; 0 for an empty slice.
///
/// ```
/// use dicom_codec_eval::stats::mean;
///
/// // Compression ratios of three slices
/// assert!((mean(&[2.0, 2.5, 3.5]) - 8.0 / 3.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    match values.len() {
        0 => 0.0,
        n => values.iter().sum::<f64>() / n as f64,
    }
}

/// Sample standard deviation (N-1 denominator); 0 for fewer than two values.
///
/// ```
/// use dicom_codec_eval::stats::std_dev;
///
/// assert!((std_dev(&[0.90, 0.94, 0.98]) - 0.04).abs() < 1e-12);
/// assert_eq!(std_dev(&[0.97]), 0.0);
/// ```
#[must_use]
pub fn std_dev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (sum_sq / (n - 1) as f64).sqrt()
}

/// R-7 quantile of ascending `sorted` values, `q` in `0..=1`.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let below = pos.floor() as usize;
    match sorted.get(below + 1) {
        Some(&above) => {
            let lower = sorted[below];
            lower + (above - lower) * (pos - below as f64)
        }
        None => sorted[below],
    }
}
