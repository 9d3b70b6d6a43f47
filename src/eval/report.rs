//! Per-image metric rows and the table they accumulate into.
//!
//! Rows serialize to CSV (one line per image) and JSON. The four metric
//! columns are listed by [`MetricColumn`].

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::stats::SummaryTable;

/// Metric columns summarised at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricColumn {
    /// Compression wall-clock time in seconds.
    Time,
    /// Original file size / reconstructed file size.
    CompressionRatio,
    /// Structural similarity.
    Ssim,
    /// Feature similarity.
    Fsim,
}

impl MetricColumn {
    /// All columns, in table order.
    pub const ALL: [Self; 4] = [Self::Time, Self::CompressionRatio, Self::Ssim, Self::Fsim];

    /// Column header.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::CompressionRatio => "compression_ratio",
            Self::Ssim => "ssim",
            Self::Fsim => "fsim",
        }
    }
}

impl fmt::Display for MetricColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Measurements for one evaluated image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    /// Index of the image set the image belongs to.
    pub set_index: usize,
    /// Original file.
    pub source: PathBuf,
    /// Reconstructed file.
    pub output: PathBuf,
    /// Compression time in seconds.
    pub time: f64,
    /// Original size / reconstructed size.
    pub compression_ratio: f64,
    /// Structural similarity.
    pub ssim: f64,
    /// Feature similarity.
    pub fsim: f64,
}

impl MetricRow {
    /// Value of one metric column.
    #[must_use]
    pub fn value(&self, column: MetricColumn) -> f64 {
        match column {
            MetricColumn::Time => self.time,
            MetricColumn::CompressionRatio => self.compression_ratio,
            MetricColumn::Ssim => self.ssim,
            MetricColumn::Fsim => self.fsim,
        }
    }

    /// Fraction of bytes saved relative to the original (`1 - 1/ratio`).
    #[must_use]
    pub fn space_saving(&self) -> f64 {
        1.0 - 1.0 / self.compression_ratio
    }
}

/// Compression ratio from on-disk sizes: `original / persisted`.
pub fn compression_ratio(original: &Path, persisted: &Path) -> Result<f64> {
    let original_size = fs::metadata(original)?.len();
    let persisted_size = fs::metadata(persisted)?.len();
    if persisted_size == 0 {
        return Err(Error::MetricCalculation {
            metric: "compression ratio".to_string(),
            reason: format!("{} is empty", persisted.display()),
        });
    }
    Ok(original_size as f64 / persisted_size as f64)
}

/// Ordered rows of one evaluation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricTable {
    /// Rows in processing order.
    pub rows: Vec<MetricRow>,
}

impl MetricTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row.
    pub fn push(&mut self, row: MetricRow) {
        self.rows.push(row);
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows were collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All values of one column, in row order.
    #[must_use]
    pub fn column(&self, column: MetricColumn) -> Vec<f64> {
        self.rows.iter().map(|r| r.value(column)).collect()
    }

    /// Descriptive statistics of every column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyInput`] if the table has no rows.
    pub fn summarize(&self) -> Result<SummaryTable> {
        SummaryTable::from_rows(&self.rows)
    }

    /// Write one CSV line per row.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        for row in &self.rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Read a table written by [`MetricTable::write_csv`].
    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut rdr = csv::Reader::from_path(path)?;
        let rows = rdr
            .deserialize()
            .collect::<std::result::Result<Vec<MetricRow>, _>>()?;
        Ok(Self { rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn row(time: f64, ratio: f64) -> MetricRow {
        MetricRow {
            set_index: 0,
            source: PathBuf::from("in/a.dcm"),
            output: PathBuf::from("out/0/a.dcm"),
            time,
            compression_ratio: ratio,
            ssim: 0.98,
            fsim: 0.99,
        }
    }

    #[test]
    fn test_column_names() {
        let names: Vec<_> = MetricColumn::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["time", "compression_ratio", "ssim", "fsim"]);
    }

    #[test]
    fn test_space_saving() {
        assert!((row(0.1, 4.0).space_saving() - 0.75).abs() < 1e-12);
        assert!(row(0.1, 1.0).space_saving().abs() < 1e-12);
    }

    #[test]
    fn test_column_extraction() {
        let mut table = MetricTable::new();
        table.push(row(0.1, 2.0));
        table.push(row(0.3, 3.0));
        assert_eq!(table.len(), 2);
        assert_eq!(table.column(MetricColumn::Time), vec![0.1, 0.3]);
        assert_eq!(table.column(MetricColumn::CompressionRatio), vec![2.0, 3.0]);
    }

    #[test]
    fn test_compression_ratio_from_sizes() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::fs::write(&a, vec![0u8; 1000]).unwrap();
        std::fs::write(&b, vec![0u8; 250]).unwrap();
        assert!((compression_ratio(&a, &b).unwrap() - 4.0).abs() < 1e-12);
        assert!((compression_ratio(&a, &a).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_compression_ratio_empty_output() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::fs::write(&a, b"abc").unwrap();
        std::fs::write(&b, b"").unwrap();
        assert!(matches!(
            compression_ratio(&a, &b),
            Err(Error::MetricCalculation { .. })
        ));
    }

    #[test]
    fn test_csv_roundtrip_preserves_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metrics.csv");
        let mut table = MetricTable::new();
        table.push(row(0.125, 2.5));
        table.push(row(0.5, 1.25));

        table.write_csv(&path).unwrap();
        let header = std::fs::read_to_string(&path).unwrap();
        assert!(header.starts_with("set_index,source,output,time,compression_ratio,ssim,fsim"));

        let loaded = MetricTable::read_csv(&path).unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn test_summarize_empty() {
        assert!(matches!(MetricTable::new().summarize(), Err(Error::EmptyInput)));
    }
}
