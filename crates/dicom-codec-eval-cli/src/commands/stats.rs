//! Statistics command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use dicom_codec_eval::{MetricColumn, MetricTable};
use log::info;

pub fn run(input: PathBuf, json: bool) -> Result<()> {
    info!("Loading metrics from: {}", input.display());

    let table = MetricTable::read_csv(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let summary = table
        .summarize()
        .with_context(|| format!("No rows in {}", input.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Total images: {}", table.len());
    println!();
    print!("{summary}");

    let savings: Vec<f64> = table.rows.iter().map(|r| r.space_saving()).collect();
    if let Some(ratio) = summary.get(MetricColumn::CompressionRatio) {
        println!();
        println!(
            "Mean space saving: {:.2}% (ratio {:.3})",
            dicom_codec_eval::stats::mean(&savings) * 100.0,
            ratio.mean
        );
    }

    Ok(())
}
