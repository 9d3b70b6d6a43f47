//! Inspect command: pixel type, shape and data range of one file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use dicom_codec_eval::PixelImage;

pub fn run(path: PathBuf) -> Result<()> {
    let image = PixelImage::from_file(&path)
        .with_context(|| format!("Failed to decode {}", path.display()))?;

    let pixel_type = image.pixel_type();
    let shape = image.shape();

    println!("File:        {}", path.display());
    println!("Pixel type:  {pixel_type}");
    println!(
        "Shape:       {} frame(s) x {} x {} x {} sample(s)",
        shape[0], shape[1], shape[2], shape[3]
    );
    match pixel_type.data_range() {
        Ok(range) => println!("Data range:  {range}"),
        Err(e) => println!("Data range:  unavailable ({e})"),
    }

    Ok(())
}
