//! Evaluation command: transcode image sets and summarise quality.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use dicom::encoding::transfer_syntax::{Codec, TransferSyntaxIndex};
use dicom::object::DefaultDicomObject;
use dicom::pixeldata::Transcode;
use dicom::transfer_syntax::TransferSyntaxRegistry;
use dicom::transfer_syntax::entries::EXPLICIT_VR_LITTLE_ENDIAN;
use dicom_codec_eval::{Error, EvalConfig, EvalSession, OutputNaming, TransformFn};
use log::info;

/// JPEG Baseline (Process 1) transfer syntax UID.
pub const JPEG_BASELINE: &str = "1.2.840.10008.1.2.4.50";

pub struct Options {
    pub dirs: Vec<PathBuf>,
    pub out: PathBuf,
    pub transfer_syntax: String,
    pub decompress: bool,
    pub naming: OutputNaming,
    pub data_range: Option<f64>,
    pub write_reports: bool,
}

pub fn run(options: Options) -> Result<()> {
    let config = EvalConfig::builder()
        .image_sets(options.dirs)
        .out_dir(&options.out)
        .naming(options.naming)
        .data_range(options.data_range)
        .write_reports(options.write_reports)
        .build()
        .context("Invalid evaluation settings")?;

    let compress = transcoder(&options.transfer_syntax)?;
    let mut session = EvalSession::new(config, compress);
    if options.decompress {
        session = session.with_decompression(transcoder(EXPLICIT_VR_LITTLE_ENDIAN.uid())?);
    }

    let (table, summary) = session.run().context("Evaluation failed")?;

    println!("Evaluated {} images", table.len());
    println!();
    print!("{summary}");

    if options.write_reports {
        info!("Reports written to {}", options.out.display());
    }

    Ok(())
}

/// Compression strategy that transcodes the object to `uid`.
///
/// Syntaxes whose pixel data can be read but not written are rejected here
/// rather than on the first image.
fn transcoder(uid: &str) -> Result<TransformFn> {
    let ts = TransferSyntaxRegistry
        .get(uid)
        .with_context(|| format!("Unknown transfer syntax: {uid}"))?;
    if let Codec::EncapsulatedPixelData(_, None) = ts.codec() {
        bail!("No pixel data encoder for {} ({})", ts.name(), ts.uid());
    }
    info!("Transcoding to {} ({})", ts.name(), ts.uid());

    Ok(Box::new(move |object: &mut DefaultDicomObject| {
        object
            .transcode(ts)
            .map_err(|e| Error::Compression(format!("{} ({}): {e}", ts.name(), ts.uid())))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom::core::{DataElement, PrimitiveValue, Tag, VR};
    use dicom::dictionary_std::tags;
    use dicom::object::{FileMetaTableBuilder, InMemDicomObject};
    use dicom::pixeldata::PixelDecoder;

    const SECONDARY_CAPTURE: &str = "1.2.840.10008.5.1.4.1.1.7";

    fn mono8_object(rows: u16, cols: u16) -> DefaultDicomObject {
        let us = |tag: Tag, value: u16| DataElement::new(tag, VR::US, PrimitiveValue::from(value));
        let pixels: Vec<u8> = (0..usize::from(rows) * usize::from(cols))
            .map(|i| ((i * 7 + i / usize::from(cols) * 13) % 256) as u8)
            .collect();

        let mut object = InMemDicomObject::new_empty();
        object.put(DataElement::new(
            tags::SOP_CLASS_UID,
            VR::UI,
            PrimitiveValue::from(SECONDARY_CAPTURE),
        ));
        object.put(DataElement::new(
            tags::SOP_INSTANCE_UID,
            VR::UI,
            PrimitiveValue::from("2.25.1234567"),
        ));
        object.put(us(tags::SAMPLES_PER_PIXEL, 1));
        object.put(DataElement::new(
            tags::PHOTOMETRIC_INTERPRETATION,
            VR::CS,
            PrimitiveValue::from("MONOCHROME2"),
        ));
        object.put(us(tags::ROWS, rows));
        object.put(us(tags::COLUMNS, cols));
        object.put(us(tags::BITS_ALLOCATED, 8));
        object.put(us(tags::BITS_STORED, 8));
        object.put(us(tags::HIGH_BIT, 7));
        object.put(us(tags::PIXEL_REPRESENTATION, 0));
        object.put(DataElement::new(
            tags::PIXEL_DATA,
            VR::OB,
            PrimitiveValue::U8(pixels.into()),
        ));

        object
            .with_meta(
                FileMetaTableBuilder::new()
                    .transfer_syntax(EXPLICIT_VR_LITTLE_ENDIAN.uid())
                    .media_storage_sop_class_uid(SECONDARY_CAPTURE)
                    .media_storage_sop_instance_uid("2.25.1234567"),
            )
            .unwrap()
    }

    #[test]
    fn test_known_transfer_syntaxes() {
        assert!(transcoder(JPEG_BASELINE).is_ok());
        assert!(transcoder(EXPLICIT_VR_LITTLE_ENDIAN.uid()).is_ok());
    }

    #[test]
    fn test_unknown_transfer_syntax() {
        assert!(transcoder("1.2.3.4.5.6.7").is_err());
    }

    #[test]
    fn test_rejects_syntax_without_encoder() {
        // RLE Lossless can be decoded but not encoded
        let err = transcoder("1.2.840.10008.1.2.5").err().unwrap();
        assert!(err.to_string().contains("No pixel data encoder"));
    }

    #[test]
    fn test_default_transcode_round_trip() {
        let mut object = mono8_object(16, 16);

        let compress = transcoder(JPEG_BASELINE).unwrap();
        compress(&mut object).unwrap();
        assert_eq!(object.meta().transfer_syntax(), JPEG_BASELINE);

        let decompress = transcoder(EXPLICIT_VR_LITTLE_ENDIAN.uid()).unwrap();
        decompress(&mut object).unwrap();
        assert_eq!(
            object.meta().transfer_syntax(),
            EXPLICIT_VR_LITTLE_ENDIAN.uid()
        );

        let decoded = object.decode_pixel_data().unwrap();
        assert_eq!(decoded.rows(), 16);
        assert_eq!(decoded.columns(), 16);
    }
}
