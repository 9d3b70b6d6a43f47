//! Synthetic DICOM fixtures for unit tests.

use std::path::Path;

use dicom::core::{DataElement, PrimitiveValue, Tag, VR};
use dicom::object::{DefaultDicomObject, FileMetaTableBuilder, InMemDicomObject};
use dicom::transfer_syntax::entries::EXPLICIT_VR_LITTLE_ENDIAN;
use dicom_dictionary_std::tags;

const SECONDARY_CAPTURE: &str = "1.2.840.10008.5.1.4.1.1.7";
const INSTANCE_UID: &str = "2.25.215836475982318342861357921093482745";

/// Row-major gradient with a bit of texture so SSIM windows see structure.
pub fn gradient_u8(rows: usize, cols: usize) -> Vec<u8> {
    (0..rows * cols)
        .map(|i| {
            let (r, c) = (i / cols, i % cols);
            ((r * 13 + c * 7 + (r * c) % 5) % 256) as u8
        })
        .collect()
}

pub fn write_mono8(path: &Path, rows: u16, cols: u16, pixels: &[u8]) {
    let value = PrimitiveValue::U8(pixels.iter().copied().collect());
    write_image(path, rows, cols, 8, false, VR::OB, value);
}

pub fn write_mono16(path: &Path, rows: u16, cols: u16, pixels: &[u16]) {
    let value = PrimitiveValue::U16(pixels.iter().copied().collect());
    write_image(path, rows, cols, 16, false, VR::OW, value);
}

pub fn write_mono16_signed(path: &Path, rows: u16, cols: u16, pixels: &[i16]) {
    // Stored as OW; Pixel Representation carries the sign
    let value = PrimitiveValue::U16(pixels.iter().map(|&v| v as u16).collect());
    write_image(path, rows, cols, 16, true, VR::OW, value);
}

/// Put a fresh 8-bit monochrome image module into an existing object.
pub fn replace_mono8(object: &mut InMemDicomObject, rows: u16, cols: u16, pixels: &[u8]) {
    let value = PrimitiveValue::U8(pixels.iter().copied().collect());
    put_image_module(object, rows, cols, 8, false, VR::OB, value);
}

fn write_image(
    path: &Path,
    rows: u16,
    cols: u16,
    bits: u16,
    signed: bool,
    vr: VR,
    pixel_data: PrimitiveValue,
) {
    let mut object = InMemDicomObject::new_empty();
    object.put(DataElement::new(
        tags::SOP_CLASS_UID,
        VR::UI,
        PrimitiveValue::from(SECONDARY_CAPTURE),
    ));
    object.put(DataElement::new(
        tags::SOP_INSTANCE_UID,
        VR::UI,
        PrimitiveValue::from(INSTANCE_UID),
    ));
    object.put(DataElement::new(
        tags::MODALITY,
        VR::CS,
        PrimitiveValue::from("OT"),
    ));
    put_image_module(&mut object, rows, cols, bits, signed, vr, pixel_data);

    with_file_meta(object)
        .write_to_file(path)
        .expect("fixture written");
}

/// Wrap a data set in an explicit VR little endian file meta group.
pub fn with_file_meta(object: InMemDicomObject) -> DefaultDicomObject {
    object
        .with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax(EXPLICIT_VR_LITTLE_ENDIAN.uid())
                .media_storage_sop_class_uid(SECONDARY_CAPTURE)
                .media_storage_sop_instance_uid(INSTANCE_UID),
        )
        .expect("valid file meta")
}

fn put_image_module(
    object: &mut InMemDicomObject,
    rows: u16,
    cols: u16,
    bits: u16,
    signed: bool,
    vr: VR,
    pixel_data: PrimitiveValue,
) {
    let us = |tag: Tag, value: u16| DataElement::new(tag, VR::US, PrimitiveValue::from(value));

    object.put(us(tags::SAMPLES_PER_PIXEL, 1));
    object.put(DataElement::new(
        tags::PHOTOMETRIC_INTERPRETATION,
        VR::CS,
        PrimitiveValue::from("MONOCHROME2"),
    ));
    object.put(us(tags::ROWS, rows));
    object.put(us(tags::COLUMNS, cols));
    object.put(us(tags::BITS_ALLOCATED, bits));
    object.put(us(tags::BITS_STORED, bits));
    object.put(us(tags::HIGH_BIT, bits - 1));
    object.put(us(tags::PIXEL_REPRESENTATION, u16::from(signed)));
    object.put(DataElement::new(tags::PIXEL_DATA, vr, pixel_data));
}
