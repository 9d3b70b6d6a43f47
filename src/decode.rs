//! Pixel decoding for DICOM objects.
//!
//! This module turns a DICOM object into a [`PixelImage`]: the raw stored
//! pixel values (no modality or VOI LUT applied) as `f64`, together with the
//! [`PixelType`] declared by the object's image pixel module. The pixel type
//! selects the data range used by the quality metrics.
//!
//! # Example
//!
//! ```ignore
//! use dicom_codec_eval::decode::PixelImage;
//!
//! let image = PixelImage::from_file("slice-001.dcm")?;
//! println!("{} {:?}", image.pixel_type(), image.shape());
//! let range = image.pixel_type().data_range()?;
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use dicom::object::{DefaultDicomObject, open_file};
use dicom::pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder};
use dicom_dictionary_std::tags;
use ndarray::{Array4, ArrayView2, s};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Numeric type of the stored pixel samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelType {
    /// Unsigned 8-bit.
    U8,
    /// Unsigned 16-bit.
    U16,
    /// Unsigned 32-bit.
    U32,
    /// Unsigned 64-bit.
    U64,
    /// Signed 8-bit.
    I8,
    /// Signed 16-bit.
    I16,
    /// Signed 32-bit.
    I32,
    /// Signed 64-bit.
    I64,
    /// 32-bit floating point.
    F32,
    /// 64-bit floating point.
    F64,
}

/// Data range assumed by the similarity metrics for each pixel type.
///
/// The signed 16-bit entry is negative. SSIM squares its stabilising
/// constants, so only the magnitude reaches the score.
pub const DATA_RANGES: &[(PixelType, f64)] = &[
    (PixelType::U8, 255.0),
    (PixelType::U16, 65535.0),
    (PixelType::U32, 4_294_967_295.0),
    (PixelType::I8, 128.0),
    (PixelType::I16, -32768.0),
    (PixelType::I32, 2_147_483_648.0),
    (PixelType::F32, 1.0),
    (PixelType::F64, 1.0),
];

impl PixelType {
    /// Derive the pixel type from Bits Allocated and Pixel Representation.
    ///
    /// Only 8, 16, 32 and 64 bit containers map to a type; packed 1-bit
    /// data and other widths are rejected.
    pub fn from_bits(bits_allocated: u16, signed: bool) -> Result<Self> {
        match (bits_allocated, signed) {
            (8, false) => Ok(Self::U8),
            (16, false) => Ok(Self::U16),
            (32, false) => Ok(Self::U32),
            (64, false) => Ok(Self::U64),
            (8, true) => Ok(Self::I8),
            (16, true) => Ok(Self::I16),
            (32, true) => Ok(Self::I32),
            (64, true) => Ok(Self::I64),
            (bits, signed) => Err(Error::UnsupportedDataType(format!(
                "{bits}-bit {} samples",
                if signed { "signed" } else { "unsigned" }
            ))),
        }
    }

    /// Look up the metric data range for this pixel type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedDataType`] for types without a table entry.
    pub fn data_range(self) -> Result<f64> {
        DATA_RANGES
            .iter()
            .find(|(ty, _)| *ty == self)
            .map(|(_, range)| *range)
            .ok_or_else(|| Error::UnsupportedDataType(self.to_string()))
    }

    /// Short lowercase name (`uint16`, `int8`, `float32`, ...).
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::U8 => "uint8",
            Self::U16 => "uint16",
            Self::U32 => "uint32",
            Self::U64 => "uint64",
            Self::I8 => "int8",
            Self::I16 => "int16",
            Self::I32 => "int32",
            Self::I64 => "int64",
            Self::F32 => "float32",
            Self::F64 => "float64",
        }
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded pixel data of one DICOM file.
///
/// Samples are stored as `(frames, rows, columns, samples_per_pixel)`.
#[derive(Debug, Clone)]
pub struct PixelImage {
    source: PathBuf,
    pixel_type: PixelType,
    data: Array4<f64>,
}

impl PixelImage {
    /// Build a pixel image from already decoded samples.
    #[must_use]
    pub fn new(source: impl Into<PathBuf>, pixel_type: PixelType, data: Array4<f64>) -> Self {
        Self {
            source: source.into(),
            pixel_type,
            data,
        }
    }

    /// Open a DICOM file and decode its pixel data.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let object = open_file(path).map_err(|e| decode_error(path, e))?;
        Self::from_object(&object, path)
    }

    /// Decode the pixel data of an already parsed object.
    ///
    /// `source` is only used to label errors and the resulting image.
    pub fn from_object(object: &DefaultDicomObject, source: &Path) -> Result<Self> {
        let pixel_type = pixel_type_of(object, source)?;

        let decoded = object
            .decode_pixel_data()
            .map_err(|e| decode_error(source, e))?;

        // Raw stored values, as the metrics expect
        let options = ConvertOptions::new().with_modality_lut(ModalityLutOption::None);
        let data = decoded
            .to_ndarray_with_options::<f64>(&options)
            .map_err(|e| decode_error(source, e))?;

        Ok(Self::new(source, pixel_type, data))
    }

    /// File this image was decoded from.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Declared pixel type.
    #[must_use]
    pub fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    /// Shape as `[frames, rows, columns, samples]`.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Rows and columns of a single plane.
    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        let shape = self.data.shape();
        (shape[1], shape[2])
    }

    /// All samples.
    #[must_use]
    pub fn data(&self) -> &Array4<f64> {
        &self.data
    }

    /// Every 2D plane, frame-major then sample.
    #[must_use]
    pub fn planes(&self) -> Vec<ArrayView2<'_, f64>> {
        let shape = self.data.shape();
        let (frames, samples) = (shape[0], shape[3]);
        let mut planes = Vec::with_capacity(frames * samples);
        for frame in 0..frames {
            for sample in 0..samples {
                planes.push(self.data.slice(s![frame, .., .., sample]));
            }
        }
        planes
    }
}

fn pixel_type_of(object: &DefaultDicomObject, source: &Path) -> Result<PixelType> {
    // Float samples live in their own pixel data elements
    if object.element(tags::FLOAT_PIXEL_DATA).is_ok() {
        return Ok(PixelType::F32);
    }
    if object.element(tags::DOUBLE_FLOAT_PIXEL_DATA).is_ok() {
        return Ok(PixelType::F64);
    }

    let bits_allocated = object
        .element(tags::BITS_ALLOCATED)
        .map_err(|e| decode_error(source, e))?
        .to_int::<u16>()
        .map_err(|e| decode_error(source, e))?;

    // Pixel Representation is type 1, but treat a missing one as unsigned
    let signed = object
        .element(tags::PIXEL_REPRESENTATION)
        .ok()
        .and_then(|e| e.to_int::<u16>().ok())
        .is_some_and(|repr| repr == 1);

    PixelType::from_bits(bits_allocated, signed)
}

pub(crate) fn decode_error(path: &Path, err: impl fmt::Display) -> Error {
    Error::Decode {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
