//! Image sets: directories of single-image DICOM files.
//!
//! An [`ImageSet`] is one input directory plus its ordinal position in the
//! run. Only files directly inside the directory are considered (no
//! recursion), and only those with a `.dcm` extension.
//!
//! ## Example
//!
//! ```rust,ignore
//! use dicom_codec_eval::source::ImageSet;
//!
//! let set = ImageSet::new(0, "./CT-1");
//! for (path, image) in set.read_images()? {
//!     println!("{}: {:?}", path.display(), image.file_name());
//! }
//!
//! // Or stack every slice into a volume
//! let volume = set.read_volume()?;
//! println!("{:?}", volume.data.dim());
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use dicom::object::{DefaultDicomObject, open_file};
use ndarray::{Array3, s};

use crate::decode::{PixelImage, PixelType, decode_error};
use crate::error::{Error, Result};

/// File extensions recognised as DICOM images.
pub const DICOM_EXTENSIONS: &[&str] = &["dcm"];

/// One input directory of the evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSet {
    index: usize,
    path: PathBuf,
}

impl ImageSet {
    /// Create an image set at position `index` of the input list.
    #[must_use]
    pub fn new(index: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            index,
            path: path.into(),
        }
    }

    /// Ordinal index, used to namespace output paths.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Directory of the set.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fail with [`Error::SourceNotFound`] unless the directory exists.
    pub fn ensure_exists(&self) -> Result<()> {
        if self.path.is_dir() {
            Ok(())
        } else {
            Err(Error::SourceNotFound {
                path: self.path.clone(),
            })
        }
    }

    /// List DICOM files directly inside the directory, sorted by path.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        self.ensure_exists()?;

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.path)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_dicom_path(path))
            .collect();
        paths.sort();

        Ok(paths)
    }

    /// Parse every DICOM file of the set.
    ///
    /// Entries are keyed by file path; iteration order is the sorted path
    /// order, so repeated calls yield images in the same order. The first
    /// file that fails to parse aborts the call.
    pub fn read_images(&self) -> Result<BTreeMap<PathBuf, DicomImage>> {
        let mut images = BTreeMap::new();
        for path in self.discover()? {
            let image = DicomImage::open(&path)?;
            images.insert(path, image);
        }
        Ok(images)
    }

    /// Stack the first plane of every slice into a `(slices, rows, columns)`
    /// volume, in sorted path order.
    pub fn read_volume(&self) -> Result<Volume> {
        let slices = self.discover()?;
        if slices.is_empty() {
            return Err(Error::EmptyInput);
        }

        let images = slices
            .iter()
            .map(PixelImage::from_file)
            .collect::<Result<Vec<_>>>()?;

        let (rows, cols) = images[0].dimensions();
        if let Some(odd) = images.iter().find(|img| img.dimensions() != (rows, cols)) {
            let (odd_rows, odd_cols) = odd.dimensions();
            return Err(Error::ShapeMismatch {
                expected: vec![rows, cols],
                actual: vec![odd_rows, odd_cols],
            });
        }

        let mut data = Array3::<f64>::zeros((images.len(), rows, cols));
        for (i, image) in images.iter().enumerate() {
            data.slice_mut(s![i, .., ..])
                .assign(&image.data().slice(s![0, .., .., 0]));
        }

        Ok(Volume {
            slices,
            pixel_type: images[0].pixel_type(),
            data,
        })
    }
}

/// Slices of an image set stacked along the first axis.
#[derive(Debug, Clone)]
pub struct Volume {
    /// Source file of each slice, in stacking order.
    pub slices: Vec<PathBuf>,
    /// Pixel type of the first slice.
    pub pixel_type: PixelType,
    /// Samples as `(slices, rows, columns)`.
    pub data: Array3<f64>,
}

/// A parsed DICOM file together with the path it was read from.
#[derive(Debug, Clone)]
pub struct DicomImage {
    path: PathBuf,
    object: DefaultDicomObject,
}

impl DicomImage {
    /// Parse a DICOM file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let object = open_file(path).map_err(|e| decode_error(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            object,
        })
    }

    /// Path the image was read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name of the source path.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("")
    }

    /// The parsed object.
    #[must_use]
    pub fn object(&self) -> &DefaultDicomObject {
        &self.object
    }

    /// Mutable access for in-place compression.
    pub fn object_mut(&mut self) -> &mut DefaultDicomObject {
        &mut self.object
    }

    /// Decode the pixel data of this image.
    pub fn decode(&self) -> Result<PixelImage> {
        PixelImage::from_object(&self.object, &self.path)
    }
}

fn is_dicom_path(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| DICOM_EXTENSIONS.iter().any(|d| ext.eq_ignore_ascii_case(d)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use tempfile::TempDir;

    fn write_slices(dir: &Path, names: &[&str]) {
        let pixels = test_support::gradient_u8(16, 16);
        for name in names {
            test_support::write_mono8(&dir.join(name), 16, 16, &pixels);
        }
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        let set = ImageSet::new(0, dir.path().join("nope"));
        assert!(matches!(set.discover(), Err(Error::SourceNotFound { .. })));
        assert!(matches!(set.read_images(), Err(Error::SourceNotFound { .. })));
    }

    #[test]
    fn test_discover_is_flat_and_sorted() {
        let dir = TempDir::new().unwrap();
        write_slices(dir.path(), &["b.dcm", "a.DCM", "c.dcm"]);
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        write_slices(&nested, &["d.dcm"]);

        let set = ImageSet::new(3, dir.path());
        let found = set.discover().unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.DCM", "b.dcm", "c.dcm"]);
        assert_eq!(set.index(), 3);
    }

    #[test]
    fn test_read_images_keyed_by_path() {
        let dir = TempDir::new().unwrap();
        write_slices(dir.path(), &["1.dcm", "2.dcm"]);

        let images = ImageSet::new(0, dir.path()).read_images().unwrap();
        assert_eq!(images.len(), 2);
        for (path, image) in &images {
            assert_eq!(path, image.path());
            assert_eq!(image.decode().unwrap().dimensions(), (16, 16));
        }
    }

    #[test]
    fn test_read_images_empty_directory() {
        let dir = TempDir::new().unwrap();
        let images = ImageSet::new(0, dir.path()).read_images().unwrap();
        assert!(images.is_empty());
    }

    #[test]
    fn test_read_images_corrupt_file() {
        let dir = TempDir::new().unwrap();
        write_slices(dir.path(), &["good.dcm"]);
        std::fs::write(dir.path().join("bad.dcm"), b"garbage").unwrap();

        let result = ImageSet::new(0, dir.path()).read_images();
        assert!(matches!(result, Err(Error::Decode { .. })));
    }

    #[test]
    fn test_read_volume() {
        let dir = TempDir::new().unwrap();
        write_slices(dir.path(), &["1.dcm", "2.dcm", "3.dcm"]);

        let volume = ImageSet::new(0, dir.path()).read_volume().unwrap();
        assert_eq!(volume.data.dim(), (3, 16, 16));
        assert_eq!(volume.slices.len(), 3);
        assert_eq!(volume.pixel_type, PixelType::U8);
    }

    #[test]
    fn test_read_volume_inconsistent_slices() {
        let dir = TempDir::new().unwrap();
        write_slices(dir.path(), &["1.dcm"]);
        let small = test_support::gradient_u8(12, 12);
        test_support::write_mono8(&dir.path().join("2.dcm"), 12, 12, &small);

        let result = ImageSet::new(0, dir.path()).read_volume();
        assert!(matches!(result, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_read_volume_empty() {
        let dir = TempDir::new().unwrap();
        let result = ImageSet::new(0, dir.path()).read_volume();
        assert!(matches!(result, Err(Error::EmptyInput)));
    }
}
