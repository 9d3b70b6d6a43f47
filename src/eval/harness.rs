//! Compression harness: compress one image, time it, persist the result.
//!
//! The compression and decompression steps are caller-supplied callbacks that
//! mutate a DICOM object in place. Only the compression callback is inside
//! the timed interval.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use dicom::object::DefaultDicomObject;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::source::DicomImage;

/// In-place transform callback type.
///
/// Used for both the compression and the optional decompression step.
pub type TransformFn = Box<dyn Fn(&mut DefaultDicomObject) -> Result<()> + Send + Sync>;

/// How reconstructed files are named inside `{out_dir}/{set_index}/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputNaming {
    /// `reconstructed-%Y-%m-%d-%H-%M-%S-%f.dcm`, suffixed `-N` if taken.
    #[default]
    Timestamp,
    /// `{source file name}-reconstructed.dcm`, e.g. `ct-7.dcm-reconstructed.dcm`.
    ///
    /// The whole file name is kept so `a.dcm` and `a.DCM` stay apart.
    SourceName,
}

impl OutputNaming {
    /// Destination for `source` in image set `set_index`.
    ///
    /// Does not touch the filesystem except to probe for collisions in
    /// [`OutputNaming::Timestamp`] mode.
    #[must_use]
    pub fn output_path(self, out_dir: &Path, set_index: usize, source: &Path) -> PathBuf {
        let dir = set_dir(out_dir, set_index);
        match self {
            Self::Timestamp => {
                let stamp = chrono::Local::now().format("%Y-%m-%d-%H-%M-%S-%6f");
                let base = format!("reconstructed-{stamp}");
                let mut candidate = dir.join(format!("{base}.dcm"));
                let mut n = 1;
                while candidate.exists() {
                    candidate = dir.join(format!("{base}-{n}.dcm"));
                    n += 1;
                }
                candidate
            }
            Self::SourceName => {
                let name = source
                    .file_name()
                    .map_or_else(|| "image".into(), |s| s.to_string_lossy());
                dir.join(format!("{name}-reconstructed.dcm"))
            }
        }
    }
}

/// Output directory of one image set.
#[must_use]
pub fn set_dir(out_dir: &Path, set_index: usize) -> PathBuf {
    out_dir.join(set_index.to_string())
}

/// Result of one harness invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessOutput {
    /// Where the reconstructed file was written.
    pub persisted_path: PathBuf,
    /// Wall-clock duration of the compression callback alone.
    pub elapsed: Duration,
}

/// Applies the compression (and optional decompression) callbacks to one
/// image and persists the result.
pub struct CompressionHarness {
    compress: TransformFn,
    decompress: Option<TransformFn>,
    naming: OutputNaming,
}

impl std::fmt::Debug for CompressionHarness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompressionHarness")
            .field("decompress", &self.decompress.is_some())
            .field("naming", &self.naming)
            .finish_non_exhaustive()
    }
}

impl CompressionHarness {
    /// Create a harness with a compression callback.
    #[must_use]
    pub fn new(compress: TransformFn) -> Self {
        Self {
            compress,
            decompress: None,
            naming: OutputNaming::default(),
        }
    }

    /// Run `decompress` right after compression, before persisting.
    #[must_use]
    pub fn with_decompression(mut self, decompress: TransformFn) -> Self {
        self.decompress = Some(decompress);
        self
    }

    /// Set the output naming scheme.
    #[must_use]
    pub fn with_naming(mut self, naming: OutputNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Whether a decompression step is configured.
    #[must_use]
    pub fn decompresses(&self) -> bool {
        self.decompress.is_some()
    }

    /// Compress `image` in place, optionally decompress it, and write it to
    /// `{out_dir}/{set_index}/`.
    pub fn apply(
        &self,
        image: &mut DicomImage,
        set_index: usize,
        out_dir: &Path,
    ) -> Result<HarnessOutput> {
        let start = Instant::now();
        (self.compress)(image.object_mut())?;
        let elapsed = start.elapsed();

        if let Some(ref decompress) = self.decompress {
            decompress(image.object_mut())?;
        }

        let dir = set_dir(out_dir, set_index);
        fs::create_dir_all(&dir).map_err(|e| Error::Persist {
            path: dir.clone(),
            reason: e.to_string(),
        })?;

        let persisted_path = self.naming.output_path(out_dir, set_index, image.path());
        persist(image.object(), &persisted_path)?;

        Ok(HarnessOutput {
            persisted_path,
            elapsed,
        })
    }
}

/// Write `object` to `path` through a sibling `.part` file so a failed write
/// never leaves a truncated file at `path`.
pub fn persist(object: &DefaultDicomObject, path: &Path) -> Result<()> {
    let mut part = path.as_os_str().to_owned();
    part.push(".part");
    let part = PathBuf::from(part);

    let written = object
        .write_to_file(&part)
        .map_err(|e| e.to_string())
        .and_then(|()| fs::rename(&part, path).map_err(|e| e.to_string()));

    written.map_err(|reason| {
        let _ = fs::remove_file(&part);
        Error::Persist {
            path: path.to_path_buf(),
            reason,
        }
    })
}
