//! Conversion of other image formats, including camera RAW, to JPEG.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use crate::decode::{decode_path, DecodeError, RAW_EXTENSIONS};
use crate::encode::{EncodeError, JpegQualityEncoder, QualityEncoder};

/// Non-RAW extensions the converter accepts.
pub const COMMON_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "tiff", "tif", "gif"];

/// Quality used when converting, unless the caller overrides it.
pub const DEFAULT_CONVERT_QUALITY: u8 = 95;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Unsupported file type: {}", .0.display())]
    Unsupported(PathBuf),

    #[error("{} is not a file or directory", .0.display())]
    NotFound(PathBuf),

    #[error("{} is already a JPEG at the output location", .0.display())]
    SameFile(PathBuf),

    #[error("{} would be written to {}, which another file in this run already uses", path.display(), output.display())]
    OutputTaken { path: PathBuf, output: PathBuf },

    #[error("Failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    #[error("Failed to encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: EncodeError,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What happened to each file of a conversion run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConversionReport {
    /// `(input, output)` pairs that were written.
    pub converted: Vec<(PathBuf, PathBuf)>,
    /// Files that were left alone: unsupported types and JPEGs that would
    /// convert onto themselves.
    pub skipped: Vec<PathBuf>,
    /// Files that failed, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

impl ConversionReport {
    fn record(&mut self, input: &Path, result: Result<PathBuf, ConvertError>) {
        match result {
            Ok(output) => self.converted.push((input.to_path_buf(), output)),
            Err(ConvertError::Unsupported(path) | ConvertError::SameFile(path)) => {
                debug!(path = %path.display(), "skipped");
                self.skipped.push(path);
            }
            Err(e) => {
                warn!(path = %input.display(), error = %e, "conversion failed");
                self.failed.push((input.to_path_buf(), e.to_string()));
            }
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Returns true if the converter knows how to read this file.
pub fn is_supported(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| {
        COMMON_EXTENSIONS.contains(&ext.as_str()) || RAW_EXTENSIONS.contains(&ext.as_str())
    })
}

/// `<output_dir or input's dir>/<stem>.jpg`
pub fn jpeg_output_path(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = input.file_stem().unwrap_or(input.as_os_str());
    let dir = output_dir
        .or_else(|| input.parent())
        .unwrap_or_else(|| Path::new(""));
    let mut name = stem.to_os_string();
    name.push(".jpg");
    dir.join(name)
}

fn parent_or_cwd(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// True when writing `output` would replace `input` itself.
///
/// File names are compared ignoring ASCII case and the directories are
/// compared after canonicalizing, so `photo.JPG` and `./photo.jpg` match.
fn same_destination(input: &Path, output: &Path) -> bool {
    if input == output {
        return true;
    }
    let (Some(input_name), Some(output_name)) = (input.file_name(), output.file_name()) else {
        return false;
    };
    if !input_name.eq_ignore_ascii_case(output_name) {
        return false;
    }
    match (
        fs::canonicalize(parent_or_cwd(input)),
        fs::canonicalize(parent_or_cwd(output)),
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Where `input` would be written, or why it is left alone.
fn plan_output(input: &Path, output_dir: Option<&Path>) -> Result<PathBuf, ConvertError> {
    if !is_supported(input) {
        return Err(ConvertError::Unsupported(input.to_path_buf()));
    }
    let output = jpeg_output_path(input, output_dir);
    if same_destination(input, &output) {
        return Err(ConvertError::SameFile(input.to_path_buf()));
    }
    Ok(output)
}

/// Convert one file to JPEG and return the path written.
#[instrument(level = "debug", skip(input, output_dir), fields(input = %input.display()))]
pub fn convert_file(
    input: &Path,
    output_dir: Option<&Path>,
    quality: u8,
) -> Result<PathBuf, ConvertError> {
    let output = plan_output(input, output_dir)?;
    write_jpeg(input, output, quality)
}

fn write_jpeg(input: &Path, output: PathBuf, quality: u8) -> Result<PathBuf, ConvertError> {
    let image = decode_path(input).map_err(|source| ConvertError::Decode {
        path: input.to_path_buf(),
        source,
    })?;
    let bytes = JpegQualityEncoder
        .encode(&image, quality)
        .map_err(|source| ConvertError::Encode {
            path: input.to_path_buf(),
            source,
        })?;

    if let Some(dir) = output.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|source| ConvertError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    fs::write(&output, bytes).map_err(|source| ConvertError::Io {
        path: output.clone(),
        source,
    })?;

    info!(output = %output.display(), "converted");
    Ok(output)
}

/// `output_dir` plus the path of `input`'s directory relative to `root`.
fn mirrored_dir(root: &Path, input: &Path, output_dir: Option<&Path>) -> Option<PathBuf> {
    let output_dir = output_dir?;
    let relative = input
        .parent()
        .and_then(|parent| parent.strip_prefix(root).ok())
        .filter(|relative| !relative.as_os_str().is_empty());
    Some(match relative {
        Some(relative) => output_dir.join(relative),
        None => output_dir.to_path_buf(),
    })
}

/// Key for spotting two inputs that map to one output. Case is folded so
/// `a.png` and `A.bmp` collide on case-insensitive file systems too.
fn claim_key(output: &Path) -> String {
    let normalized: PathBuf = output.components().collect();
    normalized.to_string_lossy().to_lowercase()
}

/// Convert every supported file under `root`. Only the top level is visited
/// unless `recursive` is set. One failing file doesn't stop the run.
///
/// With an `output_dir`, subfolders are mirrored beneath it. A file whose
/// output is already taken in this run, by an earlier conversion or by a
/// JPEG that stays in place, is reported as failed rather than overwriting.
#[instrument(skip(root, output_dir), fields(root = %root.display()))]
pub fn convert_folder(
    root: &Path,
    recursive: bool,
    output_dir: Option<&Path>,
    quality: u8,
) -> ConversionReport {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut report = ConversionReport::default();
    let mut planned = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
    {
        match entry {
            Ok(entry) if entry.file_type().is_file() => {
                let input = entry.into_path();
                let dir = mirrored_dir(root, &input, output_dir);
                let plan = plan_output(&input, dir.as_deref());
                planned.push((input, plan));
            }
            Ok(_) => {}
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                warn!(path = %path.display(), error = %e, "failed to read directory entry");
                report.failed.push((path, e.to_string()));
            }
        }
    }

    // JPEGs left in place hold their names before anything is written.
    let mut claimed: HashSet<String> = planned
        .iter()
        .filter_map(|(_, plan)| match plan {
            Err(ConvertError::SameFile(path)) => Some(claim_key(path)),
            _ => None,
        })
        .collect();

    for (input, plan) in planned {
        let result = plan.and_then(|output| {
            if claimed.insert(claim_key(&output)) {
                write_jpeg(&input, output, quality)
            } else {
                Err(ConvertError::OutputTaken {
                    path: input.clone(),
                    output,
                })
            }
        });
        report.record(&input, result);
    }

    report
}

/// Convert a single file or a whole folder.
pub fn convert_path(
    path: &Path,
    recursive: bool,
    output_dir: Option<&Path>,
    quality: u8,
) -> Result<ConversionReport, ConvertError> {
    if path.is_dir() {
        Ok(convert_folder(path, recursive, output_dir, quality))
    } else if path.is_file() {
        let mut report = ConversionReport::default();
        report.record(path, convert_file(path, output_dir, quality));
        Ok(report)
    } else {
        Err(ConvertError::NotFound(path.to_path_buf()))
    }
}
