//! The transient probe file used while searching.

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::warn;

use super::CompressError;

const PROBE_SUFFIX: &str = ".temp.jpg";

/// Probe path for a given output: `<output>.temp.jpg`.
pub fn probe_path_for(output: &Path) -> PathBuf {
    let mut name = OsString::from(output.as_os_str());
    name.push(PROBE_SUFFIX);
    PathBuf::from(name)
}

/// Owns the probe path for the duration of one search and removes it on
/// drop, whichever way the search exits.
pub(crate) struct ProbeFile {
    path: PathBuf,
}

impl ProbeFile {
    pub(crate) fn for_output(output: &Path) -> Self {
        Self {
            path: probe_path_for(output),
        }
    }

    /// Overwrite the probe with `bytes` and return its size on disk.
    pub(crate) fn write(&self, bytes: &[u8]) -> Result<u64, CompressError> {
        fs::write(&self.path, bytes).map_err(CompressError::io(&self.path))?;
        fs::metadata(&self.path)
            .map(|meta| meta.len())
            .map_err(CompressError::io(&self.path))
    }
}

impl Drop for ProbeFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove probe file"),
        }
    }
}
