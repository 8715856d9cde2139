use std::path::PathBuf;

use thiserror::Error;

use crate::encode::EncodeError;

/// Errors that abort a target-size search.
///
/// Not finding a quality that fits is not an error; see
/// [`super::CompressionOutcome::TargetUnreachable`].
#[derive(Debug, Error)]
pub enum CompressError {
    /// A precondition on the image, the target size or the bounds failed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A probe or the final encode failed.
    #[error(transparent)]
    Encoder(#[from] EncodeError),

    /// Writing or measuring the probe or output file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The caller's cancel token fired between probes.
    #[error("Compression cancelled")]
    Cancelled,
}

impl CompressError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| CompressError::Io { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = CompressError::InvalidInput("target size must be positive".into());
        assert_eq!(err.to_string(), "Invalid input: target size must be positive");

        let err = CompressError::from(EncodeError::EncodingFailed("boom".into()));
        assert_eq!(err.to_string(), "JPEG encoding failed: boom");

        let err = CompressError::io("/tmp/out.jpg")(std::io::Error::other("disk full"));
        assert_eq!(err.to_string(), "I/O error on /tmp/out.jpg: disk full");
    }
}
