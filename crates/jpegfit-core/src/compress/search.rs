//! Bisection over encoder quality.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::probe::ProbeFile;
use super::{CompressError, QualityBounds};
use crate::decode::DecodedImage;
use crate::encode::QualityEncoder;

/// Shared flag a caller can flip to stop a running search.
///
/// The search checks it before every probe encode.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Knobs for a single search.
#[derive(Debug, Clone, Default)]
pub struct CompressOptions {
    pub bounds: QualityBounds,
    /// Probe the upper bound first and stop there if it already fits.
    pub probe_ceiling_first: bool,
    pub cancel: Option<CancelToken>,
}

impl CompressOptions {
    pub fn with_bounds(bounds: QualityBounds) -> Self {
        Self {
            bounds,
            ..Self::default()
        }
    }
}

/// A successful search: the chosen quality and what it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compressed<T> {
    pub quality: u8,
    pub size_bytes: u64,
    /// Probe encodes performed, not counting the final encode.
    pub probes: u32,
    pub output: T,
}

/// Result of a search that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressionOutcome<T> {
    Compressed(Compressed<T>),
    /// Every quality in range encoded above the target. Nothing was written.
    TargetUnreachable {
        probes: u32,
        /// Size at the lowest quality in range.
        smallest_size_bytes: u64,
    },
}

impl<T> CompressionOutcome<T> {
    pub fn quality(&self) -> Option<u8> {
        match self {
            Self::Compressed(c) => Some(c.quality),
            Self::TargetUnreachable { .. } => None,
        }
    }

    pub fn probes(&self) -> u32 {
        match self {
            Self::Compressed(c) => c.probes,
            Self::TargetUnreachable { probes, .. } => *probes,
        }
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self, Self::Compressed(_))
    }
}

/// Bounds and best-so-far for one bisection.
#[derive(Debug)]
struct SearchState {
    low: u8,
    high: u8,
    best: Option<u8>,
    probes: u32,
    /// Size of the lowest quality probed so far.
    floor: Option<(u8, u64)>,
}

impl SearchState {
    fn new(bounds: QualityBounds) -> Self {
        Self {
            low: bounds.low(),
            high: bounds.high(),
            best: None,
            probes: 0,
            floor: None,
        }
    }

    fn next_quality(&self) -> Option<u8> {
        (self.low <= self.high).then(|| self.low + (self.high - self.low) / 2)
    }

    fn record(&mut self, quality: u8, size: u64, target: u64) {
        self.probes += 1;
        if self.floor.map_or(true, |(q, _)| quality < q) {
            self.floor = Some((quality, size));
        }

        let fits = size <= target;
        debug!(quality, size_bytes = size, fits, "probe");
        // Bounds start at MIN_QUALITY, so `quality - 1` cannot underflow.
        if fits {
            self.best = Some(quality);
            self.low = quality + 1;
        } else {
            self.high = quality - 1;
        }
    }
}

fn validate(image: &DecodedImage, target_size_bytes: u64) -> Result<(), CompressError> {
    if target_size_bytes == 0 {
        return Err(CompressError::InvalidInput(
            "target size must be greater than zero".to_string(),
        ));
    }
    image
        .validate()
        .map_err(|e| CompressError::InvalidInput(e.to_string()))
}

/// Drive the bisection. `probe` encodes at a quality and returns the
/// measured size.
fn bisect<F>(
    target_size_bytes: u64,
    options: &CompressOptions,
    mut probe: F,
) -> Result<SearchState, CompressError>
where
    F: FnMut(u8) -> Result<u64, CompressError>,
{
    let mut state = SearchState::new(options.bounds);
    let cancelled = || {
        options
            .cancel
            .as_ref()
            .is_some_and(CancelToken::is_cancelled)
    };

    if options.probe_ceiling_first {
        if cancelled() {
            return Err(CompressError::Cancelled);
        }
        let high = state.high;
        let size = probe(high)?;
        state.record(high, size, target_size_bytes);
    }

    while let Some(quality) = state.next_quality() {
        if cancelled() {
            return Err(CompressError::Cancelled);
        }
        let size = probe(quality)?;
        state.record(quality, size, target_size_bytes);
    }

    Ok(state)
}

fn unreachable_outcome<T>(state: &SearchState) -> CompressionOutcome<T> {
    let smallest_size_bytes = state.floor.map(|(_, size)| size).unwrap_or_default();
    info!(
        probes = state.probes,
        smallest_size_bytes, "no quality in range fits the target"
    );
    CompressionOutcome::TargetUnreachable {
        probes: state.probes,
        smallest_size_bytes,
    }
}

/// Find the highest quality whose encoding fits in `target_size_bytes` and
/// write that encoding to `output`.
///
/// Each probe is written to `<output>.temp.jpg` and measured on disk. The
/// probe file is removed on every exit path, including errors and
/// cancellation, and a stale one left by an earlier crash is removed too.
/// `output` is only written when a quality fits, overwriting any existing
/// file.
///
/// The search assumes encoded size never grows as quality drops. Standard
/// lossy codecs behave that way; if an encoder doesn't, the search still
/// finishes within [`QualityBounds::max_probes`] probes but the quality it
/// returns may not be the highest one that fits.
#[instrument(skip(image, options, encoder, output), fields(width = image.width, height = image.height, output = %output.display()))]
pub fn compress_to_file<E: QualityEncoder>(
    image: &DecodedImage,
    target_size_bytes: u64,
    options: &CompressOptions,
    encoder: E,
    output: &Path,
) -> Result<CompressionOutcome<PathBuf>, CompressError> {
    let probe_file = ProbeFile::for_output(output);
    validate(image, target_size_bytes)?;

    let state = bisect(target_size_bytes, options, |quality| {
        let bytes = encoder.encode(image, quality)?;
        probe_file.write(&bytes)
    })?;

    let Some(quality) = state.best else {
        return Ok(unreachable_outcome(&state));
    };

    let bytes = encoder.encode(image, quality)?;
    fs::write(output, &bytes).map_err(CompressError::io(output))?;
    let size_bytes = fs::metadata(output)
        .map_err(CompressError::io(output))?
        .len();

    info!(quality, size_bytes, probes = state.probes, "compressed");
    Ok(CompressionOutcome::Compressed(Compressed {
        quality,
        size_bytes,
        probes: state.probes,
        output: output.to_path_buf(),
    }))
}

/// In-memory variant of [`compress_to_file`].
///
/// Probes are measured by their encoded length and nothing touches the
/// filesystem. The bytes of the winning probe are returned directly; the
/// encoder is deterministic, so they are the bytes a fresh encode at that
/// quality would produce.
#[instrument(skip(image, options, encoder), fields(width = image.width, height = image.height))]
pub fn compress_to_bytes<E: QualityEncoder>(
    image: &DecodedImage,
    target_size_bytes: u64,
    options: &CompressOptions,
    encoder: E,
) -> Result<CompressionOutcome<Vec<u8>>, CompressError> {
    validate(image, target_size_bytes)?;

    let mut winner: Option<Vec<u8>> = None;
    let state = bisect(target_size_bytes, options, |quality| {
        let bytes = encoder.encode(image, quality)?;
        let size = bytes.len() as u64;
        if size <= target_size_bytes {
            winner = Some(bytes);
        }
        Ok(size)
    })?;

    match (state.best, winner) {
        (Some(quality), Some(bytes)) => {
            let size_bytes = bytes.len() as u64;
            info!(quality, size_bytes, probes = state.probes, "compressed");
            Ok(CompressionOutcome::Compressed(Compressed {
                quality,
                size_bytes,
                probes: state.probes,
                output: bytes,
            }))
        }
        _ => Ok(unreachable_outcome(&state)),
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::encode::EncodeError;
    use proptest::prelude::*;

    /// Encoder backed by a non-decreasing size table indexed by quality.
    struct TableEncoder(Vec<usize>);

    impl QualityEncoder for TableEncoder {
        fn encode(&self, _image: &DecodedImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
            Ok(vec![0u8; self.0[quality as usize]])
        }
    }

    fn table_strategy() -> impl Strategy<Value = Vec<usize>> {
        prop::collection::vec(0usize..=40, 101).prop_map(|steps| {
            steps
                .iter()
                .scan(1usize, |acc, step| {
                    *acc += step;
                    Some(*acc)
                })
                .collect()
        })
    }

    fn bounds_strategy() -> impl Strategy<Value = QualityBounds> {
        (1u8..=100, 1u8..=100).prop_map(|(a, b)| QualityBounds::new(a.min(b), a.max(b)).unwrap())
    }

    proptest! {
        /// The returned quality is the highest one in range that fits.
        #[test]
        fn prop_returns_highest_fitting_quality(
            table in table_strategy(),
            bounds in bounds_strategy(),
            target in 1u64..=2_500,
            ceiling_first in any::<bool>(),
        ) {
            let expected = (bounds.low()..=bounds.high())
                .rev()
                .find(|&q| table[q as usize] as u64 <= target);

            let image = DecodedImage::new(1, 1, vec![0, 0, 0]);
            let options = CompressOptions {
                bounds,
                probe_ceiling_first: ceiling_first,
                cancel: None,
            };
            let outcome = compress_to_bytes(&image, target, &options, TableEncoder(table.clone())).unwrap();

            prop_assert_eq!(outcome.quality(), expected);
            if let CompressionOutcome::Compressed(c) = &outcome {
                prop_assert!(c.size_bytes <= target);
                if c.quality < bounds.high() {
                    prop_assert!(table[c.quality as usize + 1] as u64 > target);
                }
            }
        }

        /// Plain bisection never exceeds the worst-case probe count.
        #[test]
        fn prop_probe_count_is_logarithmic(
            table in table_strategy(),
            bounds in bounds_strategy(),
            target in 1u64..=2_500,
        ) {
            let image = DecodedImage::new(1, 1, vec![0, 0, 0]);
            let options = CompressOptions::with_bounds(bounds);
            let outcome = compress_to_bytes(&image, target, &options, TableEncoder(table)).unwrap();

            prop_assert!(outcome.probes() <= bounds.max_probes());
            prop_assert!(outcome.probes() >= 1);
        }
    }
}
