use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use jpegfit_core::compress::{
    compress_to_file, CompressOptions, CompressionOutcome, QualityBounds,
};
use jpegfit_core::{decode_path, megabytes_to_bytes, JpegQualityEncoder, BYTES_PER_MB};
use tracing::info;

use crate::config::Settings;
use crate::prompt::Prompter;
use crate::report::kilobytes;

/// Exit status when no quality in range fits the target.
pub const EXIT_UNREACHABLE: u8 = 2;

#[derive(Debug, Args)]
pub struct CompressArgs {
    /// Image to compress (prompted for when omitted)
    pub input: Option<PathBuf>,

    /// Maximum output size in MB
    #[arg(short, long)]
    pub target_mb: Option<f64>,

    /// Output path. Default: <input stem><suffix>.jpg beside the input
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Lowest quality the search may choose (1-100)
    #[arg(long)]
    pub min_quality: Option<u8>,

    /// Highest quality the search may choose (1-100)
    #[arg(long)]
    pub max_quality: Option<u8>,

    /// Try the highest quality first and stop if it already fits
    #[arg(long, default_value_t = false)]
    pub fast: bool,
}

/// `<dir>/<stem><suffix>.jpg`
pub fn default_output(input: &Path, suffix: &str) -> PathBuf {
    let mut name = input.file_stem().unwrap_or_default().to_os_string();
    name.push(suffix);
    name.push(".jpg");
    input.with_file_name(name)
}

/// Convert `--target-mb` to bytes, telling apart sizes that are too small
/// from ones too large to count.
pub fn target_bytes(target_mb: f64) -> Result<u64> {
    if target_mb.is_finite() && target_mb > 0.0 {
        megabytes_to_bytes(target_mb).ok_or_else(|| {
            if target_mb * BYTES_PER_MB < 1.0 {
                anyhow!("target size {target_mb} MB is less than one byte")
            } else {
                anyhow!("target size {target_mb} MB does not fit in a 64-bit byte count")
            }
        })
    } else {
        bail!("target size must be a positive number of MB, got {target_mb}")
    }
}

pub fn run(args: CompressArgs, settings: &Settings, prompter: &Prompter) -> Result<ExitCode> {
    let input = prompter.path(args.input, "Path to image", "INPUT")?;
    if !input.is_file() {
        bail!("file not found: {}", input.display());
    }

    let target_mb = match args.target_mb {
        Some(mb) => mb,
        None => prompter.megabytes(settings.target_mb)?,
    };
    let target = target_bytes(target_mb)?;

    let bounds = QualityBounds::new(
        args.min_quality.unwrap_or(settings.min_quality),
        args.max_quality.unwrap_or(settings.max_quality),
    )?;
    let options = CompressOptions {
        bounds,
        probe_ceiling_first: args.fast || settings.fast,
        cancel: None,
    };
    let output = args
        .output
        .unwrap_or_else(|| default_output(&input, &settings.suffix));

    let image = decode_path(&input).with_context(|| format!("failed to open {}", input.display()))?;
    info!(
        width = image.width,
        height = image.height,
        target_bytes = target,
        "searching quality {}..={}",
        bounds.low(),
        bounds.high()
    );

    let outcome = compress_to_file(&image, target, &options, JpegQualityEncoder, &output)
        .with_context(|| format!("failed to compress {}", input.display()))?;

    match outcome {
        CompressionOutcome::Compressed(done) => {
            println!(
                "Saved: {} ({}) at quality {} after {} probes",
                done.output.display(),
                kilobytes(done.size_bytes),
                done.quality,
                done.probes
            );
            Ok(ExitCode::SUCCESS)
        }
        CompressionOutcome::TargetUnreachable {
            smallest_size_bytes,
            ..
        } => {
            println!(
                "Could not compress below {}: quality {} still produces {}",
                kilobytes(target),
                bounds.low(),
                kilobytes(smallest_size_bytes)
            );
            Ok(ExitCode::from(EXIT_UNREACHABLE))
        }
    }
}
