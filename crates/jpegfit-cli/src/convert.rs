use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::Args;
use jpegfit_core::compress::{MAX_QUALITY, MIN_QUALITY};
use jpegfit_core::convert::convert_path;

use crate::config::Settings;
use crate::prompt::Prompter;
use crate::report::print_conversion;

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// File or folder to convert (prompted for when omitted)
    pub path: Option<PathBuf>,

    /// Descend into subfolders
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Write JPEGs here instead of beside each source file
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// JPEG quality (1-100)
    #[arg(long)]
    pub quality: Option<u8>,
}

pub fn run(args: ConvertArgs, settings: &Settings, prompter: &Prompter) -> Result<ExitCode> {
    let path = prompter.path(args.path, "File or folder path", "PATH")?;
    let quality = args.quality.unwrap_or(settings.convert_quality);
    if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
        bail!("quality must be within {MIN_QUALITY}..={MAX_QUALITY}, got {quality}");
    }

    let recursive = args.recursive || (path.is_dir() && prompter.confirm("Search subfolders?")?);
    let report = convert_path(&path, recursive, args.output_dir.as_deref(), quality)?;

    print_conversion(&report);
    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
