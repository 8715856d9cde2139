mod compress;
mod config;
mod convert;
mod prompt;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::Settings;
use prompt::Prompter;

#[derive(Parser)]
#[command(
    name = "jpegfit",
    version,
    about = "Fit images under a target file size as JPEG"
)]
struct Cli {
    /// More log output on stderr (-v info, -vv probe-by-probe debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Extra config file layered over the user config
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Never prompt; fail when a required argument is missing
    #[arg(long, global = true, default_value_t = false)]
    no_input: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the highest JPEG quality that fits under a size and save it
    Compress(compress::CompressArgs),

    /// Convert an image, or every image in a folder, to JPEG
    Convert(convert::ConvertArgs),
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("jpegfit={level},jpegfit_core={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let settings = Settings::load(cli.config.as_deref()).context("failed to load configuration")?;
    let prompter = Prompter::detect(cli.no_input);

    match cli.cmd {
        Commands::Compress(args) => compress::run(args, &settings, &prompter),
        Commands::Convert(args) => convert::run(args, &settings, &prompter),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
