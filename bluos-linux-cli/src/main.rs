//! bluos-linux
//!
//! Downloads the latest BluOS Controller for macOS and rebuilds it as a
//! Linux Snap and AppImage in `./dist`.

use std::path::PathBuf;
use std::process::ExitCode;

use bluos_linux_core::{
    Config, DownloadProgress, Layout, Pipeline, ReqwestSource, SystemRunner, DEFAULT_CONFIG_FILE,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Parser)]
#[command(name = "bluos-linux")]
#[command(author, version, about = "Repackage the BluOS Controller for Linux", long_about = None)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Directory the installer is downloaded to and unpacked in
    #[arg(short, long, default_value = ".")]
    work_dir: PathBuf,
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    tracing::info!("Starting bluos-linux v{}", bluos_linux_core::VERSION);

    let config = Config::load(&cli.config)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let http = ReqwestSource::new();
    let pipeline = Pipeline::new(&config, Layout::new(&cli.work_dir), &http, &SystemRunner);

    let progress = download_progress_bar();
    let result = runtime.block_on(pipeline.run(|p| report_progress(&progress, &p)));
    progress.finish_and_clear();

    result
}

/// Single-line byte counter, redrawn in place on every update.
fn download_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("Downloading... {bytes} complete ({bytes_per_sec})")
            .expect("Invalid progress bar template"),
    );
    pb
}

/// Clears the line as soon as the download lands, so later log lines are not
/// drawn under it.
fn report_progress(pb: &ProgressBar, progress: &DownloadProgress) {
    pb.set_position(progress.bytes_downloaded);

    if progress.finished {
        pb.finish_and_clear();
    }
}
