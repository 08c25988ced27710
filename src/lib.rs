//! dupescan - content-hash duplicate file scanner
//!
//! Walks a directory tree, hashes every regular file with BLAKE3 on a
//! background worker and groups files by digest. The caller stays
//! responsive: it receives one progress event per file, can cancel at any
//! time, and always gets exactly one final report, partial if cancelled.
//!
//! # Library use
//!
//! ```no_run
//! use dupescan::duplicates::{wait_for_report, EngineConfig, ScanController};
//! use dupescan::progress::NoProgress;
//! use std::path::Path;
//!
//! let mut controller = ScanController::new(EngineConfig::default());
//! let (_handle, events) = controller.start_scan(Path::new("/data")).unwrap();
//! let report = wait_for_report(&events, &NoProgress).unwrap();
//! controller.finish().unwrap();
//!
//! for (_, files) in report.duplicates.duplicate_groups() {
//!     println!("{:?}", files);
//! }
//! ```

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, Write};
use std::path::Path;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::cli::{Cli, Commands, OutputFormat, ScanArgs};
use crate::config::Settings;
use crate::duplicates::{ScanController, ScanEvent, ScanHandle, ScanReport};
use crate::error::ExitCode;
use crate::output::{JsonOutput, TextOutput};
use crate::progress::{Progress, ProgressCallback};
use crate::signal::InterruptFlag;

/// How often the event loop looks at the Ctrl+C flag while no event arrives.
const INTERRUPT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Run the command described by `cli`.
///
/// Logging must already be initialized.
///
/// # Errors
///
/// Fails if the settings cannot be loaded, the path is not a directory, the
/// worker cannot be started or dies, or the output cannot be written.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    if cli.no_color {
        yansi::disable();
    }

    let mut settings =
        Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Count(args) => {
            args.walk.apply(&mut settings);
            ensure_directory(&args.path)?;

            let count = scanner::count_files(&args.path, &settings.walker_config());
            writeln!(io::stdout().lock(), "{}", count).context("Failed to write output")?;
            Ok(ExitCode::Success)
        }
        Commands::Scan(args) => {
            args.apply(&mut settings);
            ensure_directory(&args.path)?;
            run_scan(&args, &settings, cli.quiet, cli.no_color)
        }
    }
}

fn ensure_directory(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Cannot access {}", path.display()))?;
    if !metadata.is_dir() {
        bail!("Not a directory: {}", path.display());
    }
    Ok(())
}

fn run_scan(args: &ScanArgs, settings: &Settings, quiet: bool, no_color: bool) -> Result<ExitCode> {
    log::debug!("Scan settings: {:?}", settings);

    let interrupt = signal::install_handler();
    let progress = Progress::new(quiet);
    let mut controller = ScanController::new(settings.engine_config());

    let (handle, events) = controller.start_scan(&args.path)?;
    let report = drive_scan(&events, &handle, &interrupt, &progress);
    controller.finish()?;

    let Some(report) = report else {
        bail!("Scan worker stopped without reporting a result");
    };

    let exit_code = ExitCode::for_report(&report);
    let mut stdout = io::stdout().lock();
    match args.output {
        OutputFormat::Json => JsonOutput::new(&report, exit_code)
            .write_to(&mut stdout)
            .context("Failed to write JSON output")?,
        OutputFormat::Text => TextOutput::new(&report)
            .with_unique(args.all)
            .with_color(!no_color)
            .write_to(&mut stdout)
            .context("Failed to write output")?,
    }

    Ok(exit_code)
}

/// Forward events to `progress` until the report arrives, turning Ctrl+C
/// into a cancel request.
fn drive_scan(
    events: &Receiver<ScanEvent>,
    handle: &ScanHandle,
    interrupt: &InterruptFlag,
    progress: &dyn ProgressCallback,
) -> Option<ScanReport> {
    loop {
        match events.recv_timeout(INTERRUPT_POLL_INTERVAL) {
            Ok(ScanEvent::Started { total, .. }) => progress.on_scan_start(total),
            Ok(ScanEvent::FileProcessed { count, path }) => {
                progress.on_file_processed(count, &path);
            }
            Ok(ScanEvent::Done(report)) => {
                progress.on_scan_end(&report.summary);
                return Some(report);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return None,
        }

        if interrupt.is_set() && !handle.is_cancel_requested() {
            log::info!("Interrupted, stopping scan");
            handle.request_cancel();
        }
    }
}
