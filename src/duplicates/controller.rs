//! Background scan lifecycle.
//!
//! [`ScanController`] is the entry point a front end talks to. It spawns one
//! worker thread per scan, hands back a [`ScanHandle`] for cancellation and a
//! channel of [`ScanEvent`]s, and refuses to start a second scan while a
//! worker is still alive.
//!
//! # Example
//!
//! ```no_run
//! use dupescan::duplicates::{ScanController, ScanEvent, EngineConfig};
//! use std::path::Path;
//!
//! let mut controller = ScanController::new(EngineConfig::default());
//! let (handle, events) = controller.start_scan(Path::new(".")).unwrap();
//!
//! for event in events {
//!     match event {
//!         ScanEvent::FileProcessed { count, .. } if count >= 1000 => handle.request_cancel(),
//!         ScanEvent::Done(report) => {
//!             println!("{} duplicate groups", report.duplicates.duplicate_group_count());
//!             break;
//!         }
//!         _ => {}
//!     }
//! }
//!
//! controller.finish().unwrap();
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::engine::{EngineConfig, HashingEngine, ScanEvent, ScanJob, ScanReport};
use crate::progress::ProgressCallback;
use crate::scanner;

/// Name given to scan worker threads.
const WORKER_THREAD_NAME: &str = "dupescan-worker";

/// Errors from starting or tearing down a scan.
#[derive(thiserror::Error, Debug)]
pub enum ControlError {
    /// A scan worker is still alive.
    #[error("A scan is already in progress")]
    ScanInProgress,

    /// The worker thread could not be created.
    #[error("Failed to spawn scan worker: {0}")]
    Spawn(#[source] std::io::Error),

    /// The worker thread panicked instead of finishing.
    #[error("Scan worker panicked")]
    WorkerPanicked,
}

/// Cancellation handle for one scan.
///
/// Cloning shares the same flag. Requesting cancellation is idempotent and
/// harmless after the scan has finished.
#[derive(Debug, Clone)]
pub struct ScanHandle {
    cancel: Arc<AtomicBool>,
}

impl ScanHandle {
    fn new() -> Self {
        Self {
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Ask the worker to stop at its next checkpoint.
    pub fn request_cancel(&self) {
        if !self.cancel.swap(true, Ordering::SeqCst) {
            log::debug!("Scan cancellation requested");
        }
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}

struct ActiveScan {
    handle: ScanHandle,
    worker: JoinHandle<()>,
}

/// Starts scans on a dedicated worker thread, at most one at a time.
pub struct ScanController {
    config: EngineConfig,
    active: Option<ActiveScan>,
}

impl std::fmt::Debug for ScanController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanController")
            .field("config", &self.config)
            .field("active", &self.active.is_some())
            .finish()
    }
}

impl ScanController {
    /// Create a controller whose scans use `config`.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    /// Engine configuration used for new scans.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Count the files a scan of `root` would process.
    ///
    /// Synchronous; intended for sizing a progress range before
    /// [`ScanController::start_scan`].
    #[must_use]
    pub fn count_files(&self, root: &Path) -> usize {
        scanner::count_files(root, &self.config.walker_config)
    }

    /// Whether a worker is still alive.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|scan| !scan.worker.is_finished())
    }

    /// Start scanning `root` on a fresh worker thread.
    ///
    /// A worker that already finished is reaped first.
    ///
    /// # Errors
    ///
    /// - [`ControlError::ScanInProgress`] if a worker is still running; no
    ///   work is spawned
    /// - [`ControlError::Spawn`] if the thread cannot be created
    pub fn start_scan(
        &mut self,
        root: &Path,
    ) -> Result<(ScanHandle, Receiver<ScanEvent>), ControlError> {
        if self.is_active() {
            log::warn!("Refusing to start a scan of {}: one is already running", root.display());
            return Err(ControlError::ScanInProgress);
        }
        if let Err(e) = self.finish() {
            log::warn!("Previous scan ended abnormally: {}", e);
        }

        let handle = ScanHandle::new();
        let job = ScanJob::new(root, Arc::clone(&handle.cancel));
        let engine = HashingEngine::new(job, &self.config);
        let (tx, rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                engine.run(&tx);
            })
            .map_err(ControlError::Spawn)?;

        log::debug!("Spawned scan worker for {}", root.display());
        self.active = Some(ActiveScan {
            handle: handle.clone(),
            worker,
        });

        Ok((handle, rx))
    }

    /// Request cancellation of the active scan. No-op when idle.
    pub fn request_cancel(&self) {
        if let Some(scan) = &self.active {
            scan.handle.request_cancel();
        }
    }

    /// Wait for the worker to exit and release it.
    ///
    /// Blocks until the scan completes; call after [`ScanEvent::Done`] has
    /// been received, or use [`ScanController::cancel_and_wait`].
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::WorkerPanicked`] if the worker panicked.
    pub fn finish(&mut self) -> Result<(), ControlError> {
        match self.active.take() {
            Some(scan) => scan.worker.join().map_err(|_| ControlError::WorkerPanicked),
            None => Ok(()),
        }
    }

    /// Cancel the active scan, if any, and wait for its worker to exit.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::WorkerPanicked`] if the worker panicked.
    pub fn cancel_and_wait(&mut self) -> Result<(), ControlError> {
        self.request_cancel();
        self.finish()
    }
}

impl Drop for ScanController {
    fn drop(&mut self) {
        if let Err(e) = self.cancel_and_wait() {
            log::warn!("{}", e);
        }
    }
}

/// Consume `events` until the terminal report, forwarding progress to
/// `callback`.
///
/// Returns `None` only if the worker disappeared without reporting, which
/// happens if it panicked.
pub fn wait_for_report(
    events: &Receiver<ScanEvent>,
    callback: &dyn ProgressCallback,
) -> Option<ScanReport> {
    for event in events {
        match event {
            ScanEvent::Started { total, .. } => callback.on_scan_start(total),
            ScanEvent::FileProcessed { count, path } => callback.on_file_processed(count, &path),
            ScanEvent::Done(report) => {
                callback.on_scan_end(&report.summary);
                return Some(report);
            }
        }
    }
    None
}
