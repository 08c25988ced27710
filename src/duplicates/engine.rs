//! One-shot hashing engine.
//!
//! # Overview
//!
//! A [`HashingEngine`] owns a single [`ScanJob`] and turns the files below
//! the job's root into a [`DuplicateMap`]:
//!
//! 1. **Enumerate** - walk the root once and keep the file list in memory
//! 2. **Hash** - stream every file through BLAKE3, one at a time
//! 3. **Report** - send exactly one [`ScanEvent::Done`] carrying the map
//!
//! Every step talks to the caller only through [`ScanEvent`]s on a channel,
//! and the only state shared with the caller is the job's cancellation flag.
//! [`HashingEngine::run`] consumes the engine, so a finished engine can never
//! be restarted with stale accumulators.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::map::DuplicateMap;
use crate::scanner::{HashError, Hasher, Walker, WalkerConfig, DEFAULT_BUFFER_SIZE};

/// Configuration shared by every engine a controller creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Walker configuration for enumeration.
    pub walker_config: WalkerConfig,
    /// Read buffer size for hashing.
    pub buffer_size: usize,
    /// Keep digests that only one file produced.
    pub retain_singletons: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            walker_config: WalkerConfig::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            retain_singletons: true,
        }
    }
}

impl EngineConfig {
    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the hashing buffer size. The hasher clamps it to
    /// [`MIN_BUFFER_SIZE`](crate::scanner::MIN_BUFFER_SIZE)..=[`MAX_BUFFER_SIZE`](crate::scanner::MAX_BUFFER_SIZE).
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Keep or drop singleton entries in the delivered map.
    #[must_use]
    pub fn with_retain_singletons(mut self, retain: bool) -> Self {
        self.retain_singletons = retain;
        self
    }
}

/// State of a single scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Created, not yet running.
    Idle,
    /// Enumerating or hashing.
    Running,
    /// Every enumerated file was processed.
    Completed,
    /// Stopped early because cancellation was requested.
    Cancelled,
}

/// How a scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanOutcome {
    /// Every enumerated file was processed.
    Completed,
    /// The scan stopped early; the results are partial.
    Cancelled,
}

/// Transient state of one enumerate-and-hash pass.
///
/// Owned by exactly one engine. The cancellation flag is the only part a
/// caller keeps a reference to; the progress counter never leaves the
/// worker.
#[derive(Debug)]
pub struct ScanJob {
    root: PathBuf,
    cancel: Arc<AtomicBool>,
    progress: usize,
}

impl ScanJob {
    /// Create a job for `root` observing `cancel`.
    #[must_use]
    pub fn new(root: &Path, cancel: Arc<AtomicBool>) -> Self {
        Self {
            root: root.to_path_buf(),
            cancel,
            progress: 0,
        }
    }

    /// Root directory of this job.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files processed so far.
    #[must_use]
    pub fn progress(&self) -> usize {
        self.progress
    }

    fn is_cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}

/// Statistics for one scan, delivered with the map.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    /// Normalized root that was scanned
    pub root: PathBuf,
    /// Files found by enumeration
    pub total_files: usize,
    /// Files processed (hashed or skipped)
    pub processed_files: usize,
    /// Files successfully hashed and recorded
    pub hashed_files: usize,
    /// Files that could not be read
    pub skipped_files: usize,
    /// Traversal errors (unreadable directories, symlink loops)
    pub walk_errors: usize,
    /// Bytes read while hashing
    pub bytes_hashed: u64,
    /// Wall-clock duration of the scan
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
    /// How the scan ended
    pub outcome: ScanOutcome,
}

impl ScanSummary {
    fn new(root: PathBuf) -> Self {
        Self {
            root,
            total_files: 0,
            processed_files: 0,
            hashed_files: 0,
            skipped_files: 0,
            walk_errors: 0,
            bytes_hashed: 0,
            duration: Duration::ZERO,
            outcome: ScanOutcome::Completed,
        }
    }

    /// Whether the scan was cancelled before finishing.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.outcome == ScanOutcome::Cancelled
    }

    /// Whether anything was skipped because it could not be read.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.skipped_files > 0 || self.walk_errors > 0
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Final result of a scan: the map, moved out of the worker, plus statistics.
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Files grouped by digest
    pub duplicates: DuplicateMap,
    /// Statistics about the scan
    pub summary: ScanSummary,
}

/// Notification sent from the worker to the caller.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// Enumeration finished; `total` bounds every later progress count.
    Started {
        /// Normalized root being scanned
        root: PathBuf,
        /// Number of files that will be processed
        total: usize,
    },
    /// One more file was processed (hashed or skipped).
    FileProcessed {
        /// Files processed so far, starting at 1
        count: usize,
        /// The file just processed
        path: PathBuf,
    },
    /// Terminal event, sent exactly once and always last.
    Done(ScanReport),
}

/// Hashes the files of one [`ScanJob`].
#[derive(Debug)]
pub struct HashingEngine {
    job: ScanJob,
    walker: Walker,
    hasher: Hasher,
    retain_singletons: bool,
    state: EngineState,
}

impl HashingEngine {
    /// Create an engine bound to `job`.
    #[must_use]
    pub fn new(job: ScanJob, config: &EngineConfig) -> Self {
        let walker = Walker::new(job.root(), config.walker_config.clone())
            .with_shutdown_flag(Arc::clone(&job.cancel));
        let hasher = Hasher::new()
            .with_buffer_size(config.buffer_size)
            .with_shutdown_flag(Arc::clone(&job.cancel));

        Self {
            job,
            walker,
            hasher,
            retain_singletons: config.retain_singletons,
            state: EngineState::Idle,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Run the scan to completion or cancellation.
    ///
    /// Sends [`ScanEvent::Started`], one [`ScanEvent::FileProcessed`] per
    /// file, then exactly one [`ScanEvent::Done`]. If the receiver goes away
    /// mid-scan the engine stops as if cancelled.
    pub fn run(mut self, events: &Sender<ScanEvent>) -> ScanOutcome {
        let start = Instant::now();
        self.state = EngineState::Running;

        let root = self.walker.root().to_path_buf();
        log::info!("Starting scan of {}", root.display());

        let mut summary = ScanSummary::new(root.clone());
        let files = self.enumerate(&mut summary);
        summary.total_files = files.len();

        let mut duplicates = DuplicateMap::new();
        if self.state == EngineState::Running {
            let started = ScanEvent::Started {
                root,
                total: files.len(),
            };
            if events.send(started).is_ok() {
                duplicates = self.process(files, events, &mut summary);
            } else {
                log::debug!("Event receiver dropped before hashing started");
                self.state = EngineState::Cancelled;
            }
        }

        if self.state == EngineState::Running {
            self.state = EngineState::Completed;
        }
        summary.outcome = match self.state {
            EngineState::Completed => ScanOutcome::Completed,
            _ => ScanOutcome::Cancelled,
        };
        summary.processed_files = self.job.progress;
        summary.duration = start.elapsed();

        log::info!(
            "Scan {}: {} of {} files processed, {} skipped, {} duplicate groups",
            if summary.is_cancelled() { "cancelled" } else { "complete" },
            summary.processed_files,
            summary.total_files,
            summary.skipped_files,
            duplicates.duplicate_group_count()
        );

        let result = summary.outcome;
        let report = ScanReport {
            duplicates,
            summary,
        };
        if events.send(ScanEvent::Done(report)).is_err() {
            log::debug!("Scan result dropped: receiver is gone");
        }

        result
    }

    /// Walk the root once, keeping the file list in memory.
    fn enumerate(&mut self, summary: &mut ScanSummary) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for result in self.walker.walk() {
            match result {
                Ok(path) => files.push(path),
                Err(_) => summary.walk_errors += 1,
            }
        }

        if self.job.is_cancel_requested() {
            log::debug!("Enumeration interrupted after {} files", files.len());
            self.state = EngineState::Cancelled;
        } else {
            log::debug!("Enumerated {} files", files.len());
        }
        files
    }

    /// Hash `files` in order, reporting each one.
    fn process(
        &mut self,
        files: Vec<PathBuf>,
        events: &Sender<ScanEvent>,
        summary: &mut ScanSummary,
    ) -> DuplicateMap {
        let mut duplicates = DuplicateMap::new();
        let mut buffer = vec![0u8; self.hasher.buffer_size()];

        for path in files {
            if self.job.is_cancel_requested() {
                log::debug!("Cancellation requested, stopping before {}", path.display());
                self.state = EngineState::Cancelled;
                break;
            }

            match self.hasher.hash_file_with_buffer(&path, &mut buffer) {
                Ok((hash, bytes)) => {
                    log::trace!("Hashed {}", path.display());
                    summary.hashed_files += 1;
                    summary.bytes_hashed += bytes;
                    duplicates.insert(hash, path.clone());
                }
                Err(HashError::Interrupted(_)) => {
                    self.state = EngineState::Cancelled;
                    break;
                }
                Err(e) => {
                    match e {
                        HashError::NotFound(_) => log::debug!("Skipping vanished file: {}", e),
                        _ => log::warn!("Skipping unreadable file: {}", e),
                    }
                    summary.skipped_files += 1;
                }
            }

            self.job.progress += 1;
            let event = ScanEvent::FileProcessed {
                count: self.job.progress,
                path,
            };
            if events.send(event).is_err() {
                log::debug!("Progress receiver dropped, stopping scan");
                self.state = EngineState::Cancelled;
                break;
            }
        }

        if !self.retain_singletons {
            duplicates.retain_duplicates();
        }
        duplicates
    }
}
