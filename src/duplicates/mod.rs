//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Grouping files by content digest ([`map`])
//! - The one-shot hashing engine and its events ([`engine`])
//! - Running scans on a background worker with cancellation ([`controller`])

pub mod controller;
pub mod engine;
pub mod map;

pub use controller::{wait_for_report, ControlError, ScanController, ScanHandle};
pub use engine::{
    EngineConfig, EngineState, HashingEngine, ScanEvent, ScanJob, ScanOutcome, ScanReport,
    ScanSummary,
};
pub use map::{DuplicateGroup, DuplicateMap};
