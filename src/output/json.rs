//! JSON output formatter for scan reports.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "groups": [
//!     { "hash": "af1349b9...", "files": ["/data/a.txt", "/data/b.txt"] },
//!     { "hash": "1f8ac10f...", "files": ["/data/c.txt"] }
//!   ],
//!   "summary": {
//!     "root": "/data",
//!     "total_files": 3,
//!     "processed_files": 3,
//!     "hashed_files": 3,
//!     "skipped_files": 0,
//!     "walk_errors": 0,
//!     "bytes_hashed": 3,
//!     "duration_ms": 2,
//!     "outcome": "completed",
//!     "duplicate_groups": 1,
//!     "duplicate_files": 1,
//!     "exit_code": 0,
//!     "exit_code_name": "DS000"
//!   }
//! }
//! ```
//!
//! `groups` holds every entry of the map in discovery order. Singletons are
//! present unless the scan dropped them.

use std::io::Write;

use serde::Serialize;

use crate::duplicates::{ScanReport, ScanSummary};
use crate::error::ExitCode;

/// A digest and its files.
#[derive(Debug, Clone, Serialize)]
pub struct JsonGroup {
    /// BLAKE3 digest as 64 hex characters
    pub hash: String,
    /// Files with this content, in discovery order
    pub files: Vec<String>,
}

/// Scan statistics plus derived counts.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    #[serde(flatten)]
    pub scan: ScanSummary,
    /// Groups holding two or more files
    pub duplicate_groups: usize,
    /// Redundant copies across all groups
    pub duplicate_files: usize,
    /// Process exit status
    pub exit_code: i32,
    /// Machine-readable exit code name (e.g. "DS000")
    pub exit_code_name: String,
}

/// Complete JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    pub groups: Vec<JsonGroup>,
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the document for `report`, which ends the run with `exit_code`.
    #[must_use]
    pub fn new(report: &ScanReport, exit_code: ExitCode) -> Self {
        let groups = report
            .duplicates
            .iter()
            .map(|(hash, files)| JsonGroup {
                hash: crate::scanner::hash_to_hex(hash),
                files: files
                    .iter()
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect(),
            })
            .collect();

        Self {
            groups,
            summary: JsonSummary {
                scan: report.summary.clone(),
                duplicate_groups: report.duplicates.duplicate_group_count(),
                duplicate_files: report.duplicates.duplicate_file_count(),
                exit_code: exit_code.as_i32(),
                exit_code_name: exit_code.code_prefix().to_string(),
            },
        }
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), JsonOutputError> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error writing JSON: {0}")]
    Io(#[from] std::io::Error),
}
