//! Process exit codes and structured error output.

use serde::Serialize;

use crate::duplicates::ScanReport;

/// Exit status of the `dupescan` binary.
///
/// - 0: scan finished and found duplicates
/// - 1: unexpected failure
/// - 2: scan finished and found no duplicates
/// - 3: scan finished but some files or directories could not be read
/// - 130: cancelled with Ctrl+C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Duplicates were found.
    Success = 0,
    /// Something went wrong before or around the scan.
    GeneralError = 1,
    /// Every file is unique.
    NoDuplicates = 2,
    /// Results are complete for what could be read, but something was skipped.
    PartialSuccess = 3,
    /// The scan was cancelled; results are partial.
    Interrupted = 130,
}

impl ExitCode {
    /// Exit status for a finished scan.
    ///
    /// Cancellation wins over skipped files, which win over the
    /// duplicates/no-duplicates distinction.
    #[must_use]
    pub fn for_report(report: &ScanReport) -> Self {
        if report.summary.is_cancelled() {
            Self::Interrupted
        } else if report.summary.has_errors() {
            Self::PartialSuccess
        } else if report.duplicates.duplicate_group_count() > 0 {
            Self::Success
        } else {
            Self::NoDuplicates
        }
    }

    /// Numeric process exit status.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Machine-readable code printed in error messages.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DS000",
            Self::GeneralError => "DS001",
            Self::NoDuplicates => "DS002",
            Self::PartialSuccess => "DS003",
            Self::Interrupted => "DS130",
        }
    }
}

/// Error report printed on stderr with `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// Code prefix, e.g. "DS001"
    pub code: String,
    /// Process exit status
    pub exit_code: i32,
    /// Error message including its context chain
    pub message: String,
    /// Whether the run was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Describe `err`, which ends the process with `exit_code`.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
