//! Output formatters for scan reports.
//!
//! - [`text`]: human-readable listing of duplicate groups
//! - [`json`]: machine-readable document for scripting
//!
//! # Example
//!
//! ```no_run
//! use dupescan::duplicates::{wait_for_report, EngineConfig, ScanController};
//! use dupescan::error::ExitCode;
//! use dupescan::output::{JsonOutput, TextOutput};
//! use dupescan::progress::NoProgress;
//! use std::path::Path;
//!
//! let mut controller = ScanController::new(EngineConfig::default());
//! let (_handle, events) = controller.start_scan(Path::new(".")).unwrap();
//! let report = wait_for_report(&events, &NoProgress).unwrap();
//!
//! print!("{}", TextOutput::new(&report).render().unwrap());
//! let json = JsonOutput::new(&report, ExitCode::for_report(&report));
//! println!("{}", json.to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod text;

pub use json::{JsonOutput, JsonOutputError};
pub use text::TextOutput;
