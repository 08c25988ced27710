//! Command-line interface definitions for dupescan.
//!
//! Global options control verbosity, colour and error format; subcommands
//! pick the operation.
//!
//! # Example
//!
//! ```bash
//! # List duplicate groups below ~/Downloads
//! dupescan scan ~/Downloads
//!
//! # Machine-readable output
//! dupescan scan ~/Downloads --output json
//!
//! # How many files would be hashed
//! dupescan count ~/Downloads --skip-hidden
//!
//! # Debug logging
//! dupescan -v scan ~/Downloads
//! ```

use bytesize::ByteSize;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::Settings;
use crate::scanner::MAX_BUFFER_SIZE;

/// Find duplicate files by content hash.
///
/// dupescan walks a directory, hashes every regular file with BLAKE3 and
/// reports the files that share identical content. Press Ctrl+C to stop
/// early and get the groups found so far.
#[derive(Debug, Parser)]
#[command(name = "dupescan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    ///
    /// Also set by a `NO_COLOR` environment variable with any value other
    /// than an empty string, `0`, `false`, `no`, `off`.
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Read settings from this TOML file instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory for duplicate files
    Scan(ScanArgs),
    /// Count the files a scan would hash
    Count(CountArgs),
}

/// Traversal options shared by `scan` and `count`.
#[derive(Debug, Clone, Default, Args)]
pub struct WalkArgs {
    /// Glob patterns to ignore (can be specified multiple times)
    ///
    /// Added to any patterns from the config file.
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Follow symbolic links during scan
    ///
    /// Links that loop back to an ancestor are reported and not descended.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,
}

impl WalkArgs {
    /// Layer these flags over `settings`. Flags only ever switch options on.
    pub fn apply(&self, settings: &mut Settings) {
        settings.follow_symlinks |= self.follow_symlinks;
        settings.skip_hidden |= self.skip_hidden;
        settings
            .ignore_patterns
            .extend(self.ignore_patterns.iter().cloned());
    }
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory path to scan for duplicates
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    #[command(flatten)]
    pub walk: WalkArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Leave files with unique content out of the results
    #[arg(long)]
    pub drop_singletons: bool,

    /// Read buffer size for hashing (e.g., 64KiB, 1MiB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB. At most 16 MiB;
    /// values below 4 KiB are raised to 4 KiB.
    #[arg(long, value_name = "SIZE", value_parser = parse_buffer_size)]
    pub buffer_size: Option<usize>,

    /// Also list files whose content is unique (text output)
    #[arg(short, long)]
    pub all: bool,
}

impl ScanArgs {
    /// Layer these flags over `settings`.
    pub fn apply(&self, settings: &mut Settings) {
        self.walk.apply(settings);
        if self.drop_singletons {
            settings.retain_singletons = false;
        }
        if let Some(size) = self.buffer_size {
            settings.buffer_size = size;
        }
    }
}

/// Arguments for the count subcommand.
#[derive(Debug, Args)]
pub struct CountArgs {
    /// Directory path to count
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    #[command(flatten)]
    pub walk: WalkArgs,
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report
    Text,
    /// JSON output for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a `--buffer-size` value such as `4096`, `64KiB` or `1.5MB` into bytes.
///
/// Units are case-insensitive and a bare number means bytes. The result must
/// be non-zero and at most [`MAX_BUFFER_SIZE`].
///
/// # Examples
///
/// ```
/// use dupescan::cli::parse_buffer_size;
///
/// assert_eq!(parse_buffer_size("4096").unwrap(), 4096);
/// assert_eq!(parse_buffer_size("64KiB").unwrap(), 65_536);
/// assert!(parse_buffer_size("1GiB").is_err());
/// ```
///
/// # Errors
///
/// Returns a message for clap to show when the value is malformed, has an
/// unknown unit, or falls outside the accepted range.
pub fn parse_buffer_size(value: &str) -> Result<usize, String> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    if number.is_empty() {
        return Err(format!("Expected a number of bytes, got '{value}'"));
    }

    let unit: u64 = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" => 1_000,
        "kib" => 1 << 10,
        "m" | "mb" => 1_000_000,
        "mib" => 1 << 20,
        "g" | "gb" => 1_000_000_000,
        "gib" => 1 << 30,
        other => return Err(format!("Unknown size unit '{other}'")),
    };

    let bytes = match number.parse::<u64>() {
        Ok(whole) => whole.checked_mul(unit),
        Err(_) => {
            let fraction: f64 = number
                .parse()
                .map_err(|_| format!("Invalid number '{number}'"))?;
            let bytes = (fraction * unit as f64).round();
            // None means out of range, reported below
            (bytes <= MAX_BUFFER_SIZE as f64).then_some(bytes as u64)
        }
    };

    match bytes {
        Some(0) => Err("Buffer size must be greater than zero".to_string()),
        Some(bytes) if bytes <= MAX_BUFFER_SIZE as u64 => Ok(bytes as usize),
        _ => Err(format!(
            "Buffer size must be at most {}",
            ByteSize::b(MAX_BUFFER_SIZE as u64)
        )),
    }
}
