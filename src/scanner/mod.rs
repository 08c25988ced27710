//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Sequential, restartable directory walking using walkdir
//! - Streaming content hashing with BLAKE3
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: BLAKE3 file hashing (streaming)
//!
//! # Example
//!
//! ```no_run
//! use dupescan::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig {
//!     skip_hidden: true,
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(Path::new("."), config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(path) => println!("{}", path.display()),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::path::{Path, PathBuf};

// Re-export main types
pub use hasher::{
    hash_to_hex, Hash, Hasher, DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE, MIN_BUFFER_SIZE,
};
pub use walker::Walker;

/// Configuration for directory walking.
///
/// Controls filtering and symlink handling. Everything is off by default,
/// so a default walk visits every regular file below the root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    /// Cycles are detected and the looping link is not descended.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Glob patterns to ignore (gitignore-style).
    /// A matching directory is pruned together with everything below it.
    pub ignore_patterns: Vec<String>,
}

impl WalkerConfig {
    /// Create a new configuration from CLI arguments.
    #[must_use]
    pub fn new(follow_symlinks: bool, skip_hidden: bool, ignore_patterns: Vec<String>) -> Self {
        Self {
            follow_symlinks,
            skip_hidden,
            ignore_patterns,
        }
    }
}

/// Count the regular files below `root`.
///
/// This is the synchronous sizing query a caller runs before starting an
/// asynchronous scan. It re-walks the tree on every call.
///
/// # Example
///
/// ```no_run
/// use dupescan::scanner::{count_files, WalkerConfig};
/// use std::path::Path;
///
/// let total = count_files(Path::new("."), &WalkerConfig::default());
/// println!("{} files to hash", total);
/// ```
#[must_use]
pub fn count_files(root: &Path, config: &WalkerConfig) -> usize {
    Walker::new(root, config.clone()).files().count()
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A followed symlink points back at one of its ancestors.
    #[error("Symlink loop: {path} points to ancestor {ancestor}")]
    SymlinkLoop {
        /// The link that closes the cycle
        path: PathBuf,
        /// The ancestor directory it resolves to
        ancestor: PathBuf,
    },

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The path no longer refers to a regular file.
    #[error("Not a regular file: {0}")]
    NotAFile(PathBuf),

    /// Hashing was abandoned because cancellation was requested.
    #[error("Hashing interrupted: {0}")]
    Interrupted(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error raised while reading `path`.
    pub(crate) fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}
