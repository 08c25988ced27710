//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for enumerating every regular
//! file below a root directory. The walk is lazy, sequential and restartable:
//! each call to [`Walker::walk`] re-reads the tree from scratch.
//!
//! # Features
//!
//! - Siblings are visited in file-name order, so repeated walks agree
//! - Symlinks are skipped unless following is enabled; followed links are
//!   checked against their ancestors and loops are reported, not descended
//! - Gitignore-style pattern matching via the `ignore` crate
//! - Hidden file filtering
//! - Early termination via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use dupescan::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default());
//! let files: Vec<_> = walker.files().collect();
//! println!("Found {} files", files.len());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use walkdir::{DirEntry, WalkDir};

use super::{ScanError, WalkerConfig};

/// Directory walker for file discovery.
///
/// Holds no state between walks beyond its configuration.
#[derive(Debug, Clone)]
pub struct Walker {
    /// Canonicalized root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for early termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// The root is canonicalized so that every yielded path is absolute.
    /// A root that cannot be canonicalized is kept as given; walking it then
    /// reports the underlying error and yields no files.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: normalize_root(path),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for early termination.
    ///
    /// When the flag is set to `true`, iteration stops before the next entry.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The normalized root this walker enumerates.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Build the ignore matcher from the configured patterns.
    fn build_gitignore(&self) -> Option<Gitignore> {
        if self.config.ignore_patterns.is_empty() {
            return None;
        }

        let mut builder = GitignoreBuilder::new(&self.root);
        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if !gitignore.is_empty() => Some(gitignore),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    /// Walk the directory tree, yielding regular file paths.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. A missing root or a root that is not a directory yields a
    /// single error and no files.
    pub fn walk(&self) -> impl Iterator<Item = Result<PathBuf, ScanError>> + '_ {
        let root_error = match std::fs::metadata(&self.root) {
            Ok(metadata) if metadata.is_dir() => None,
            Ok(_) => {
                log::warn!("Scan root is not a directory: {}", self.root.display());
                Some(ScanError::NotADirectory(self.root.clone()))
            }
            Err(e) => Some(self.classify_io_error(&self.root, e)),
        };

        let entries = if root_error.is_none() {
            let gitignore = self.build_gitignore();
            let root = self.root.clone();
            let skip_hidden = self.config.skip_hidden;

            let walk = WalkDir::new(&self.root)
                .follow_links(self.config.follow_symlinks)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(move |entry| keep_entry(entry, &root, skip_hidden, &gitignore));
            Some(walk)
        } else {
            None
        };

        root_error.into_iter().map(Err).chain(
            entries
                .into_iter()
                .flatten()
                .take_while(move |_| {
                    if self.is_shutdown_requested() {
                        log::debug!("Walker: Shutdown requested, stopping iteration");
                        false
                    } else {
                        true
                    }
                })
                .filter_map(move |result| match result {
                    Ok(entry) => self.process_entry(entry).map(Ok),
                    Err(e) => Some(Err(self.handle_walk_error(e))),
                }),
        )
    }

    /// Walk the tree yielding only readable regular files.
    ///
    /// Traversal errors are logged by [`Walker::walk`] and dropped here.
    pub fn files(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.walk().filter_map(Result::ok)
    }

    fn process_entry(&self, entry: DirEntry) -> Option<PathBuf> {
        if entry.depth() == 0 {
            return None;
        }

        let file_type = entry.file_type();
        if file_type.is_file() {
            return Some(entry.into_path());
        }

        if file_type.is_symlink() {
            log::trace!("Skipping symlink: {}", entry.path().display());
        } else if !file_type.is_dir() {
            log::trace!("Skipping special file: {}", entry.path().display());
        }
        None
    }

    fn handle_walk_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);

        if let Some(ancestor) = error.loop_ancestor() {
            let ancestor = ancestor.to_path_buf();
            log::warn!(
                "Not descending into symlink loop {} -> {}",
                path.display(),
                ancestor.display()
            );
            return ScanError::SymlinkLoop { path, ancestor };
        }

        let source = error
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
        self.classify_io_error(&path, source)
    }

    fn classify_io_error(&self, path: &Path, error: std::io::Error) -> ScanError {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => {
                log::warn!("Permission denied: {}", path.display());
                ScanError::PermissionDenied(path.to_path_buf())
            }
            ErrorKind::NotFound => {
                log::debug!("Path not found (may have been deleted): {}", path.display());
                ScanError::NotFound(path.to_path_buf())
            }
            _ => {
                log::warn!("I/O error for {}: {}", path.display(), error);
                ScanError::Io {
                    path: path.to_path_buf(),
                    source: error,
                }
            }
        }
    }
}

/// Canonicalize the root, falling back to the path as given.
fn normalize_root(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Decide whether an entry (and, for directories, its subtree) is visited.
fn keep_entry(entry: &DirEntry, root: &Path, skip_hidden: bool, gitignore: &Option<Gitignore>) -> bool {
    if entry.depth() == 0 {
        return true;
    }

    if skip_hidden && entry.file_name().to_string_lossy().starts_with('.') {
        log::trace!("Skipping hidden entry: {}", entry.path().display());
        return false;
    }

    if let Some(gi) = gitignore {
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if gi.matched(relative, entry.file_type().is_dir()).is_ignore() {
            log::trace!("Ignoring: {}", entry.path().display());
            return false;
        }
    }

    true
}
