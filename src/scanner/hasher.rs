//! BLAKE3 file hasher with streaming support.
//!
//! # Overview
//!
//! This module provides the [`Hasher`] struct for computing BLAKE3 digests
//! of file contents. Files are read through a fixed-size buffer, so memory
//! use is independent of file size.
//!
//! # Example
//!
//! ```no_run
//! use dupescan::scanner::{hash_to_hex, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let digest = hasher.full_hash(Path::new("Cargo.toml")).unwrap();
//! println!("{}", hash_to_hex(&digest));
//! ```

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::HashError;

/// A BLAKE3 digest (32 bytes).
pub type Hash = [u8; 32];

/// Default read buffer size (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Smallest buffer the hasher will use.
pub const MIN_BUFFER_SIZE: usize = 4 * 1024;

/// Largest buffer the hasher will use (16 MiB).
pub const MAX_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// Streaming file hasher.
///
/// Cheap to construct; holds only its buffer size and an optional shutdown
/// flag. [`Hasher::hash_file`] allocates its read buffer per call, while
/// [`Hasher::hash_file_with_buffer`] lets the caller reuse one.
#[derive(Debug, Clone)]
pub struct Hasher {
    buffer_size: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default buffer size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            shutdown_flag: None,
        }
    }

    /// Use a different read buffer size, clamped to
    /// [`MIN_BUFFER_SIZE`]..=[`MAX_BUFFER_SIZE`].
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.clamp(MIN_BUFFER_SIZE, MAX_BUFFER_SIZE);
        self
    }

    /// Abandon the current file when `flag` becomes `true`.
    ///
    /// The flag is polled between buffer reads.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Configured read buffer size in bytes.
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Hash the entire content of a file.
    ///
    /// Returns the digest together with the number of bytes read.
    ///
    /// # Errors
    ///
    /// - [`HashError::NotFound`] / [`HashError::PermissionDenied`] if the file
    ///   cannot be opened
    /// - [`HashError::NotAFile`] if the path no longer names a regular file
    /// - [`HashError::Interrupted`] if shutdown was requested mid-read
    /// - [`HashError::Io`] for any other read failure
    pub fn hash_file(&self, path: &Path) -> Result<(Hash, u64), HashError> {
        let mut buffer = vec![0u8; self.buffer_size];
        self.hash_file_with_buffer(path, &mut buffer)
    }

    /// Like [`Hasher::hash_file`], reading through the caller's `buffer`.
    ///
    /// An empty `buffer` falls back to a freshly allocated one.
    ///
    /// # Errors
    ///
    /// See [`Hasher::hash_file`].
    pub fn hash_file_with_buffer(
        &self,
        path: &Path,
        buffer: &mut [u8],
    ) -> Result<(Hash, u64), HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;

        let metadata = file.metadata().map_err(|e| HashError::from_io(path, e))?;
        if !metadata.is_file() {
            return Err(HashError::NotAFile(path.to_path_buf()));
        }

        if buffer.is_empty() {
            return self.hash_reader(file, path);
        }
        self.hash_reader_with_buffer(file, path, buffer)
    }

    /// Hash the entire content of a file, discarding the byte count.
    ///
    /// # Errors
    ///
    /// See [`Hasher::hash_file`].
    pub fn full_hash(&self, path: &Path) -> Result<Hash, HashError> {
        self.hash_file(path).map(|(hash, _)| hash)
    }

    /// Stream `reader` through BLAKE3. `path` is only used for error reporting.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::Interrupted`] if shutdown was requested between
    /// reads, or [`HashError::Io`] if a read fails.
    pub fn hash_reader<R: Read>(&self, reader: R, path: &Path) -> Result<(Hash, u64), HashError> {
        let mut buffer = vec![0u8; self.buffer_size];
        self.hash_reader_with_buffer(reader, path, &mut buffer)
    }

    fn hash_reader_with_buffer<R: Read>(
        &self,
        mut reader: R,
        path: &Path,
        buffer: &mut [u8],
    ) -> Result<(Hash, u64), HashError> {
        let mut hasher = blake3::Hasher::new();
        let mut total: u64 = 0;

        loop {
            if self.is_shutdown_requested() {
                log::debug!("Abandoning hash of {} after {} bytes", path.display(), total);
                return Err(HashError::Interrupted(path.to_path_buf()));
            }

            let n = match reader.read(buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            };

            hasher.update(&buffer[..n]);
            total += n as u64;
        }

        Ok((*hasher.finalize().as_bytes(), total))
    }
}

/// Render a digest as 64 lowercase hex characters.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    blake3::Hash::from(*hash).to_hex().to_string()
}
