//! Digest-to-paths grouping.
//!
//! [`DuplicateMap`] accumulates every hashed file under its digest. Paths
//! within an entry keep discovery order, and entries themselves iterate in
//! the order their digest was first seen.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::scanner::{hash_to_hex, Hash};

/// Mapping from content digest to the files sharing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateMap {
    entries: HashMap<Hash, Vec<PathBuf>>,
    /// Digests in first-discovery order
    order: Vec<Hash>,
}

impl DuplicateMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `path` under `hash`, appending to an existing entry if present.
    pub fn insert(&mut self, hash: Hash, path: PathBuf) {
        match self.entries.get_mut(&hash) {
            Some(paths) => paths.push(path),
            None => {
                self.order.push(hash);
                self.entries.insert(hash, vec![path]);
            }
        }
    }

    /// Number of distinct digests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no file has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Paths recorded under `hash`, in discovery order.
    #[must_use]
    pub fn get(&self, hash: &Hash) -> Option<&[PathBuf]> {
        self.entries.get(hash).map(Vec::as_slice)
    }

    /// Digest under which `path` was recorded.
    #[must_use]
    pub fn digest_of(&self, path: &Path) -> Option<&Hash> {
        self.order
            .iter()
            .find(|hash| self.entries[*hash].iter().any(|p| p == path))
    }

    /// All entries, singletons included, in first-discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (&Hash, &[PathBuf])> + '_ {
        self.order
            .iter()
            .map(move |hash| (hash, self.entries[hash].as_slice()))
    }

    /// Entries holding two or more files.
    pub fn duplicate_groups(&self) -> impl Iterator<Item = (&Hash, &[PathBuf])> + '_ {
        self.iter().filter(|(_, paths)| paths.len() > 1)
    }

    /// Total number of recorded files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Number of entries holding two or more files.
    #[must_use]
    pub fn duplicate_group_count(&self) -> usize {
        self.duplicate_groups().count()
    }

    /// Number of redundant copies (every file of a group except one).
    #[must_use]
    pub fn duplicate_file_count(&self) -> usize {
        self.duplicate_groups().map(|(_, paths)| paths.len() - 1).sum()
    }

    /// Drop singleton entries, keeping only actual duplicates.
    pub fn retain_duplicates(&mut self) {
        self.entries.retain(|_, paths| paths.len() > 1);
        let entries = &self.entries;
        self.order.retain(|hash| entries.contains_key(hash));
    }

    /// The partition of paths this map describes, independent of digest
    /// values and discovery order. Two scans grouped the same files the same
    /// way exactly when their groupings are equal.
    #[must_use]
    pub fn grouping(&self) -> BTreeSet<BTreeSet<PathBuf>> {
        self.entries
            .values()
            .map(|paths| paths.iter().cloned().collect())
            .collect()
    }

    /// Convert into owned groups in first-discovery order.
    #[must_use]
    pub fn into_groups(mut self) -> Vec<DuplicateGroup> {
        self.order
            .iter()
            .filter_map(|hash| {
                self.entries
                    .remove(hash)
                    .map(|files| DuplicateGroup { hash: *hash, files })
            })
            .collect()
    }
}

/// One digest together with the files that share it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// BLAKE3 digest of the shared content
    #[serde(serialize_with = "serialize_hash")]
    pub hash: Hash,
    /// Files with this content, in discovery order
    pub files: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Whether the group holds more than one file.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        self.files.len() > 1
    }

    /// Number of duplicate copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Hash as hexadecimal string.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hash_to_hex(&self.hash)
    }
}

fn serialize_hash<S: serde::Serializer>(hash: &Hash, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hash_to_hex(hash))
}
