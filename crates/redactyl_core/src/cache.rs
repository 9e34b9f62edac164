//! Incremental content-hash cache.
//!
//! The cache maps repository-relative paths to a 16-hex digest of their last
//! scanned content. A hit lets the coordinator skip the backend entirely for
//! that file. The cache is purely advisory: a missing or corrupt file costs
//! performance, never correctness, so every load failure degrades to an
//! empty map.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

use crate::fs_util::atomic_write;

/// Cache filename at the repository root when no `.git` directory exists.
pub const CACHE_FILENAME: &str = ".redactylcache.json";

/// Cache filename inside the `.git` directory.
const GIT_CACHE_FILENAME: &str = "redactylcache.json";

/// Digest reported for empty content.
const EMPTY_DIGEST: &str = "0000000000000000";

/// Hashes content with a fast 64-bit non-cryptographic hash, formatted as
/// 16 lowercase hex characters. Empty input yields all zeros.
#[must_use]
pub fn fast_hash(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return EMPTY_DIGEST.to_string();
    }
    format!("{:016x}", xxh64(bytes, 0))
}

/// Returns where the cache lives for `root`: under `.git/` when the
/// repository has one, else at the root itself.
#[must_use]
pub fn cache_path(root: &Path) -> PathBuf {
    let git_dir = root.join(".git");
    if git_dir.is_dir() {
        git_dir.join(GIT_CACHE_FILENAME)
    } else {
        root.join(CACHE_FILENAME)
    }
}

/// The persisted path → digest map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentCache {
    /// Relative path → 16-hex xxh64 digest of the file content.
    #[serde(default)]
    pub entries: BTreeMap<String, String>,
}

impl ContentCache {
    /// Loads the cache from disk; any failure yields an empty cache.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };

        match serde_json::from_str(&content) {
            Ok(cache) => cache,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(path = %path.display(), error = %_e, "discarding corrupt cache");
                Self::default()
            }
        }
    }

    /// Returns `true` when `path` is cached with exactly `digest`.
    #[must_use]
    pub fn hit(&self, path: &str, digest: &str) -> bool {
        self.entries.get(path).is_some_and(|cached| cached == digest)
    }

    /// Records a digest for a path.
    pub fn insert(&mut self, path: impl Into<String>, digest: impl Into<String>) {
        self.entries.insert(path.into(), digest.into());
    }

    /// Merges a staging map produced during a scan into this cache.
    pub fn merge(&mut self, staged: BTreeMap<String, String>) {
        self.entries.extend(staged);
    }

    /// Atomically persists the cache as JSON.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string(self).map_err(io::Error::other)?;
        atomic_write(path, json.as_bytes())
    }

    /// Number of cached paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
