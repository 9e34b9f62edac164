//! The `GitProvider` seam.
//!
//! Staged, history, and base-branch enumeration all go through this trait so
//! the engine never shells out to `git` itself. The CLI crate supplies the
//! subprocess-backed implementation; tests supply in-memory fakes.

use std::path::Path;

use crate::error::ScanError;

/// One changed file with the content to scan.
///
/// For staged and history modes the bytes are the full blob; for base-branch
/// mode they are only the added lines of the file's unified diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    /// Repository-relative path.
    pub path: String,
    /// Content to scan.
    pub bytes: Vec<u8>,
}

/// A commit and the files it changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitEntry {
    /// Full commit hash.
    pub id: String,
    /// Author identity as reported by git.
    pub author: String,
    /// Changed files with their blob content at this commit.
    pub files: Vec<DiffEntry>,
}

/// Best-effort repository metadata for the upload envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoInfo {
    /// Remote URL or repository slug, when discoverable.
    pub repo: Option<String>,
    /// HEAD commit hash.
    pub commit: Option<String>,
    /// Current branch name.
    pub branch: Option<String>,
}

/// Access to git state for the enumeration modes that need it.
pub trait GitProvider {
    /// Returns `(path, blob)` pairs for files staged in the index.
    fn staged_diff(&self, root: &Path) -> Result<Vec<DiffEntry>, ScanError>;

    /// Returns the last `n` commits with their changed files.
    fn last_n_commits(&self, root: &Path, n: usize) -> Result<Vec<CommitEntry>, ScanError>;

    /// Returns per-file added-line content of the diff against `base`.
    ///
    /// Each entry's bytes are the concatenated `+`-prefixed lines of the
    /// file's zero-context unified diff, excluding headers and hunk markers.
    fn diff_against(&self, root: &Path, base: &str) -> Result<Vec<DiffEntry>, ScanError>;

    /// Discovers repository metadata; `None` outside a repository.
    fn repo_info(&self, root: &Path) -> Option<RepoInfo>;
}
