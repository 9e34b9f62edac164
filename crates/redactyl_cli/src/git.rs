//! Subprocess-backed `GitProvider`.
//!
//! Thin wrappers over the `git` binary: staged blobs via `git show :path`,
//! history via `git log` + `git diff-tree`, base-branch added lines via a
//! zero-context unified diff. Anything git-shaped that fails turns into a
//! contained error; the scan modes surface it to the caller.

use std::path::Path;
use std::process::Command;

use redactyl_core::error::ScanError;
use redactyl_core::git::{CommitEntry, DiffEntry, GitProvider, RepoInfo};

/// `GitProvider` that shells out to the `git` binary.
#[derive(Debug, Default)]
pub struct CliGitProvider;

impl CliGitProvider {
    /// Creates the provider.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Returns `true` when `root` looks like a git repository.
    #[must_use]
    pub fn available(root: &Path) -> bool {
        root.join(".git").exists()
    }
}

impl GitProvider for CliGitProvider {
    fn staged_diff(&self, root: &Path) -> Result<Vec<DiffEntry>, ScanError> {
        let listing = run_git(root, &["diff", "--cached", "--name-only", "--diff-filter=ACMR", "-z"])?;
        let mut entries = Vec::new();

        for path in split_null_terminated(&listing) {
            let Ok(blob) = run_git(root, &["show", &format!(":{path}")]) else {
                continue;
            };
            entries.push(DiffEntry { path, bytes: blob });
        }

        Ok(entries)
    }

    fn last_n_commits(&self, root: &Path, n: usize) -> Result<Vec<CommitEntry>, ScanError> {
        let log = run_git(root, &["log", &format!("-n{n}"), "--pretty=format:%H\u{1f}%an <%ae>"])?;
        let log = String::from_utf8_lossy(&log);

        let mut commits = Vec::new();
        for line in log.lines().filter(|l| !l.is_empty()) {
            let Some((id, author)) = line.split_once('\u{1f}') else {
                continue;
            };

            let changed = run_git(root, &["diff-tree", "--no-commit-id", "--name-only", "-r", id])?;
            let changed = String::from_utf8_lossy(&changed);

            let mut files = Vec::new();
            for path in changed.lines().filter(|l| !l.is_empty()) {
                let Ok(blob) = run_git(root, &["show", &format!("{id}:{path}")]) else {
                    continue;
                };
                files.push(DiffEntry {
                    path: path.to_string(),
                    bytes: blob,
                });
            }

            commits.push(CommitEntry {
                id: id.to_string(),
                author: author.to_string(),
                files,
            });
        }

        Ok(commits)
    }

    fn diff_against(&self, root: &Path, base: &str) -> Result<Vec<DiffEntry>, ScanError> {
        let diff = run_git(root, &["diff", "-U0", &format!("{base}...HEAD")])?;
        Ok(parse_added_lines(&String::from_utf8_lossy(&diff)))
    }

    fn repo_info(&self, root: &Path) -> Option<RepoInfo> {
        if !Self::available(root) {
            return None;
        }

        let field = |args: &[&str]| {
            run_git(root, args)
                .ok()
                .map(|out| String::from_utf8_lossy(&out).trim().to_string())
                .filter(|s| !s.is_empty())
        };

        Some(RepoInfo {
            repo: field(&["config", "--get", "remote.origin.url"]),
            commit: field(&["rev-parse", "HEAD"]),
            branch: field(&["rev-parse", "--abbrev-ref", "HEAD"]),
        })
    }
}

/// Extracts per-file added-line payloads from a zero-context unified diff.
///
/// Each entry's bytes are the concatenated `+` lines of one file, with the
/// `+++`/`---` headers and `@@` hunk markers excluded.
fn parse_added_lines(diff: &str) -> Vec<DiffEntry> {
    let mut entries: Vec<DiffEntry> = Vec::new();
    let mut current: Option<DiffEntry> = None;

    for line in diff.lines() {
        if let Some(header) = line.strip_prefix("+++ ") {
            if let Some(entry) = current.take()
                && !entry.bytes.is_empty()
            {
                entries.push(entry);
            }

            let path = header.strip_prefix("b/").unwrap_or(header);
            current = (path != "/dev/null").then(|| DiffEntry {
                path: path.to_string(),
                bytes: Vec::new(),
            });
            continue;
        }

        if line.starts_with("---") || line.starts_with("@@") {
            continue;
        }

        if let Some(added) = line.strip_prefix('+')
            && let Some(entry) = current.as_mut()
        {
            entry.bytes.extend_from_slice(added.as_bytes());
            entry.bytes.push(b'\n');
        }
    }

    if let Some(entry) = current
        && !entry.bytes.is_empty()
    {
        entries.push(entry);
    }

    entries
}

fn run_git(root: &Path, args: &[&str]) -> Result<Vec<u8>, ScanError> {
    let output = Command::new("git")
        .arg("-C")
        .arg(root)
        .args(args)
        .output()
        .map_err(|e| ScanError::io(root, e))?;

    if !output.status.success() {
        return Err(ScanError::Config {
            message: format!(
                "git {} failed: {}",
                args.first().unwrap_or(&""),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    Ok(output.stdout)
}

fn split_null_terminated(bytes: &[u8]) -> Vec<String> {
    bytes
        .split(|&b| b == 0)
        .filter(|part| !part.is_empty())
        .map(|part| String::from_utf8_lossy(part).into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIFF: &str = "\
diff --git a/src/config.rs b/src/config.rs
index 111..222 100644
--- a/src/config.rs
+++ b/src/config.rs
@@ -10,0 +11,2 @@
+let token = \"ghp_abc\";
+let other = 1;
diff --git a/README.md b/README.md
--- a/README.md
+++ b/README.md
@@ -1 +1 @@
+# renamed title
diff --git a/gone.txt b/gone.txt
--- a/gone.txt
+++ /dev/null
@@ -1 +0,0 @@
-removed
";

    #[test]
    fn added_lines_are_grouped_per_file() {
        let entries = parse_added_lines(DIFF);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, "src/config.rs");
        assert_eq!(
            String::from_utf8_lossy(&entries[0].bytes),
            "let token = \"ghp_abc\";\nlet other = 1;\n"
        );
        assert_eq!(entries[1].path, "README.md");
        assert_eq!(String::from_utf8_lossy(&entries[1].bytes), "# renamed title\n");
    }

    #[test]
    fn deleted_files_produce_no_entries() {
        let entries = parse_added_lines(DIFF);
        assert!(entries.iter().all(|e| e.path != "gone.txt"));
    }

    #[test]
    fn headers_and_hunks_are_excluded_from_payloads() {
        let entries = parse_added_lines(DIFF);
        for entry in &entries {
            let text = String::from_utf8_lossy(&entry.bytes);
            assert!(!text.contains("+++"));
            assert!(!text.contains("@@"));
        }
    }

    #[test]
    fn empty_diff_yields_no_entries() {
        assert!(parse_added_lines("").is_empty());
    }

    #[test]
    fn null_separated_listing_splits_cleanly() {
        let listing = b"a.txt\0dir/b.txt\0";
        assert_eq!(split_null_terminated(listing), vec!["a.txt", "dir/b.txt"]);
    }
}
