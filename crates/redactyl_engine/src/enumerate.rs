//! Candidate enumeration.
//!
//! Produces `(relative_path, bytes)` pairs for every scan mode. The working
//! tree walk applies the glob filter, the `.redactylignore` matcher, the
//! per-file size cap, a quick binary sniff, and the inline
//! `redactyl:ignore-file` directive; git-backed modes apply the same filters
//! to the blobs the [`GitProvider`] hands over.

use std::io::Read;
use std::path::Path;

use ignore::WalkBuilder;

use redactyl_core::error::ScanError;
use redactyl_core::git::GitProvider;
use redactyl_core::ignore_file::IgnoreMatcher;
use redactyl_core::matcher::PathFilter;
use redactyl_core::scanner::{BatchInput, ScanContext};

use crate::config::ScanOptions;

/// Bytes checked for a NUL when deciding a file is binary.
const BINARY_SNIFF_BYTES: usize = 800;

/// Window at the head of a file searched for the ignore directive.
const DIRECTIVE_WINDOW: usize = 4096;

/// Inline directive that excludes a whole file from scanning.
pub const IGNORE_FILE_DIRECTIVE: &str = "redactyl:ignore-file";

/// Files at or above this size are memory-mapped instead of heap-read.
const MMAP_THRESHOLD: u64 = 32 * 1024;

/// Returns `true` when the first [`BINARY_SNIFF_BYTES`] contain a NUL byte.
#[must_use]
pub fn is_binary(bytes: &[u8]) -> bool {
    let check_len = bytes.len().min(BINARY_SNIFF_BYTES);
    bytes[..check_len].contains(&0)
}

/// Returns `true` when the head of the file carries the ignore directive.
#[must_use]
pub fn has_ignore_directive(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(DIRECTIVE_WINDOW)];
    window
        .windows(IGNORE_FILE_DIRECTIVE.len())
        .any(|w| w == IGNORE_FILE_DIRECTIVE.as_bytes())
}

/// Walks the working tree, invoking `f` for each scannable file.
pub fn walk_working_tree(
    options: &ScanOptions,
    filter: &PathFilter,
    ignore_matcher: &IgnoreMatcher,
    mut f: impl FnMut(String, Vec<u8>) -> Result<(), ScanError>,
) -> Result<(), ScanError> {
    for entry in build_walker(&options.root) {
        let Ok(entry) = entry else { continue };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let Some(rel) = relative_path(&options.root, entry.path()) else {
            continue;
        };
        if !filter.allows(&rel) || ignore_matcher.matches(&rel) {
            continue;
        }

        let Some(bytes) = read_file_bytes(entry.path(), options.max_bytes) else {
            continue;
        };
        if is_binary(&bytes) || has_ignore_directive(&bytes) {
            continue;
        }

        f(rel, bytes)?;
    }

    Ok(())
}

/// Cheap estimator of how many units a scan will process.
///
/// Walks with the same filters but reads only the sniff window of each file,
/// so progress totals stay fast on large trees. Remote images count as one
/// unit each.
#[must_use]
pub fn count_targets(options: &ScanOptions) -> usize {
    let Ok(filter) = PathFilter::new(&options.include, &options.exclude, options.default_excludes) else {
        return 0;
    };
    let ignore_matcher = IgnoreMatcher::load(&options.root);

    let mut count = 0;
    for entry in build_walker(&options.root) {
        let Ok(entry) = entry else { continue };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let Some(rel) = relative_path(&options.root, entry.path()) else {
            continue;
        };
        if !filter.allows(&rel) || ignore_matcher.matches(&rel) {
            continue;
        }
        if entry.metadata().is_ok_and(|m| m.len() > options.max_bytes) {
            continue;
        }
        if head_is_scannable(entry.path()) {
            count += 1;
        }
    }

    count + options.images.len()
}

/// Collects staged-index candidates through the git provider.
pub fn staged_inputs(
    git: &dyn GitProvider,
    options: &ScanOptions,
    filter: &PathFilter,
    ignore_matcher: &IgnoreMatcher,
) -> Result<Vec<BatchInput>, ScanError> {
    let entries = git.staged_diff(&options.root)?;
    Ok(entries
        .into_iter()
        .filter(|e| survives_filters(&e.path, &e.bytes, options, filter, ignore_matcher))
        .map(|e| BatchInput::new(ScanContext::for_path(e.path), e.bytes))
        .collect())
}

/// Collects candidates from the last `n` commits, tagging each with commit
/// and author metadata.
pub fn history_inputs(
    git: &dyn GitProvider,
    options: &ScanOptions,
    n: usize,
    filter: &PathFilter,
    ignore_matcher: &IgnoreMatcher,
) -> Result<Vec<BatchInput>, ScanError> {
    let commits = git.last_n_commits(&options.root, n)?;
    let mut inputs = Vec::new();

    for commit in commits {
        for file in commit.files {
            if !survives_filters(&file.path, &file.bytes, options, filter, ignore_matcher) {
                continue;
            }
            let context = ScanContext::for_path(file.path)
                .with_metadata("commit", commit.id.clone())
                .with_metadata("author", commit.author.clone());
            inputs.push(BatchInput::new(context, file.bytes));
        }
    }

    Ok(inputs)
}

/// Collects added-line candidates from the diff against `base`.
pub fn base_diff_inputs(
    git: &dyn GitProvider,
    options: &ScanOptions,
    base: &str,
    filter: &PathFilter,
    ignore_matcher: &IgnoreMatcher,
) -> Result<Vec<BatchInput>, ScanError> {
    let entries = git.diff_against(&options.root, base)?;
    Ok(entries
        .into_iter()
        .filter(|e| survives_filters(&e.path, &e.bytes, options, filter, ignore_matcher))
        .map(|e| {
            let context = ScanContext::for_path(e.path).with_metadata("base", base.to_string());
            BatchInput::new(context, e.bytes)
        })
        .collect())
}

fn survives_filters(
    path: &str,
    bytes: &[u8],
    options: &ScanOptions,
    filter: &PathFilter,
    ignore_matcher: &IgnoreMatcher,
) -> bool {
    filter.allows(path)
        && !ignore_matcher.matches(path)
        && bytes.len() as u64 <= options.max_bytes
        && !is_binary(bytes)
        && !has_ignore_directive(bytes)
}

fn build_walker(root: &Path) -> ignore::Walk {
    WalkBuilder::new(root)
        .hidden(false)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build()
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let rel = rel.to_string_lossy();
    if rel.is_empty() {
        return None;
    }
    Some(rel.replace('\\', "/"))
}

/// Reads a file's content, returning `None` when it exceeds `max_bytes` or
/// cannot be read.
///
/// Small files are read with a single syscall; large files are
/// memory-mapped so the page cache is used directly.
#[must_use]
pub fn read_file_bytes(path: &Path, max_bytes: u64) -> Option<Vec<u8>> {
    let mut file = std::fs::File::open(path).ok()?;
    let len = file.metadata().ok()?.len();

    if len > max_bytes {
        return None;
    }

    if len >= MMAP_THRESHOLD {
        read_large_file_mmap(&file)
    } else {
        read_small_file(&mut file, len)
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "files above max_bytes are already rejected; remaining sizes fit in usize"
)]
fn read_small_file(file: &mut std::fs::File, len: u64) -> Option<Vec<u8>> {
    let mut bytes = Vec::with_capacity(len as usize);
    file.read_to_end(&mut bytes).ok()?;
    Some(bytes)
}

fn read_large_file_mmap(file: &std::fs::File) -> Option<Vec<u8>> {
    // SAFETY: The map is read-only and dropped before this function returns.
    // Concurrent file truncation could cause SIGBUS, but this is the same
    // risk `git` and `ripgrep` accept for mmap-based file reading.
    #[expect(unsafe_code, reason = "mmap requires unsafe; lifetime is scoped to this function")]
    let mmap = unsafe { memmap2::Mmap::map(file) }.ok()?;
    Some(mmap.to_vec())
}

fn head_is_scannable(path: &Path) -> bool {
    let Ok(mut file) = std::fs::File::open(path) else {
        return false;
    };
    let mut head = [0u8; DIRECTIVE_WINDOW];
    let mut filled = 0;
    while filled < head.len() {
        match file.read(&mut head[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(_) => return false,
        }
    }
    let head = &head[..filled];
    !is_binary(head) && !has_ignore_directive(head)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use redactyl_core::git::{CommitEntry, DiffEntry, RepoInfo};
    use tempfile::TempDir;

    use super::*;

    fn options_for(root: &Path) -> ScanOptions {
        ScanOptions {
            root: root.to_path_buf(),
            default_excludes: false,
            use_cache: false,
            ..ScanOptions::for_root(root)
        }
    }

    fn collect_tree(options: &ScanOptions) -> Vec<String> {
        let filter = PathFilter::new(&options.include, &options.exclude, options.default_excludes).unwrap();
        let ignore_matcher = IgnoreMatcher::load(&options.root);
        let mut seen = Vec::new();
        walk_working_tree(options, &filter, &ignore_matcher, |rel, _| {
            seen.push(rel);
            Ok(())
        })
        .unwrap();
        seen.sort();
        seen
    }

    #[test]
    fn walk_emits_scannable_files_with_relative_paths() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();
        std::fs::write(dir.path().join("a/config.txt"), "token = x").unwrap();
        std::fs::write(dir.path().join("top.txt"), "y").unwrap();

        let seen = collect_tree(&options_for(dir.path()));
        assert_eq!(seen, vec!["a/config.txt", "top.txt"]);
    }

    #[test]
    fn walk_skips_binary_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("blob.bin"), b"ab\x00cd").unwrap();
        std::fs::write(dir.path().join("text.txt"), "clean").unwrap();

        let seen = collect_tree(&options_for(dir.path()));
        assert_eq!(seen, vec!["text.txt"]);
    }

    #[test]
    fn nul_byte_past_the_sniff_window_is_not_binary() {
        let mut content = vec![b'a'; BINARY_SNIFF_BYTES];
        content.push(0);
        assert!(!is_binary(&content));

        let mut early = vec![b'a'; BINARY_SNIFF_BYTES - 1];
        early.push(0);
        assert!(is_binary(&early));
    }

    #[test]
    fn walk_skips_files_with_ignore_directive() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("gen.txt"), "# redactyl:ignore-file\ntoken = x").unwrap();
        std::fs::write(dir.path().join("keep.txt"), "token = y").unwrap();

        let seen = collect_tree(&options_for(dir.path()));
        assert_eq!(seen, vec!["keep.txt"]);
    }

    #[test]
    fn walk_applies_size_cap_inclusively() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("exact.txt"), vec![b'a'; 64]).unwrap();
        std::fs::write(dir.path().join("over.txt"), vec![b'a'; 65]).unwrap();

        let mut options = options_for(dir.path());
        options.max_bytes = 64;

        let seen = collect_tree(&options);
        assert_eq!(seen, vec!["exact.txt"]);
    }

    #[test]
    fn walk_honours_redactylignore() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".redactylignore"), "*.log\n").unwrap();
        std::fs::write(dir.path().join("debug.log"), "x").unwrap();
        std::fs::write(dir.path().join("main.rs"), "y").unwrap();

        let seen = collect_tree(&options_for(dir.path()));
        assert_eq!(seen, vec![".redactylignore", "main.rs"]);
    }

    #[test]
    fn walk_applies_include_and_exclude_globs() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.yaml"), "x").unwrap();
        std::fs::write(dir.path().join("b.txt"), "y").unwrap();

        let mut options = options_for(dir.path());
        options.include = "**/*.yaml".to_string();

        let seen = collect_tree(&options);
        assert_eq!(seen, vec!["a.yaml"]);
    }

    #[test]
    fn count_targets_matches_walk_results() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("one.txt"), "a").unwrap();
        std::fs::write(dir.path().join("two.txt"), "b").unwrap();
        std::fs::write(dir.path().join("bin.dat"), b"\x00").unwrap();

        let options = options_for(dir.path());
        assert_eq!(count_targets(&options), collect_tree(&options).len());
    }

    #[test]
    fn count_targets_counts_remote_images() {
        let dir = TempDir::new().unwrap();
        let mut options = options_for(dir.path());
        options.images = vec!["alpine:3".to_string(), "redis:7".to_string()];

        assert_eq!(count_targets(&options), 2);
    }

    /// Provider returning canned data for the git-backed modes.
    struct FakeGit;

    impl GitProvider for FakeGit {
        fn staged_diff(&self, _root: &Path) -> Result<Vec<DiffEntry>, ScanError> {
            Ok(vec![
                DiffEntry {
                    path: "staged.txt".to_string(),
                    bytes: b"token = abc".to_vec(),
                },
                DiffEntry {
                    path: "binary.dat".to_string(),
                    bytes: b"\x00\x01".to_vec(),
                },
            ])
        }

        fn last_n_commits(&self, _root: &Path, n: usize) -> Result<Vec<CommitEntry>, ScanError> {
            Ok((0..n.min(2))
                .map(|i| CommitEntry {
                    id: format!("c{i}"),
                    author: "dev@example.com".to_string(),
                    files: vec![DiffEntry {
                        path: format!("file{i}.txt"),
                        bytes: b"content".to_vec(),
                    }],
                })
                .collect())
        }

        fn diff_against(&self, _root: &Path, _base: &str) -> Result<Vec<DiffEntry>, ScanError> {
            Ok(vec![DiffEntry {
                path: "changed.txt".to_string(),
                bytes: b"added line one\nadded line two\n".to_vec(),
            }])
        }

        fn repo_info(&self, _root: &Path) -> Option<RepoInfo> {
            None
        }
    }

    #[test]
    fn staged_inputs_filter_binaries() {
        let dir = TempDir::new().unwrap();
        let options = options_for(dir.path());
        let filter = PathFilter::allow_all();
        let ignore_matcher = IgnoreMatcher::empty();

        let inputs = staged_inputs(&FakeGit, &options, &filter, &ignore_matcher).unwrap();

        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].path, "staged.txt");
    }

    #[test]
    fn history_inputs_carry_commit_metadata() {
        let dir = TempDir::new().unwrap();
        let options = options_for(dir.path());
        let filter = PathFilter::allow_all();
        let ignore_matcher = IgnoreMatcher::empty();

        let inputs = history_inputs(&FakeGit, &options, 2, &filter, &ignore_matcher).unwrap();

        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].context.metadata.get("commit"), Some(&"c0".to_string()));
        assert_eq!(
            inputs[0].context.metadata.get("author"),
            Some(&"dev@example.com".to_string())
        );
    }

    #[test]
    fn base_diff_inputs_carry_base_metadata() {
        let dir = TempDir::new().unwrap();
        let options = options_for(dir.path());
        let filter = PathFilter::allow_all();
        let ignore_matcher = IgnoreMatcher::empty();

        let inputs = base_diff_inputs(&FakeGit, &options, "main", &filter, &ignore_matcher).unwrap();

        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].context.metadata.get("base"), Some(&"main".to_string()));
    }

    #[test]
    fn read_file_bytes_enforces_cap() {
        let dir = TempDir::new().unwrap();
        let path: PathBuf = dir.path().join("f.txt");
        std::fs::write(&path, vec![b'x'; 100]).unwrap();

        assert!(read_file_bytes(&path, 100).is_some());
        assert!(read_file_bytes(&path, 99).is_none());
    }

    #[test]
    fn read_file_bytes_handles_mmap_sized_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.txt");
        let content = vec![b'z'; (MMAP_THRESHOLD + 10) as usize];
        std::fs::write(&path, &content).unwrap();

        let bytes = read_file_bytes(&path, u64::MAX).unwrap();
        assert_eq!(bytes, content);
    }
}
