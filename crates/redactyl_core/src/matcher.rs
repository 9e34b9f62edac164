//! Include/exclude path matching.
//!
//! Patterns arrive as comma-separated glob lists. Each pattern is compiled in
//! several variants (as written, with a leading `./` stripped, with a leading
//! `**/` stripped) so that `**/*.ext` also matches top-level files, and every
//! candidate is additionally matched by basename so simple `*.ext` patterns
//! behave as users expect. A built-in default-exclude list drops vendored and
//! generated trees that are never worth scanning.

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::error::ScanError;

/// Directory names rejected when default excludes are enabled.
const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "vendor",
    "dist",
    "build",
    "out",
    "target",
    ".venv",
    "venv",
    "__pycache__",
    "coverage",
    "bin",
    "obj",
];

/// File suffixes rejected when default excludes are enabled: lock files,
/// minified assets, images, common binaries, generated code markers.
const DEFAULT_EXCLUDED_SUFFIXES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "Cargo.lock",
    "poetry.lock",
    "Gemfile.lock",
    "composer.lock",
    "go.sum",
    ".min.js",
    ".min.css",
    ".map",
    ".png",
    ".jpg",
    ".jpeg",
    ".gif",
    ".ico",
    ".webp",
    ".svg",
    ".pdf",
    ".woff",
    ".woff2",
    ".ttf",
    ".eot",
    ".exe",
    ".dll",
    ".so",
    ".dylib",
    ".class",
    ".pyc",
    ".o",
    ".a",
    ".wasm",
    ".pb.go",
    "_pb2.py",
];

/// Compiled include/exclude matcher for repository-relative paths.
#[derive(Debug)]
pub struct PathFilter {
    includes: Option<GlobSet>,
    excludes: Option<GlobSet>,
    default_excludes: bool,
}

impl PathFilter {
    /// Compiles comma-separated include and exclude glob lists.
    ///
    /// Empty lists compile to "match everything" / "exclude nothing".
    /// Returns [`ScanError::Config`] when a pattern is not a valid glob.
    pub fn new(include_csv: &str, exclude_csv: &str, default_excludes: bool) -> Result<Self, ScanError> {
        Ok(Self {
            includes: build_glob_set(&split_patterns(include_csv))?,
            excludes: build_glob_set(&split_patterns(exclude_csv))?,
            default_excludes,
        })
    }

    /// Compiles from already-split pattern lists.
    pub fn from_patterns(includes: &[String], excludes: &[String], default_excludes: bool) -> Result<Self, ScanError> {
        Ok(Self {
            includes: build_glob_set(includes)?,
            excludes: build_glob_set(excludes)?,
            default_excludes,
        })
    }

    /// A filter that allows every path.
    #[must_use]
    pub fn allow_all() -> Self {
        Self {
            includes: None,
            excludes: None,
            default_excludes: false,
        }
    }

    /// Decides whether `relative_path` survives include, exclude, and
    /// default-exclude rules. Paths are normalised to forward slashes.
    #[must_use]
    pub fn allows(&self, relative_path: &str) -> bool {
        let path = normalise(relative_path);
        let basename = path.rsplit('/').next().unwrap_or(&path);

        if let Some(includes) = &self.includes
            && !includes.is_match(&*path)
            && !includes.is_match(basename)
        {
            return false;
        }

        if let Some(excludes) = &self.excludes
            && (excludes.is_match(&*path) || excludes.is_match(basename))
        {
            return false;
        }

        if self.default_excludes && is_default_excluded(&path) {
            return false;
        }

        true
    }
}

/// One-shot form of [`PathFilter::allows`] taking comma-separated lists.
///
/// Pattern lists that fail to compile reject every path; persistent filters
/// should use [`PathFilter::new`] and handle the error.
#[must_use]
pub fn allowed(relative_path: &str, include_csv: &str, exclude_csv: &str, default_excludes: bool) -> bool {
    match PathFilter::new(include_csv, exclude_csv, default_excludes) {
        Ok(filter) => filter.allows(relative_path),
        Err(_) => false,
    }
}

/// Splits a comma-separated pattern list, dropping empty items.
#[must_use]
pub fn split_patterns(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Returns `true` when the path hits a default-excluded directory or suffix.
#[must_use]
pub fn is_default_excluded(relative_path: &str) -> bool {
    let path = normalise(relative_path);

    if path
        .split('/')
        .any(|component| DEFAULT_EXCLUDED_DIRS.contains(&component))
    {
        return true;
    }

    DEFAULT_EXCLUDED_SUFFIXES.iter().any(|suffix| path.ends_with(suffix))
}

fn normalise(path: &str) -> std::borrow::Cow<'_, str> {
    let path = path.strip_prefix("./").unwrap_or(path);
    if path.contains('\\') {
        std::borrow::Cow::Owned(path.replace('\\', "/"))
    } else {
        std::borrow::Cow::Borrowed(path)
    }
}

fn build_glob_set(patterns: &[String]) -> Result<Option<GlobSet>, ScanError> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        for variant in pattern_variants(pattern) {
            let glob = Glob::new(&variant).map_err(|e| ScanError::Config {
                message: format!("invalid glob '{pattern}': {e}"),
            })?;
            builder.add(glob);
        }
    }

    let set = builder.build().map_err(|e| ScanError::Config {
        message: format!("cannot build glob set: {e}"),
    })?;
    Ok(Some(set))
}

/// Expands a pattern into the forms it is matched in: as written, without a
/// leading `./`, and without a leading `**/` so any-depth patterns also hit
/// top-level files.
fn pattern_variants(pattern: &str) -> Vec<String> {
    let mut variants = vec![pattern.to_string()];

    if let Some(stripped) = pattern.strip_prefix("./") {
        variants.push(stripped.to_string());
    }

    if let Some(stripped) = pattern.strip_prefix("**/") {
        variants.push(stripped.to_string());
    }

    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_lists_allow_everything() {
        assert!(allowed("src/main.rs", "", "", false));
        assert!(allowed("deep/nested/file.txt", "", "", false));
    }

    #[test]
    fn include_list_requires_a_match() {
        assert!(allowed("src/config.yaml", "**/*.yaml", "", false));
        assert!(!allowed("src/main.rs", "**/*.yaml", "", false));
    }

    #[test]
    fn doublestar_include_matches_top_level_files() {
        assert!(allowed("config.yaml", "**/*.yaml", "", false));
    }

    #[test]
    fn exclude_list_rejects_matches() {
        assert!(!allowed("drop/blocked.zip", "", "**/blocked*", false));
        assert!(allowed("keep/allowed.zip", "", "**/blocked*", false));
    }

    #[test]
    fn include_and_exclude_select_archives() {
        let filter = PathFilter::new("**/allowed*", "**/blocked*", false).unwrap();
        assert!(filter.allows("keep/allowed.zip"));
        assert!(!filter.allows("drop/blocked.zip"));
        assert!(!filter.allows("other/thing.zip"));
    }

    #[test]
    fn comma_separated_lists_take_any_match() {
        assert!(allowed("a.yml", "*.yaml,*.yml", "", false));
        assert!(allowed("b.yaml", "*.yaml, *.yml", "", false));
        assert!(!allowed("c.json", "*.yaml,*.yml", "", false));
    }

    #[test]
    fn leading_dot_slash_is_stripped_from_patterns_and_paths() {
        assert!(allowed("src/a.txt", "./src/*.txt", "", false));
        assert!(allowed("./src/a.txt", "src/*.txt", "", false));
    }

    #[test]
    fn basename_matching_lets_simple_patterns_work() {
        assert!(allowed("deep/nested/secrets.env", "secrets.env", "", false));
    }

    #[test]
    fn default_excludes_reject_vendored_dirs() {
        assert!(!allowed("node_modules/pkg/index.js", "", "", true));
        assert!(!allowed(".git/config", "", "", true));
        assert!(!allowed("target/debug/out.txt", "", "", true));
        assert!(allowed("src/lib.rs", "", "", true));
    }

    #[test]
    fn default_excludes_reject_lock_files_and_binaries() {
        assert!(!allowed("package-lock.json", "", "", true));
        assert!(!allowed("app/bundle.min.js", "", "", true));
        assert!(!allowed("logo.png", "", "", true));
        assert!(allowed("app/config.json", "", "", true));
    }

    #[test]
    fn default_excludes_off_allows_vendored_dirs() {
        assert!(allowed("node_modules/pkg/index.js", "", "", false));
    }

    #[test]
    fn invalid_glob_is_a_config_error() {
        let err = PathFilter::new("a[", "", false).unwrap_err();
        assert!(matches!(err, ScanError::Config { .. }));
    }

    #[test]
    fn backslash_paths_are_normalised() {
        assert!(allowed("src\\a.yaml", "src/*.yaml", "", false));
    }

    #[test]
    fn split_patterns_drops_empties() {
        assert_eq!(split_patterns(""), Vec::<String>::new());
        assert_eq!(split_patterns("a, ,b,"), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn is_default_excluded_checks_any_component() {
        assert!(is_default_excluded("a/vendor/b/c.go"));
        assert!(!is_default_excluded("a/vendored/b/c.go"));
    }
}
