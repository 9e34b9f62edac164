//! `.redactylignore` matching.
//!
//! The ignore file uses gitignore syntax: blank lines and `#` comments are
//! skipped, `/` roots a pattern, `!` negates. A missing file yields a matcher
//! that never matches.

use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::IGNORE_FILENAME;

/// Matcher over the patterns of a `.redactylignore` file.
#[derive(Debug)]
pub struct IgnoreMatcher {
    gitignore: Option<Gitignore>,
}

impl IgnoreMatcher {
    /// Loads `<root>/.redactylignore`, yielding an always-false matcher when
    /// the file is missing or unreadable.
    #[must_use]
    pub fn load(root: &Path) -> Self {
        Self::from_file(root, &root.join(IGNORE_FILENAME))
    }

    /// Loads patterns from an explicit file path, rooted at `root`.
    #[must_use]
    pub fn from_file(root: &Path, path: &Path) -> Self {
        if !path.is_file() {
            return Self::empty();
        }

        let mut builder = GitignoreBuilder::new(root);
        if builder.add(path).is_some() {
            return Self::empty();
        }

        match builder.build() {
            Ok(gitignore) => Self {
                gitignore: Some(gitignore),
            },
            Err(_) => Self::empty(),
        }
    }

    /// A matcher that matches nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self { gitignore: None }
    }

    /// Returns `true` when `relative_path` is ignored by the loaded patterns.
    #[must_use]
    pub fn matches(&self, relative_path: &str) -> bool {
        self.gitignore
            .as_ref()
            .is_some_and(|gi| gi.matched_path_or_any_parents(relative_path, false).is_ignore())
    }
}
