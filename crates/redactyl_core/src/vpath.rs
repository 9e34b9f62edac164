//! Virtual paths identifying scanned units inside nested artifacts.
//!
//! A virtual path is an ordered sequence of segments joined by `"::"`. The
//! first segment is the repository-relative path of the outermost artifact;
//! each further segment names an entry inside the containing artifact, e.g.
//! `image.tar::sha256:abc::etc/app.yaml`. Virtual paths are identities, not
//! filesystem paths - they must never be re-opened from disk.

use std::fmt;

/// Separator between virtual path segments.
pub const SEPARATOR: &str = "::";

/// An ordered sequence of artifact segments.
///
/// Depth equals segment count: the empty path has depth 0, a plain file path
/// has depth 1, and each containing artifact adds one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VirtualPath {
    segments: Vec<String>,
}

impl VirtualPath {
    /// Creates a single-segment path for a repository-relative file.
    #[must_use]
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            segments: vec![path.into()],
        }
    }

    /// Parses a `"::"`-joined string back into segments.
    ///
    /// The empty string parses to the empty path (depth 0).
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.is_empty() {
            return Self::default();
        }
        Self {
            segments: s.split(SEPARATOR).map(str::to_string).collect(),
        }
    }

    /// Returns a new path with `segment` appended.
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Appends a segment in place.
    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` when the path has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the outermost (repository-relative) segment.
    #[must_use]
    pub fn outermost(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    /// Returns the innermost segment - the entry a finding points at.
    #[must_use]
    pub fn leaf(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Returns all segments in order.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join(SEPARATOR))
    }
}

impl From<&str> for VirtualPath {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}
