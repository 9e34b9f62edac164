//! Convenience re-exports of the most commonly used types.

pub use crate::baseline::{Baseline, should_fail};
pub use crate::budget::{AbortReason, ArtifactLimits, ArtifactStats, ArtifactStatsSnapshot, BudgetTracker};
pub use crate::cache::{ContentCache, fast_hash};
pub use crate::error::{BackendErrorKind, ScanError};
pub use crate::filter::{DetectorFilter, filter_by_confidence};
pub use crate::finding::{Finding, Severity, dedup_findings, severity_for_confidence};
pub use crate::git::{CommitEntry, DiffEntry, GitProvider, RepoInfo};
pub use crate::ignore_file::IgnoreMatcher;
pub use crate::matcher::PathFilter;
pub use crate::scanner::{BatchInput, ScanContext, Scanner};
pub use crate::vpath::VirtualPath;
