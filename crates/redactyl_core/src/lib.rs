//! Core scan-orchestration engine for redactyl.
//!
//! This crate contains everything a scan needs apart from the actual pattern
//! matching: the finding model, virtual paths into nested artifacts, the
//! per-artifact resource budget, path and ignore matchers, the incremental
//! content-hash cache, baseline and fail-gate logic, and the report writers.
//! Detection itself happens behind the [`Scanner`] trait - the Gitleaks
//! subprocess adapter and the builtin rule engine both implement it.
//!
//! # Main Types
//!
//! - [`Finding`] - A detected secret with virtual path, severity, confidence
//! - [`VirtualPath`] - `::`-joined identity of a scanned unit inside artifacts
//! - [`BudgetTracker`] - Per-artifact bytes/entries/depth/time state machine
//! - [`Scanner`] - The detection-backend interface
//! - [`Baseline`] - Previously accepted findings that are not re-reported
//!
//! # Error Handling
//!
//! This crate uses [`thiserror`] for structured, typed errors that library
//! consumers can match on; see [`ScanError`]. The CLI crate (`redactyl_cli`)
//! uses `anyhow` for error propagation.

/// Baseline persistence, new-findings filter, and the fail gate.
pub mod baseline;
/// Per-artifact resource limits, abort reasons, and shared counters.
pub mod budget;
/// Content-hash cache for skipping unchanged files between scans.
pub mod cache;
/// Error types for the scan pipeline.
pub mod error;
/// Confidence and detector filters applied to raw findings.
pub mod filter;
/// The canonical finding model and severity/confidence mappings.
pub mod finding;
/// Filesystem helpers for atomic writes.
pub mod fs_util;
/// The `GitProvider` seam for staged, history, and base-branch enumeration.
pub mod git;
/// `.redactylignore` gitignore-style matching.
pub mod ignore_file;
/// Include/exclude glob matching with default-exclude lists.
pub mod matcher;
/// Common re-exports for internal use.
pub mod prelude;
/// JSON, SARIF, and upload-envelope report writers.
pub mod report;
/// The detection-backend interface and batch input types.
pub mod scanner;
/// Virtual paths identifying entries inside nested artifacts.
pub mod vpath;

pub use baseline::{Baseline, should_fail};
pub use budget::{AbortReason, ArtifactLimits, ArtifactStats, ArtifactStatsSnapshot, BudgetTracker};
pub use cache::{ContentCache, fast_hash};
pub use error::{BackendErrorKind, ScanError};
pub use filter::{DetectorFilter, filter_by_confidence};
pub use finding::{Finding, Severity, dedup_findings, is_high_confidence_detector, severity_for_confidence};
pub use git::{CommitEntry, DiffEntry, GitProvider, RepoInfo};
pub use ignore_file::IgnoreMatcher;
pub use matcher::PathFilter;
pub use scanner::{BatchInput, ScanContext, Scanner};
pub use vpath::VirtualPath;

/// Name the tool reports itself as in SARIF and upload envelopes.
pub const TOOL_NAME: &str = "redactyl";

/// Filename for gitignore-style scan exclusions.
pub const IGNORE_FILENAME: &str = ".redactylignore";
