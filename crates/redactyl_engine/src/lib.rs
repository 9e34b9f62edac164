//! Target enumeration and scan coordination.
//!
//! The engine turns a configured scan into backend work: it enumerates
//! candidates (working tree, staged index, history, base-branch diff,
//! artifacts, remote images), hashes them against the incremental cache,
//! batches the survivors through a worker pool to the detection backend,
//! and folds the results through the confidence, detector, and dedup
//! filters into a [`ScanResult`].
//!
//! # Main Types
//!
//! - [`ScanOptions`] / [`ScanMode`] - What to scan and under which limits
//! - [`Coordinator`] - Runs the pipeline against a [`redactyl_core::Scanner`]
//! - [`ScanResult`] - Findings plus counters for reports and the fail gate
//! - [`ProjectConfig`] - `.redactyl.toml` project configuration

/// Scan options and the `.redactyl.toml` project configuration.
pub mod config;
/// The scan coordinator: worker pool, cache, filters, artifact stage.
pub mod coordinator;
/// Candidate enumeration for every scan mode.
pub mod enumerate;

pub use config::{CONFIG_FILENAME, ProjectConfig, ScanMode, ScanOptions};
pub use coordinator::{Coordinator, ProgressCallback, ScanResult};
pub use enumerate::count_targets;
