//! Gitleaks subprocess backend.
//!
//! The reference implementation of the [`redactyl_core::Scanner`] interface:
//! batch inputs are written to a private temp workspace, the `gitleaks`
//! binary runs `detect` over it, and the JSON report is correlated back to
//! virtual paths with the shared confidence and severity mappings applied.
//! [`BinaryManager`] handles locating (and optionally downloading) the
//! binary itself.

/// Binary resolution and auto-download.
pub mod binary;
/// The subprocess adapter implementing the `Scanner` trait.
pub mod gitleaks;

pub use binary::BinaryManager;
pub use gitleaks::GitleaksBackend;
