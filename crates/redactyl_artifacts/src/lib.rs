//! Streaming artifact decoders.
//!
//! Everything the scanner can recurse into lives here: zip and tar archives,
//! gzip members, docker-save tarballs, OCI image layouts on disk, remote OCI
//! registry images, Helm charts, Kubernetes manifests, and IaC hotspot
//! files. Decoders are streaming - no artifact is materialised beyond the
//! entry currently being read - and every loop runs under the
//! [`redactyl_core::BudgetTracker`] state machine, so a hostile or huge
//! artifact degrades into a recorded abort instead of unbounded work.
//!
//! Entries are handed to an [`EntrySink`]; when an emitted entry itself looks
//! like an archive and depth permits, the decoder recurses instead of
//! emitting. Include/exclude globs gate which *artifacts* are entered -
//! entries inside an accepted artifact are never re-filtered.

/// Format detection by extension and magic bytes.
pub mod detect;
mod decoders;
/// The artifact scanner facade dispatching to format decoders.
pub mod scan;
/// The emission seam between decoders and the scan pipeline.
pub mod sink;

pub use decoders::helm::is_chart_dir;
pub use decoders::iac::is_iac_hotspot;
pub use decoders::k8s::{is_k8s_manifest, manifest_metadata};
pub use decoders::oci::is_oci_layout;
pub use decoders::remote::ImageReference;
pub use detect::{ArtifactKind, detect_artifact, nested_kind};
pub use scan::ArtifactScanner;
pub use sink::EntrySink;
