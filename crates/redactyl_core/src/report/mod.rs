//! Report writers.
//!
//! Three stable output contracts: the findings JSON array, the extended JSON
//! document with scan stats, and SARIF 2.1.0. The upload envelope wraps the
//! findings for transport to an HTTP collector.

mod envelope;
mod json;
mod sarif;

pub use envelope::UploadEnvelope;
pub use json::{parse_findings, write_extended, write_findings};
pub use sarif::{write_sarif, write_sarif_extended};

/// Schema version stamped into extended JSON and upload envelopes.
pub const SCHEMA_VERSION: &str = "1";
