//! Baseline tracking and the fail gate.
//!
//! A baseline is a persisted set of canonical finding keys
//! (`path|detector|match`) that were reviewed and accepted. During a scan the
//! baseline is read-only; `filter_new` drops any finding whose key it
//! contains. Missing or unparseable baseline files degrade to an empty
//! baseline so a broken file can never block CI.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ScanError;
use crate::finding::{Finding, Severity};
use crate::fs_util::atomic_write;

/// Persisted set of accepted finding keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    /// Canonical key → accepted marker (always `true`; the map is a set).
    #[serde(default)]
    pub items: BTreeMap<String, bool>,
}

impl Baseline {
    /// Loads a baseline, treating a missing or unparseable file as empty.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };

        match serde_json::from_str(&content) {
            Ok(baseline) => baseline,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(path = %path.display(), error = %_e, "treating unparseable baseline as empty");
                Self::default()
            }
        }
    }

    /// Builds a baseline covering every given finding.
    #[must_use]
    pub fn from_findings(findings: &[Finding]) -> Self {
        let items = findings.iter().map(|f| (f.canonical_key(), true)).collect();
        Self { items }
    }

    /// Writes the canonical keys of `findings` to `path` atomically.
    pub fn save(path: &Path, findings: &[Finding]) -> Result<(), ScanError> {
        Self::from_findings(findings).write(path)
    }

    /// Atomically persists this baseline as JSON.
    pub fn write(&self, path: &Path) -> Result<(), ScanError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| ScanError::Config {
            message: format!("cannot serialise baseline: {e}"),
        })?;
        atomic_write(path, json.as_bytes()).map_err(|e| ScanError::io(path, e))
    }

    /// Returns `true` when the canonical key is in the baseline.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    /// Keeps only findings whose canonical key is not in the baseline.
    #[must_use]
    pub fn filter_new(&self, findings: Vec<Finding>) -> Vec<Finding> {
        if self.items.is_empty() {
            return findings;
        }
        findings
            .into_iter()
            .filter(|f| !self.contains(&f.canonical_key()))
            .collect()
    }

    /// Number of accepted keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when no keys are accepted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The fail gate: `true` when any finding's severity is at or above
/// `threshold`. The verdict drives the process exit code.
#[must_use]
pub fn should_fail(findings: &[Finding], threshold: Severity) -> bool {
    findings.iter().any(|f| f.severity.level() >= threshold.level())
}
