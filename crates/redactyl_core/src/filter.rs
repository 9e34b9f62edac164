//! Post-detection finding filters.
//!
//! Two filters run between the backend and the baseline: a minimum-confidence
//! threshold, and detector enable/disable lists. Enable is an allowlist,
//! disable is a denylist; when both are supplied, enable takes precedence.

use std::collections::HashSet;

use crate::finding::Finding;
use crate::matcher::split_patterns;

/// Drops findings whose confidence is below `min_confidence`.
#[must_use]
pub fn filter_by_confidence(findings: Vec<Finding>, min_confidence: f64) -> Vec<Finding> {
    if min_confidence <= 0.0 {
        return findings;
    }
    findings.into_iter().filter(|f| f.confidence >= min_confidence).collect()
}

/// Detector allow/deny selection built from comma-separated id lists.
#[derive(Debug, Clone, Default)]
pub struct DetectorFilter {
    enable: Option<HashSet<String>>,
    disable: HashSet<String>,
}

impl DetectorFilter {
    /// Builds a filter from comma-separated enable and disable lists.
    ///
    /// An empty enable list means "everything not disabled".
    #[must_use]
    pub fn from_lists(enable_csv: &str, disable_csv: &str) -> Self {
        let enable_ids = split_patterns(enable_csv);
        let enable = if enable_ids.is_empty() {
            None
        } else {
            Some(enable_ids.into_iter().collect())
        };

        Self {
            enable,
            disable: split_patterns(disable_csv).into_iter().collect(),
        }
    }

    /// Returns `true` when findings from `detector` should be kept.
    #[must_use]
    pub fn permits(&self, detector: &str) -> bool {
        if let Some(enable) = &self.enable {
            return enable.contains(detector);
        }
        !self.disable.contains(detector)
    }

    /// Applies the filter to a finding list.
    #[must_use]
    pub fn apply(&self, findings: Vec<Finding>) -> Vec<Finding> {
        if self.is_noop() {
            return findings;
        }
        findings.into_iter().filter(|f| self.permits(&f.detector)).collect()
    }

    /// Returns `true` when the filter keeps everything.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.enable.is_none() && self.disable.is_empty()
    }
}
