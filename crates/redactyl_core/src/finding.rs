//! The canonical finding model.
//!
//! A [`Finding`] is produced once by a detection backend, enriched with
//! virtual-path and artifact context, and immutable thereafter. Its serde
//! representation is the wire format of the JSON report, so field names and
//! optionality here are part of the external contract.

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Separator between the components of a canonical finding key.
const KEY_SEPARATOR: char = '|';

/// Confidence assigned to detectors on the backend's high-signal list.
pub const CONFIDENCE_KNOWN_RULE: f64 = 0.95;

/// Confidence assigned when the backend reports no entropy at all.
pub const CONFIDENCE_DEFAULT: f64 = 0.8;

/// Detector ids whose format alone is near-certain evidence of a real
/// secret. Findings from these rules get [`CONFIDENCE_KNOWN_RULE`]
/// regardless of entropy, in every backend.
pub const HIGH_CONFIDENCE_DETECTORS: &[&str] = &[
    "aws-access-token",
    "github-pat",
    "github-fine-grained-pat",
    "github-oauth",
    "github-app-token",
    "github-refresh-token",
    "npm-access-token",
    "pypi-upload-token",
    "slack-access-token",
    "stripe-access-token",
];

/// Returns `true` when `detector` is on the high-confidence list.
#[must_use]
pub fn is_high_confidence_detector(detector: &str) -> bool {
    HIGH_CONFIDENCE_DETECTORS.contains(&detector)
}

/// Error returned when parsing an invalid severity string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSeverityError {
    invalid_value: Box<str>,
}

impl ParseSeverityError {
    fn new(value: &str) -> Self {
        Self {
            invalid_value: value.into(),
        }
    }

    /// Returns the invalid value that caused the parse failure.
    #[must_use]
    pub fn invalid_value(&self) -> &str {
        &self.invalid_value
    }
}

impl fmt::Display for ParseSeverityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid severity '{}': expected one of 'low', 'medium', 'high'",
            self.invalid_value
        )
    }
}

impl std::error::Error for ParseSeverityError {}

/// How severe a detected secret exposure is.
///
/// Variants are ordered (`Low < Medium < High`) so the fail gate can compare
/// against a threshold with `>=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Limited scope or unlikely to be exploitable.
    Low,
    /// Could grant partial access.
    Medium,
    /// Grants broad access to sensitive resources.
    High,
}

impl Severity {
    /// All severity levels in ascending order.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Returns the numeric level used by the fail gate (`low=1 < medium=2 < high=3`).
    #[must_use]
    pub const fn level(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParseSeverityError::new(s)),
        }
    }
}

/// Derives a severity from a numeric confidence.
///
/// Used whenever a backend reports confidence without an explicit severity:
/// `>= 0.9` is high, `>= 0.7` is medium, everything below is low.
#[must_use]
pub fn severity_for_confidence(confidence: f64) -> Severity {
    if confidence >= 0.9 {
        Severity::High
    } else if confidence >= 0.7 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Maps a match's Shannon entropy to a confidence value.
///
/// Entropy above 4.5 bits is almost certainly generated material; below that
/// the confidence steps down, and a reported entropy of zero (or none) falls
/// back to [`CONFIDENCE_DEFAULT`].
#[must_use]
pub fn confidence_from_entropy(entropy: f64) -> f64 {
    if entropy > 4.5 {
        0.9
    } else if entropy > 3.5 {
        0.75
    } else if entropy > 0.0 {
        0.6
    } else {
        CONFIDENCE_DEFAULT
    }
}

/// A potential secret occurrence.
///
/// `path` is a virtual path (see [`crate::vpath`]) and may not exist on disk.
/// `line` and `column` are 1-based with `0` meaning unknown. Metadata keys
/// are lower-snake-case by convention (`gitleaks_rule_id`, `archive`,
/// `layer_digest`, `k8s_kind`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Virtual path of the scanned unit the secret was found in.
    pub path: String,

    /// 1-based line of the match; 0 when unknown.
    #[serde(default)]
    pub line: u32,

    /// 1-based column of the match; 0 when unknown.
    #[serde(default)]
    pub column: u32,

    /// The matched span as reported by the backend.
    #[serde(rename = "match")]
    pub matched: String,

    /// Raw secret value when the backend isolates it from the match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// Stable identifier of the rule that fired.
    pub detector: String,

    /// Severity of the exposure.
    pub severity: Severity,

    /// Heuristic confidence in `[0, 1]` that this is a real secret.
    pub confidence: f64,

    /// Short descriptive text from the detector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Free-form enrichment: rule id, entropy, commit, archive, layer digest...
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl Finding {
    /// Returns the canonical dedup/baseline key `path|detector|match`.
    #[must_use]
    pub fn canonical_key(&self) -> String {
        let mut key = String::with_capacity(self.path.len() + self.detector.len() + self.matched.len() + 2);
        key.push_str(&self.path);
        key.push(KEY_SEPARATOR);
        key.push_str(&self.detector);
        key.push(KEY_SEPARATOR);
        key.push_str(&self.matched);
        key
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {} [{}]",
            self.path, self.line, self.column, self.detector, self.severity,
        )
    }
}

/// Removes findings whose canonical key repeats, keeping the first occurrence.
pub fn dedup_findings(findings: &mut Vec<Finding>) {
    let mut seen = HashSet::with_capacity(findings.len());
    findings.retain(|f| seen.insert(f.canonical_key()));
}
