//! Upload envelope for forwarding findings to an HTTP collector.

use serde::{Deserialize, Serialize};

use crate::TOOL_NAME;
use crate::finding::Finding;
use crate::git::RepoInfo;

use super::SCHEMA_VERSION;

/// The document posted when a caller forwards findings to an endpoint.
///
/// Repository metadata is best-effort: fields stay absent when the scan ran
/// outside a git repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadEnvelope {
    /// Always `"redactyl"`.
    pub tool: String,
    /// Tool version that produced the findings.
    pub version: String,
    /// Findings schema version.
    pub schema_version: String,
    /// Repository slug or remote URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    /// HEAD commit at scan time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    /// Branch at scan time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// The findings payload.
    pub findings: Vec<Finding>,
}

impl UploadEnvelope {
    /// Wraps findings with tool identity and optional repository metadata.
    #[must_use]
    pub fn new(findings: Vec<Finding>, version: impl Into<String>, repo_info: Option<RepoInfo>) -> Self {
        let info = repo_info.unwrap_or_default();
        Self {
            tool: TOOL_NAME.to_string(),
            version: version.into(),
            schema_version: SCHEMA_VERSION.to_string(),
            repo: info.repo,
            commit: info.commit,
            branch: info.branch,
            findings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_identifies_the_tool_and_schema() {
        let envelope = UploadEnvelope::new(Vec::new(), "0.4.0", None);
        assert_eq!(envelope.tool, "redactyl");
        assert_eq!(envelope.schema_version, "1");
        assert_eq!(envelope.version, "0.4.0");
    }

    #[test]
    fn repo_metadata_is_optional_in_json() {
        let envelope = UploadEnvelope::new(Vec::new(), "0.4.0", None);
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(!json.contains("repo"));
        assert!(!json.contains("commit"));
        assert!(!json.contains("branch"));
    }

    #[test]
    fn repo_metadata_is_carried_when_known() {
        let info = RepoInfo {
            repo: Some("varalys/redactyl".to_string()),
            commit: Some("abc123".to_string()),
            branch: Some("main".to_string()),
        };

        let envelope = UploadEnvelope::new(Vec::new(), "0.4.0", Some(info));
        let value: serde_json::Value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(value["repo"], "varalys/redactyl");
        assert_eq!(value["commit"], "abc123");
        assert_eq!(value["branch"], "main");
    }
}
