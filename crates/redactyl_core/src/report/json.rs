//! Plain and extended JSON report writers.

use std::io::Write;

use serde::Serialize;

use crate::budget::ArtifactStatsSnapshot;
use crate::error::ScanError;
use crate::finding::Finding;

use super::SCHEMA_VERSION;

#[derive(Serialize)]
struct ExtendedReport<'a> {
    schema_version: &'static str,
    findings: &'a [Finding],
    artifact_stats: ArtifactStatsSnapshot,
}

/// Writes the findings as a pretty-printed JSON array.
pub fn write_findings(findings: &[Finding], writer: &mut dyn Write) -> Result<(), ScanError> {
    serde_json::to_writer_pretty(&mut *writer, findings).map_err(to_config_error)?;
    writeln!(writer).map_err(|e| ScanError::io("<writer>", e))?;
    Ok(())
}

/// Writes the extended report: schema version, findings, artifact stats.
pub fn write_extended(
    findings: &[Finding],
    artifact_stats: ArtifactStatsSnapshot,
    writer: &mut dyn Write,
) -> Result<(), ScanError> {
    let report = ExtendedReport {
        schema_version: SCHEMA_VERSION,
        findings,
        artifact_stats,
    };
    serde_json::to_writer_pretty(&mut *writer, &report).map_err(to_config_error)?;
    writeln!(writer).map_err(|e| ScanError::io("<writer>", e))?;
    Ok(())
}

/// Parses a findings JSON array back into findings.
pub fn parse_findings(json: &str) -> Result<Vec<Finding>, ScanError> {
    serde_json::from_str(json).map_err(|e| ScanError::Config {
        message: format!("invalid findings JSON: {e}"),
    })
}

fn to_config_error(e: serde_json::Error) -> ScanError {
    ScanError::Config {
        message: format!("cannot serialise report: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::finding::Severity;

    use super::*;

    fn finding(path: &str) -> Finding {
        Finding {
            path: path.to_string(),
            line: 2,
            column: 7,
            matched: "ghp_x".to_string(),
            secret: Some("ghp_x".to_string()),
            detector: "vcs/github-pat".to_string(),
            severity: Severity::High,
            confidence: 0.95,
            context: Some("personal access token".to_string()),
            metadata: BTreeMap::from([("archive".to_string(), "b.zip".to_string())]),
        }
    }

    #[test]
    fn findings_survive_marshal_unmarshal() {
        let findings = vec![finding("a.txt"), finding("b.zip::inner.txt")];

        let mut buf = Vec::new();
        write_findings(&findings, &mut buf).unwrap();
        let parsed = parse_findings(std::str::from_utf8(&buf).unwrap()).unwrap();

        assert_eq!(parsed, findings);
    }

    #[test]
    fn extended_report_carries_schema_version_and_stats() {
        let stats = ArtifactStatsSnapshot {
            bytes: 1,
            entries: 2,
            depth: 0,
            time: 3,
        };

        let mut buf = Vec::new();
        write_extended(&[finding("a.txt")], stats, &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["schema_version"], "1");
        assert_eq!(value["findings"].as_array().unwrap().len(), 1);
        assert_eq!(value["artifact_stats"]["entries"], 2);
        assert_eq!(value["artifact_stats"]["time"], 3);
    }

    #[test]
    fn empty_findings_serialise_to_empty_array() {
        let mut buf = Vec::new();
        write_findings(&[], &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap().trim(), "[]");
    }

    #[test]
    fn parse_rejects_invalid_json() {
        assert!(parse_findings("{oops").is_err());
    }
}
