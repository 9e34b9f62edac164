//! SARIF v2.1.0 report writer.

use std::collections::HashMap;
use std::io::Write;

use serde::Serialize;

use crate::TOOL_NAME;
use crate::budget::ArtifactStatsSnapshot;
use crate::error::ScanError;
use crate::finding::{Finding, Severity};

const SARIF_VERSION: &str = "2.1.0";
const SARIF_SCHEMA: &str = "https://json.schemastore.org/sarif-2.1.0.json";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifReport {
    #[serde(rename = "$schema")]
    schema: &'static str,
    version: &'static str,
    runs: Vec<SarifRun>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    properties: Option<SarifRunProperties>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifRunProperties {
    artifact_stats: ArtifactStatsSnapshot,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifDriver {
    name: &'static str,
    version: String,
    rules: Vec<SarifRule>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifRule {
    id: String,
    short_description: SarifMessage,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifResult {
    rule_id: String,
    rule_index: usize,
    level: &'static str,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifMessage {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifLocation {
    physical_location: SarifPhysicalLocation,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifPhysicalLocation {
    artifact_location: SarifArtifactLocation,
    region: SarifRegion,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifArtifactLocation {
    uri: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifRegion {
    start_line: u32,
    snippet: SarifSnippet,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifSnippet {
    text: String,
}

/// Serialises findings as a SARIF v2.1.0 document with one run.
pub fn write_sarif(findings: &[Finding], tool_version: &str, writer: &mut dyn Write) -> Result<(), ScanError> {
    write_document(findings, tool_version, None, writer)
}

/// Like [`write_sarif`], additionally carrying artifact stats as run
/// properties.
pub fn write_sarif_extended(
    findings: &[Finding],
    tool_version: &str,
    artifact_stats: ArtifactStatsSnapshot,
    writer: &mut dyn Write,
) -> Result<(), ScanError> {
    write_document(findings, tool_version, Some(artifact_stats), writer)
}

fn write_document(
    findings: &[Finding],
    tool_version: &str,
    artifact_stats: Option<ArtifactStatsSnapshot>,
    writer: &mut dyn Write,
) -> Result<(), ScanError> {
    let (rules, rule_index) = build_rules(findings);
    let results = build_results(findings, &rule_index);

    let report = SarifReport {
        schema: SARIF_SCHEMA,
        version: SARIF_VERSION,
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: TOOL_NAME,
                    version: tool_version.to_string(),
                    rules,
                },
            },
            results,
            properties: artifact_stats.map(|s| SarifRunProperties { artifact_stats: s }),
        }],
    };

    serde_json::to_writer_pretty(&mut *writer, &report).map_err(|e| ScanError::Config {
        message: format!("cannot serialise SARIF report: {e}"),
    })?;
    writeln!(writer).map_err(|e| ScanError::io("<writer>", e))?;
    Ok(())
}

/// Builds the deduplicated rule table and an id → index map.
///
/// Rules appear in first-seen order so results can reference them by index.
fn build_rules(findings: &[Finding]) -> (Vec<SarifRule>, HashMap<String, usize>) {
    let mut rules = Vec::new();
    let mut index = HashMap::new();

    for finding in findings {
        if index.contains_key(&finding.detector) {
            continue;
        }
        index.insert(finding.detector.clone(), rules.len());
        rules.push(SarifRule {
            id: finding.detector.clone(),
            short_description: SarifMessage {
                text: finding
                    .context
                    .clone()
                    .unwrap_or_else(|| format!("Secret detector {}", finding.detector)),
            },
        });
    }

    (rules, index)
}

fn build_results(findings: &[Finding], rule_index: &HashMap<String, usize>) -> Vec<SarifResult> {
    findings
        .iter()
        .map(|f| SarifResult {
            rule_id: f.detector.clone(),
            rule_index: rule_index.get(&f.detector).copied().unwrap_or(0),
            level: severity_to_level(f.severity),
            message: SarifMessage {
                text: format!("Potential secret detected: {}", f.detector),
            },
            locations: vec![SarifLocation {
                physical_location: SarifPhysicalLocation {
                    artifact_location: SarifArtifactLocation { uri: f.path.clone() },
                    region: SarifRegion {
                        start_line: f.line.max(1),
                        snippet: SarifSnippet {
                            text: f.matched.clone(),
                        },
                    },
                },
            }],
        })
        .collect()
}

const fn severity_to_level(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "error",
        Severity::Medium => "warning",
        Severity::Low => "note",
    }
}
