//! Output rendering for scan results.
//!
//! Text goes through the terminal renderer below; JSON, extended JSON, and
//! SARIF delegate to the core report writers. Findings are sorted by
//! `(path, line)` so output is deterministic regardless of worker order.

use std::io::Write;

use redactyl_core::finding::{Finding, Severity};
use redactyl_core::report;
use redactyl_engine::ScanResult;

use crate::OutputFormat;
use crate::ui::colors;

/// Tool version stamped into reports.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Renders a scan result in the requested format.
pub fn write_result(result: &ScanResult, format: OutputFormat, writer: &mut dyn Write) -> anyhow::Result<()> {
    let mut findings = result.findings.clone();
    sort_findings(&mut findings);

    match format {
        OutputFormat::Text => write_text(&findings, result, writer)?,
        OutputFormat::Json => report::write_findings(&findings, writer)?,
        OutputFormat::JsonExtended => report::write_extended(&findings, result.artifact_stats, writer)?,
        OutputFormat::Sarif => report::write_sarif_extended(&findings, VERSION, result.artifact_stats, writer)?,
    }

    Ok(())
}

/// Sorts findings by `(path, line)` for a deterministic view.
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| a.path.cmp(&b.path).then(a.line.cmp(&b.line)));
}

fn write_text(findings: &[Finding], result: &ScanResult, writer: &mut dyn Write) -> std::io::Result<()> {
    for finding in findings {
        let severity = severity_style(finding.severity).apply_to(finding.severity.to_string());
        writeln!(
            writer,
            "{}:{} [{severity}] {} {}",
            colors::accent().apply_to(&finding.path),
            finding.line,
            finding.detector,
            colors::dim().apply_to(mask(&finding.matched)),
        )?;
    }

    if !findings.is_empty() {
        writeln!(writer)?;
    }

    let stats = result.artifact_stats;
    let aborts = stats.bytes + stats.entries + stats.depth + stats.time;
    let when = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");

    writeln!(
        writer,
        "{} {} finding(s) across {} unit(s) in {:.2}s ({when})",
        summary_marker(findings),
        findings.len(),
        result.files_scanned,
        result.duration.as_secs_f64(),
    )?;
    if aborts > 0 {
        writeln!(
            writer,
            "  {} artifact budget abort(s): bytes={} entries={} depth={} time={}",
            colors::warning().apply_to("!"),
            stats.bytes,
            stats.entries,
            stats.depth,
            stats.time,
        )?;
    }

    Ok(())
}

fn summary_marker(findings: &[Finding]) -> String {
    if findings.is_empty() {
        colors::success().apply_to("✓").to_string()
    } else {
        colors::error().apply_to("✗").to_string()
    }
}

fn severity_style(severity: Severity) -> console::Style {
    match severity {
        Severity::High => colors::error(),
        Severity::Medium => colors::warning(),
        Severity::Low => colors::dim(),
    }
}

/// Masks a matched span for terminal display: first and last two characters
/// survive, the middle is blanked.
#[must_use]
pub fn mask(matched: &str) -> String {
    let chars: Vec<char> = matched.chars().collect();
    if chars.len() <= 6 {
        return "•".repeat(chars.len());
    }

    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}{}{tail}", "•".repeat(chars.len() - 4))
}
