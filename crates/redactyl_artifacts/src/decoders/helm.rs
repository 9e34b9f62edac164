//! Helm chart decoding.
//!
//! Chart directories (a `Chart.yaml` next to `values.yaml` and `templates/`)
//! emit their scannable files directly under their real paths. Chart
//! archives (`.tgz`) are walked as tar.gz with the scannable-set filter;
//! a `.tgz` without a chart layout inside falls back to a plain tar.gz walk.

use std::collections::BTreeMap;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use flate2::read::GzDecoder;

use redactyl_core::budget::BudgetTracker;
use redactyl_core::error::ScanError;
use redactyl_core::scanner::ScanContext;
use redactyl_core::vpath::VirtualPath;

use crate::sink::EntrySink;

use super::emit_or_recurse;
use super::tar::scan_tar_reader;

const CHART_MANIFEST: &str = "Chart.yaml";

/// Returns `true` when `dir` is a Helm chart directory.
#[must_use]
pub fn is_chart_dir(dir: &Path) -> bool {
    dir.join(CHART_MANIFEST).is_file()
}

/// Returns `true` when a path inside a chart belongs to the scannable set:
/// `Chart.yaml`, `values*.yaml`, templates, and anything that names a secret
/// or configmap.
#[must_use]
pub fn is_helm_scannable(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    let basename = lower.rsplit('/').next().unwrap_or(&lower);

    if basename == "chart.yaml" {
        return true;
    }
    if basename.starts_with("values") && (basename.ends_with(".yaml") || basename.ends_with(".yml")) {
        return true;
    }
    if lower.split('/').any(|c| c == "templates") && (lower.ends_with(".yaml") || lower.ends_with(".yml")) {
        return true;
    }
    lower.contains("secret") || lower.contains("configmap")
}

/// Emits the scannable files of an on-disk chart directory.
///
/// Entries keep their real repository-relative paths (the chart is a
/// directory, not a container), tagged with `helm_chart` metadata.
pub(crate) fn scan_chart_dir(
    rel: &str,
    dir: &Path,
    budget: &mut BudgetTracker<'_>,
    sink: &mut dyn EntrySink,
) -> Result<(), ScanError> {
    let mut metadata = BTreeMap::new();
    metadata.insert("helm_chart".to_string(), rel.to_string());

    emit_chart_file(rel, dir, CHART_MANIFEST, &metadata, budget, sink)?;

    let root_entries = std::fs::read_dir(dir).map_err(|e| ScanError::io(dir, e))?;
    for entry in root_entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with("values") && (name.ends_with(".yaml") || name.ends_with(".yml")) {
            emit_chart_file(rel, dir, &name, &metadata, budget, sink)?;
        }
    }

    emit_templates(rel, dir, &dir.join("templates"), &metadata, budget, sink)
}

fn emit_templates(
    rel: &str,
    chart_root: &Path,
    dir: &Path,
    metadata: &BTreeMap<String, String>,
    budget: &mut BudgetTracker<'_>,
    sink: &mut dyn EntrySink,
) -> Result<(), ScanError> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Ok(());
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            emit_templates(rel, chart_root, &path, metadata, budget, sink)?;
            continue;
        }

        let Ok(inside) = path.strip_prefix(chart_root) else {
            continue;
        };
        let inside = inside.to_string_lossy().replace('\\', "/");
        emit_chart_file(rel, chart_root, &inside, metadata, budget, sink)?;
    }

    Ok(())
}

fn emit_chart_file(
    rel: &str,
    chart_root: &Path,
    inside: &str,
    metadata: &BTreeMap<String, String>,
    budget: &mut BudgetTracker<'_>,
    sink: &mut dyn EntrySink,
) -> Result<(), ScanError> {
    let path = chart_root.join(inside);
    if !path.is_file() {
        return Ok(());
    }

    budget.add_entry();
    if let Err(reason) = budget.check() {
        budget.abort(reason);
        return Ok(());
    }

    let Ok(bytes) = std::fs::read(&path) else {
        return Ok(());
    };

    budget.add_bytes(bytes.len() as u64);
    if let Err(reason) = budget.check() {
        budget.abort(reason);
        return Ok(());
    }

    let context = ScanContext {
        virtual_path: format!("{rel}/{inside}"),
        real_path: path,
        metadata: metadata.clone(),
    };
    sink.entry(context, bytes)
}

/// Decodes a chart archive, or falls back to a plain tar.gz walk when no
/// chart layout is found inside.
pub(crate) fn scan_chart_archive<R: Read + Seek>(
    mut reader: R,
    base: &VirtualPath,
    metadata: &BTreeMap<String, String>,
    budget: &mut BudgetTracker<'_>,
    sink: &mut dyn EntrySink,
) -> Result<(), ScanError> {
    let is_chart = archive_has_chart_manifest(&mut reader);
    reader
        .seek(SeekFrom::Start(0))
        .map_err(|e| ScanError::decode(base.to_string(), e.to_string()))?;

    if !is_chart {
        return scan_tar_reader(GzDecoder::new(reader), base, metadata, budget, sink);
    }

    let mut chart_metadata = metadata.clone();
    chart_metadata.insert("helm_chart".to_string(), base.to_string());

    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    let entries = archive
        .entries()
        .map_err(|e| ScanError::decode(base.to_string(), e.to_string()))?;

    for entry in entries {
        let Ok(mut entry) = entry else { break };
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let Some(name) = entry.path().ok().map(|p| p.to_string_lossy().into_owned()) else {
            continue;
        };
        if !is_helm_scannable(&name) {
            continue;
        }

        budget.add_entry();
        if let Err(reason) = budget.check() {
            budget.abort(reason);
            break;
        }

        let size = entry.header().size().unwrap_or(0);
        budget.add_bytes(size);
        if let Err(reason) = budget.check() {
            budget.abort(reason);
            break;
        }

        let mut bytes = Vec::new();
        if entry.read_to_end(&mut bytes).is_err() {
            continue;
        }

        emit_or_recurse(base.child(name), bytes, &chart_metadata, budget, sink)?;
    }

    Ok(())
}

fn archive_has_chart_manifest<R: Read>(reader: &mut R) -> bool {
    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    let Ok(entries) = archive.entries() else {
        return false;
    };

    for entry in entries.flatten() {
        let Ok(path) = entry.path() else { continue };
        let is_manifest = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy() == CHART_MANIFEST);
        if is_manifest {
            return true;
        }
    }

    false
}
