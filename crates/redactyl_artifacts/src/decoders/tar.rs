//! Streaming tar decoding, shared by plain tars, tar.gz, docker layers, and
//! OCI layer blobs.

use std::collections::BTreeMap;
use std::io::Read;

use redactyl_core::budget::BudgetTracker;
use redactyl_core::error::ScanError;
use redactyl_core::vpath::VirtualPath;

use crate::sink::EntrySink;

use super::emit_or_recurse;

/// Iterates a tar stream, emitting each regular file under `base`.
///
/// Entries are charged against the budget before their bodies are read; the
/// first entry past a cap records the abort and stops the iteration, which
/// is a successful outcome.
pub(crate) fn scan_tar_reader<R: Read>(
    reader: R,
    base: &VirtualPath,
    metadata: &BTreeMap<String, String>,
    budget: &mut BudgetTracker<'_>,
    sink: &mut dyn EntrySink,
) -> Result<(), ScanError> {
    let mut archive = tar::Archive::new(reader);
    let entries = archive
        .entries()
        .map_err(|e| ScanError::decode(base.to_string(), e.to_string()))?;

    for entry in entries {
        let Ok(mut entry) = entry else {
            // Truncated or corrupt member; everything before it was emitted.
            break;
        };

        if !entry.header().entry_type().is_file() {
            continue;
        }

        let Some(name) = entry_name(&entry) else { continue };

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

        emit_or_recurse(base.child(name), bytes, metadata, budget, sink)?;
    }

    Ok(())
}

fn entry_name<R: Read>(entry: &tar::Entry<'_, R>) -> Option<String> {
    let path = entry.path().ok()?;
    let name = path.to_string_lossy().into_owned();
    if name.is_empty() { None } else { Some(name) }
}
