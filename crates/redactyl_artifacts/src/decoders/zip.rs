//! Streaming zip decoding.

use std::collections::BTreeMap;
use std::io::{Read, Seek};

use zip::ZipArchive;

use redactyl_core::budget::BudgetTracker;
use redactyl_core::error::ScanError;
use redactyl_core::vpath::VirtualPath;

use crate::sink::EntrySink;

use super::emit_or_recurse;

/// Iterates a zip central directory, emitting each file entry under `base`.
pub(crate) fn scan_zip_reader<R: Read + Seek>(
    reader: R,
    base: &VirtualPath,
    metadata: &BTreeMap<String, String>,
    budget: &mut BudgetTracker<'_>,
    sink: &mut dyn EntrySink,
) -> Result<(), ScanError> {
    let mut archive = ZipArchive::new(reader).map_err(|e| ScanError::decode(base.to_string(), e.to_string()))?;

    for index in 0..archive.len() {
        let Ok(mut file) = archive.by_index(index) else {
            continue;
        };
        if file.is_dir() {
            continue;
        }

        let name = file.name().to_string();
        let declared_size = file.size();

        budget.add_entry();
        if let Err(reason) = budget.check() {
            budget.abort(reason);
            break;
        }

        budget.add_bytes(declared_size);
        if let Err(reason) = budget.check() {
            budget.abort(reason);
            break;
        }

        let mut bytes = Vec::new();
        // Cap the read at the declared size so a lying header cannot balloon
        // past the budget already charged.
        if (&mut file).take(declared_size).read_to_end(&mut bytes).is_err() {
            continue;
        }

        emit_or_recurse(base.child(name), bytes, metadata, budget, sink)?;
    }

    Ok(())
}
