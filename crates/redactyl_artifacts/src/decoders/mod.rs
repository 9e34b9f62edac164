//! Format decoders and the shared emit-or-recurse step.

pub(crate) mod docker;
pub(crate) mod gzip;
pub(crate) mod helm;
pub(crate) mod iac;
pub(crate) mod k8s;
pub(crate) mod oci;
pub(crate) mod remote;
pub(crate) mod tar;
pub(crate) mod zip;

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::PathBuf;

use flate2::read::GzDecoder;

use redactyl_core::budget::BudgetTracker;
use redactyl_core::error::ScanError;
use redactyl_core::scanner::ScanContext;
use redactyl_core::vpath::VirtualPath;

use crate::detect::{ArtifactKind, nested_kind};
use crate::sink::EntrySink;

/// Hands one decoded entry downstream: recurse when it is itself an archive
/// and depth permits, emit it to the sink otherwise.
///
/// Entries one level past `max_depth` are not entered and not emitted; the
/// depth abort has already been recorded by the tracker.
pub(crate) fn emit_or_recurse(
    vpath: VirtualPath,
    bytes: Vec<u8>,
    metadata: &BTreeMap<String, String>,
    budget: &mut BudgetTracker<'_>,
    sink: &mut dyn EntrySink,
) -> Result<(), ScanError> {
    let leaf = vpath.leaf().unwrap_or_default().to_string();

    if let Some(kind) = nested_kind(&leaf, &bytes) {
        if budget.enter() {
            let result = scan_nested(kind, bytes, &vpath, metadata, budget, sink);
            budget.leave();
            return result;
        }
        return Ok(());
    }

    let context = ScanContext {
        virtual_path: vpath.to_string(),
        real_path: PathBuf::new(),
        metadata: metadata.clone(),
    };
    sink.entry(context, bytes)
}

fn scan_nested(
    kind: ArtifactKind,
    bytes: Vec<u8>,
    vpath: &VirtualPath,
    metadata: &BTreeMap<String, String>,
    budget: &mut BudgetTracker<'_>,
    sink: &mut dyn EntrySink,
) -> Result<(), ScanError> {
    let cursor = Cursor::new(bytes);
    match kind {
        ArtifactKind::Zip => zip::scan_zip_reader(cursor, vpath, metadata, budget, sink),
        ArtifactKind::Tar => tar::scan_tar_reader(cursor, vpath, metadata, budget, sink),
        ArtifactKind::TarGz | ArtifactKind::HelmArchive => {
            tar::scan_tar_reader(GzDecoder::new(cursor), vpath, metadata, budget, sink)
        }
        ArtifactKind::Gzip => gzip::scan_gzip_reader(cursor, vpath, metadata, budget, sink),
    }
}
