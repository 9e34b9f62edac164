//! On-disk OCI image layout decoding.
//!
//! An OCI layout directory carries `oci-layout`/`index.json` plus a
//! `blobs/sha256/` content store. The index lists manifests; each manifest
//! lists layer blobs, which are streamed as (possibly gzipped) tars under
//! `<dir>::<digest>::entry` virtual paths.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use serde::Deserialize;

use redactyl_core::budget::BudgetTracker;
use redactyl_core::error::ScanError;
use redactyl_core::vpath::VirtualPath;

use crate::detect::is_gzip_magic;
use crate::sink::EntrySink;

use super::tar::scan_tar_reader;

/// A content descriptor as used by OCI indexes and manifests.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OciDescriptor {
    /// `sha256:<hex>` content address.
    pub digest: String,
    /// Media type of the referenced blob.
    #[serde(rename = "mediaType", default)]
    pub media_type: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OciIndex {
    #[serde(default)]
    pub manifests: Vec<OciDescriptor>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OciManifest {
    #[serde(default)]
    pub layers: Vec<OciDescriptor>,
}

/// Returns `true` when `dir` is an OCI image layout.
#[must_use]
pub fn is_oci_layout(dir: &Path) -> bool {
    dir.join("oci-layout").is_file() || dir.join("index.json").is_file()
}

/// Streams every layer of every manifest in the layout.
pub(crate) fn scan_oci_layout(
    rel: &str,
    dir: &Path,
    budget: &mut BudgetTracker<'_>,
    sink: &mut dyn EntrySink,
) -> Result<(), ScanError> {
    let index_path = dir.join("index.json");
    let index_bytes = std::fs::read(&index_path).map_err(|e| ScanError::io(&index_path, e))?;
    let index: OciIndex =
        serde_json::from_slice(&index_bytes).map_err(|e| ScanError::decode(rel, format!("invalid index.json: {e}")))?;

    let base = VirtualPath::file(rel);

    for descriptor in &index.manifests {
        let Some(manifest_bytes) = read_blob(dir, &descriptor.digest) else {
            continue;
        };
        let Ok(manifest) = serde_json::from_slice::<OciManifest>(&manifest_bytes) else {
            continue;
        };

        for layer in &manifest.layers {
            if let Err(reason) = budget.check() {
                budget.abort(reason);
                return Ok(());
            }
            if !budget.enter() {
                continue;
            }

            let result = scan_layer_blob(dir, rel, &base, layer, budget, sink);
            budget.leave();
            result?;
        }
    }

    Ok(())
}

fn scan_layer_blob(
    dir: &Path,
    rel: &str,
    base: &VirtualPath,
    layer: &OciDescriptor,
    budget: &mut BudgetTracker<'_>,
    sink: &mut dyn EntrySink,
) -> Result<(), ScanError> {
    let Some(path) = blob_path(dir, &layer.digest) else {
        return Ok(());
    };
    let Ok(file) = File::open(&path) else {
        return Ok(());
    };

    let mut metadata = BTreeMap::new();
    metadata.insert("image".to_string(), rel.to_string());
    metadata.insert("layer_digest".to_string(), layer.digest.clone());

    let layer_base = base.child(layer.digest.clone());
    let mut reader = BufReader::new(file);
    let gzipped = layer.media_type.contains("gzip") || reader.fill_buf().map(is_gzip_magic).unwrap_or(false);

    if gzipped {
        scan_tar_reader(GzDecoder::new(reader), &layer_base, &metadata, budget, sink)
    } else {
        scan_tar_reader(reader, &layer_base, &metadata, budget, sink)
    }
}

fn read_blob(dir: &Path, digest: &str) -> Option<Vec<u8>> {
    std::fs::read(blob_path(dir, digest)?).ok()
}

fn blob_path(dir: &Path, digest: &str) -> Option<std::path::PathBuf> {
    let (algorithm, hex) = digest.split_once(':')?;
    Some(dir.join("blobs").join(algorithm).join(hex))
}
