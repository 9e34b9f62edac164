//! Docker-save tarball decoding.
//!
//! `docker save` writes a tar whose root holds `manifest.json` describing
//! one or more images and the layer tars they reference. Decoding is two
//! passes over the outer tar: the first finds and parses the manifest, the
//! second streams every referenced layer through the inner tar iterator.

use std::collections::{BTreeMap, HashSet};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};

use flate2::read::GzDecoder;
use serde::Deserialize;

use redactyl_core::budget::BudgetTracker;
use redactyl_core::error::ScanError;
use redactyl_core::vpath::VirtualPath;

use crate::detect::is_gzip_magic;
use crate::sink::EntrySink;

use super::tar::scan_tar_reader;

const MANIFEST_NAME: &str = "manifest.json";

/// One image record in a docker-save `manifest.json`.
#[derive(Debug, Deserialize)]
struct ManifestImage {
    #[serde(rename = "Config")]
    #[expect(dead_code, reason = "config digest is part of the schema check, not scanned")]
    config: Option<String>,
    #[serde(rename = "RepoTags", default)]
    repo_tags: Option<Vec<String>>,
    #[serde(rename = "Layers", default)]
    layers: Vec<String>,
}

/// Attempts to decode `reader` as a docker-save tarball.
///
/// Returns `Ok(false)` with the reader rewound when no docker manifest is
/// present, so the caller can fall back to a plain tar walk.
pub(crate) fn try_scan_docker_save<R: Read + Seek>(
    reader: &mut R,
    base: &VirtualPath,
    metadata: &BTreeMap<String, String>,
    budget: &mut BudgetTracker<'_>,
    sink: &mut dyn EntrySink,
) -> Result<bool, ScanError> {
    let images = read_manifest(reader, base)?;
    reader
        .seek(SeekFrom::Start(0))
        .map_err(|e| ScanError::decode(base.to_string(), e.to_string()))?;

    let Some(images) = images else {
        return Ok(false);
    };

    let layer_names: HashSet<&str> = images.iter().flat_map(|i| i.layers.iter().map(String::as_str)).collect();
    let image_tag = images
        .iter()
        .find_map(|i| i.repo_tags.as_ref().and_then(|tags| tags.first()).cloned());

    let mut archive = tar::Archive::new(reader);
    let entries = archive
        .entries()
        .map_err(|e| ScanError::decode(base.to_string(), e.to_string()))?;

    for entry in entries {
        let Ok(entry) = entry else { break };

        let Some(name) = entry.path().ok().map(|p| p.to_string_lossy().into_owned()) else {
            continue;
        };
        if !layer_names.contains(name.as_str()) {
            continue;
        }

        if let Err(reason) = budget.check() {
            budget.abort(reason);
            break;
        }

        if !budget.enter() {
            continue;
        }

        let mut layer_metadata = metadata.clone();
        layer_metadata.insert("layer".to_string(), name.clone());
        if let Some(tag) = &image_tag {
            layer_metadata.insert("image_tag".to_string(), tag.clone());
        }

        let layer_base = base.child(name);
        let result = scan_layer(entry, &layer_base, &layer_metadata, budget, sink);
        budget.leave();
        result?;
    }

    Ok(true)
}

/// Streams one layer entry as a tar, transparently ungzipping when the layer
/// was stored compressed.
fn scan_layer<R: Read>(
    entry: R,
    layer_base: &VirtualPath,
    metadata: &BTreeMap<String, String>,
    budget: &mut BudgetTracker<'_>,
    sink: &mut dyn EntrySink,
) -> Result<(), ScanError> {
    let mut buffered = BufReader::new(entry);
    let compressed = buffered.fill_buf().map(is_gzip_magic).unwrap_or(false);

    if compressed {
        scan_tar_reader(GzDecoder::new(buffered), layer_base, metadata, budget, sink)
    } else {
        scan_tar_reader(buffered, layer_base, metadata, budget, sink)
    }
}

/// First pass: finds and parses `manifest.json` at the tar root.
fn read_manifest<R: Read>(reader: &mut R, base: &VirtualPath) -> Result<Option<Vec<ManifestImage>>, ScanError> {
    let mut archive = tar::Archive::new(reader);
    let entries = match archive.entries() {
        Ok(entries) => entries,
        Err(_) => return Ok(None),
    };

    for entry in entries {
        let Ok(mut entry) = entry else { break };
        let is_manifest = entry
            .path()
            .ok()
            .and_then(|p| p.to_str().map(|s| s == MANIFEST_NAME))
            .unwrap_or(false);
        if !is_manifest {
            continue;
        }

        let mut content = Vec::new();
        entry
            .read_to_end(&mut content)
            .map_err(|e| ScanError::decode(base.to_string(), e.to_string()))?;

        // A root manifest.json that is not the docker schema means this is
        // just a tar that happens to contain such a file.
        return Ok(serde_json::from_slice(&content).ok());
    }

    Ok(None)
}
