//! The artifact scanner facade.
//!
//! One `ArtifactScanner` lives for the duration of a scan, holding the
//! limits and the shared abort counters. Each artifact gets a fresh
//! [`BudgetTracker`]; per-artifact aborts never stop the overall scan.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use flate2::read::GzDecoder;

use redactyl_core::budget::{ArtifactLimits, ArtifactStats, ArtifactStatsSnapshot, BudgetTracker};
use redactyl_core::error::ScanError;
use redactyl_core::vpath::VirtualPath;

use crate::decoders::{docker, gzip, helm, oci, remote, tar, zip};
use crate::detect::{ArtifactKind, detect_artifact};
use crate::sink::EntrySink;

/// Number of leading bytes sniffed for magic detection.
const HEAD_BYTES: usize = 512;

/// Dispatches artifact files and directories to their format decoders.
#[derive(Debug)]
pub struct ArtifactScanner {
    limits: ArtifactLimits,
    stats: Arc<ArtifactStats>,
}

impl ArtifactScanner {
    /// Creates a scanner sharing `stats` with the rest of the pipeline.
    #[must_use]
    pub fn new(limits: ArtifactLimits, stats: Arc<ArtifactStats>) -> Self {
        Self { limits, stats }
    }

    /// The limits this scanner enforces.
    #[must_use]
    pub const fn limits(&self) -> &ArtifactLimits {
        &self.limits
    }

    /// Point-in-time copy of the shared abort counters.
    #[must_use]
    pub fn stats_snapshot(&self) -> ArtifactStatsSnapshot {
        self.stats.snapshot()
    }

    /// Decodes one artifact file when `allow` accepts its outer path.
    ///
    /// Non-artifact files are ignored. Entries inside an accepted artifact
    /// are not re-filtered: include/exclude globs select which archives are
    /// entered, not which entries they yield.
    pub fn scan_file(
        &self,
        rel: &str,
        abs: &Path,
        allow: &dyn Fn(&str) -> bool,
        sink: &mut dyn EntrySink,
    ) -> Result<(), ScanError> {
        if !allow(rel) {
            return Ok(());
        }

        let mut file = File::open(abs).map_err(|e| ScanError::io(abs, e))?;
        let mut head = [0u8; HEAD_BYTES];
        let head_len = read_head(&mut file, &mut head).map_err(|e| ScanError::io(abs, e))?;

        let Some(kind) = detect_artifact(rel, &head[..head_len]) else {
            return Ok(());
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(path = rel, kind = ?kind, "decoding artifact");

        let mut budget = BudgetTracker::new(&self.limits, &self.stats);
        let mut metadata = BTreeMap::new();
        metadata.insert("archive".to_string(), rel.to_string());
        let base = VirtualPath::file(rel);

        match kind {
            ArtifactKind::Zip => zip::scan_zip_reader(file, &base, &metadata, &mut budget, sink),
            ArtifactKind::TarGz => tar::scan_tar_reader(GzDecoder::new(file), &base, &metadata, &mut budget, sink),
            ArtifactKind::Gzip => gzip::scan_gzip_reader(file, &base, &metadata, &mut budget, sink),
            ArtifactKind::HelmArchive => helm::scan_chart_archive(file, &base, &metadata, &mut budget, sink),
            ArtifactKind::Tar => {
                let handled = docker::try_scan_docker_save(&mut file, &base, &metadata, &mut budget, sink)?;
                if handled {
                    return Ok(());
                }
                tar::scan_tar_reader(&mut file, &base, &metadata, &mut budget, sink)
            }
        }
    }

    /// Emits the scannable files of a Helm chart directory.
    pub fn scan_chart_dir(&self, rel: &str, dir: &Path, sink: &mut dyn EntrySink) -> Result<(), ScanError> {
        let mut budget = BudgetTracker::new(&self.limits, &self.stats);
        helm::scan_chart_dir(rel, dir, &mut budget, sink)
    }

    /// Streams the layers of an on-disk OCI image layout.
    pub fn scan_oci_dir(&self, rel: &str, dir: &Path, sink: &mut dyn EntrySink) -> Result<(), ScanError> {
        let mut budget = BudgetTracker::new(&self.limits, &self.stats);
        oci::scan_oci_layout(rel, dir, &mut budget, sink)
    }

    /// Resolves and streams a remote registry image.
    pub fn scan_remote_image(&self, reference: &str, sink: &mut dyn EntrySink) -> Result<(), ScanError> {
        let parsed = remote::ImageReference::parse(reference)?;
        let mut budget = BudgetTracker::new(&self.limits, &self.stats);
        remote::scan_remote_image(&parsed, &mut budget, sink)
    }
}

fn read_head(file: &mut File, head: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < head.len() {
        let n = file.read(&mut head[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    file.seek(SeekFrom::Start(0))?;
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use tempfile::TempDir;

    use crate::sink::CollectSink;

    use super::*;

    fn scanner(limits: ArtifactLimits) -> ArtifactScanner {
        ArtifactScanner::new(limits, Arc::new(ArtifactStats::new()))
    }

    fn write_zip(path: &Path, files: &[(&str, &[u8])]) {
        let mut writer = ::zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = ::zip::write::SimpleFileOptions::default();
        for (name, content) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
        std::fs::write(path, writer.finish().unwrap().into_inner()).unwrap();
    }

    #[test]
    fn zip_file_is_dispatched_and_entries_emitted() {
        let dir = TempDir::new().unwrap();
        let zip_path = dir.path().join("sample.zip");
        write_zip(&zip_path, &[("secrets.txt", b"api_key=x")]);

        let scanner = scanner(ArtifactLimits::default());
        let mut sink = CollectSink::new();

        scanner
            .scan_file("b/sample.zip", &zip_path, &|_| true, &mut sink)
            .unwrap();

        assert_eq!(sink.paths(), vec!["b/sample.zip::secrets.txt"]);
        assert_eq!(
            sink.entries[0].0.metadata.get("archive"),
            Some(&"b/sample.zip".to_string())
        );
    }

    #[test]
    fn disallowed_outer_path_is_skipped_entirely() {
        let dir = TempDir::new().unwrap();
        let zip_path = dir.path().join("blocked.zip");
        write_zip(&zip_path, &[("secrets.txt", b"api_key=x")]);

        let scanner = scanner(ArtifactLimits::default());
        let mut sink = CollectSink::new();

        scanner
            .scan_file("drop/blocked.zip", &zip_path, &|rel| !rel.contains("blocked"), &mut sink)
            .unwrap();

        assert!(sink.entries.is_empty());
    }

    #[test]
    fn non_artifact_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "plain text").unwrap();

        let scanner = scanner(ArtifactLimits::default());
        let mut sink = CollectSink::new();

        scanner.scan_file("notes.txt", &path, &|_| true, &mut sink).unwrap();
        assert!(sink.entries.is_empty());
    }

    #[test]
    fn extensionless_zip_is_detected_by_magic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blob");
        write_zip(&path, &[("inner.txt", b"x")]);

        let scanner = scanner(ArtifactLimits::default());
        let mut sink = CollectSink::new();

        scanner.scan_file("blob", &path, &|_| true, &mut sink).unwrap();
        assert_eq!(sink.paths(), vec!["blob::inner.txt"]);
    }

    #[test]
    fn stats_accumulate_across_artifacts() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.zip");
        let b = dir.path().join("b.zip");
        write_zip(&a, &[("1", b"x"), ("2", b"y")]);
        write_zip(&b, &[("1", b"x"), ("2", b"y")]);

        let scanner = scanner(ArtifactLimits {
            max_entries: 1,
            ..ArtifactLimits::default()
        });
        let mut sink = CollectSink::new();

        scanner.scan_file("a.zip", &a, &|_| true, &mut sink).unwrap();
        scanner.scan_file("b.zip", &b, &|_| true, &mut sink).unwrap();

        assert_eq!(scanner.stats_snapshot().entries, 2);
    }
}
