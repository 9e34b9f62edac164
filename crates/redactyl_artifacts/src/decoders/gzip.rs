//! Single-member gzip decoding.
//!
//! A gzip file that is not a tar wraps exactly one synthetic entry, named
//! from the gzip header filename when stored, else from the outer filename
//! with its `.gz` suffix removed.

use std::collections::BTreeMap;
use std::io::Read;

use flate2::read::GzDecoder;

use redactyl_core::budget::{AbortReason, BudgetTracker};
use redactyl_core::error::ScanError;
use redactyl_core::vpath::VirtualPath;

use crate::sink::EntrySink;

use super::emit_or_recurse;

pub(crate) fn scan_gzip_reader<R: Read>(
    reader: R,
    base: &VirtualPath,
    metadata: &BTreeMap<String, String>,
    budget: &mut BudgetTracker<'_>,
    sink: &mut dyn EntrySink,
) -> Result<(), ScanError> {
    let mut decoder = GzDecoder::new(reader);

    budget.add_entry();
    if let Err(reason) = budget.check() {
        budget.abort(reason);
        return Ok(());
    }

    // Decompressed size is unknown up front, so read at most one byte past
    // the remaining budget and abort when that byte arrives.
    let cap = budget.remaining_bytes();
    let mut bytes = Vec::new();
    if (&mut decoder).take(cap.saturating_add(1)).read_to_end(&mut bytes).is_err() {
        return Ok(());
    }

    budget.add_bytes(bytes.len() as u64);
    if bytes.len() as u64 > cap {
        budget.abort(AbortReason::Bytes);
        return Ok(());
    }

    let member = member_name(&decoder, base);
    emit_or_recurse(base.child(member), bytes, metadata, budget, sink)
}

fn member_name<R: Read>(decoder: &GzDecoder<R>, base: &VirtualPath) -> String {
    if let Some(name) = decoder
        .header()
        .and_then(|h| h.filename())
        .and_then(|f| std::str::from_utf8(f).ok())
        && !name.is_empty()
    {
        return name.to_string();
    }
    synthetic_name(base.leaf().unwrap_or_default())
}

fn synthetic_name(outer: &str) -> String {
    let basename = outer.rsplit('/').next().unwrap_or(outer);
    let stripped = basename.strip_suffix(".gz").unwrap_or(basename);
    if stripped.is_empty() {
        "data".to_string()
    } else {
        stripped.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::GzEncoder;
    use redactyl_core::budget::{ArtifactLimits, ArtifactStats};

    use crate::sink::CollectSink;

    use super::*;

    fn gzip_bytes(content: &[u8], filename: Option<&str>) -> Vec<u8> {
        let mut builder = flate2::GzBuilder::new();
        if let Some(name) = filename {
            builder = builder.filename(name);
        }
        let mut encoder = builder.write(Vec::new(), Compression::default());
        encoder.write_all(content).unwrap();
        encoder.finish().unwrap()
    }

    fn scan(data: Vec<u8>, outer: &str, limits: &ArtifactLimits) -> (CollectSink, u64) {
        let stats = ArtifactStats::new();
        let mut budget = BudgetTracker::new(limits, &stats);
        let mut sink = CollectSink::new();
        let base = VirtualPath::file(outer);

        scan_gzip_reader(data.as_slice(), &base, &BTreeMap::new(), &mut budget, &mut sink).unwrap();
        let bytes_aborts = stats.snapshot().bytes;
        (sink, bytes_aborts)
    }

    #[test]
    fn stored_header_filename_names_the_entry() {
        let data = gzip_bytes(b"password=hunter2", Some("app.env"));
        let (sink, _) = scan(data, "logs/app.env.gz", &ArtifactLimits::default());

        assert_eq!(sink.paths(), vec!["logs/app.env.gz::app.env"]);
        assert_eq!(sink.entries[0].1, b"password=hunter2");
    }

    #[test]
    fn missing_header_filename_strips_gz_suffix() {
        let data = gzip_bytes(b"content", None);
        let (sink, _) = scan(data, "dump.txt.gz", &ArtifactLimits::default());

        assert_eq!(sink.paths(), vec!["dump.txt.gz::dump.txt"]);
    }

    #[test]
    fn oversized_member_aborts_by_bytes() {
        let data = gzip_bytes(&[0x41; 200], None);
        let limits = ArtifactLimits {
            max_bytes_per_artifact: 32,
            ..ArtifactLimits::default()
        };

        let (sink, bytes_aborts) = scan(data, "big.gz", &limits);

        assert!(sink.entries.is_empty());
        assert_eq!(bytes_aborts, 1);
    }

    #[test]
    fn plain_gz_basename_without_suffix_keeps_name() {
        assert_eq!(synthetic_name("archive"), "archive");
        assert_eq!(synthetic_name("a/b/notes.gz"), "notes");
        assert_eq!(synthetic_name(".gz"), "data");
    }

    #[test]
    fn gzip_of_empty_content_emits_empty_entry() {
        let data = gzip_bytes(b"", None);
        let (sink, _) = scan(data, "empty.gz", &ArtifactLimits::default());

        assert_eq!(sink.entries.len(), 1);
        assert!(sink.entries[0].1.is_empty());
    }
}
