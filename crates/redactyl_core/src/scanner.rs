//! The detection-backend interface.
//!
//! Detection is pluggable: the Gitleaks subprocess adapter and the builtin
//! rule engine both implement [`Scanner`]. The coordinator only ever talks to
//! this trait, handing over batches of `(path, bytes, context)` and getting
//! enriched findings back. Exactly one backend runs per scan.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::ScanError;
use crate::finding::Finding;

/// Context accompanying each scan candidate.
///
/// `virtual_path` is the identity findings are reported under; `real_path`
/// may be empty for in-memory content such as archive entries or git blobs.
#[derive(Debug, Clone, Default)]
pub struct ScanContext {
    /// Virtual path of the candidate (see [`crate::vpath`]).
    pub virtual_path: String,
    /// On-disk path when the content came straight from the filesystem.
    pub real_path: PathBuf,
    /// Enrichment merged into finding metadata (archive, layer digest, commit...).
    pub metadata: BTreeMap<String, String>,
}

impl ScanContext {
    /// Context for a plain repository-relative file.
    #[must_use]
    pub fn for_path(virtual_path: impl Into<String>) -> Self {
        Self {
            virtual_path: virtual_path.into(),
            real_path: PathBuf::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Adds a metadata entry, consuming and returning the context.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// One unit of work for a backend batch.
#[derive(Debug, Clone)]
pub struct BatchInput {
    /// Virtual path of the candidate.
    pub path: String,
    /// The candidate's content.
    pub bytes: Vec<u8>,
    /// Context correlated back onto the resulting findings.
    pub context: ScanContext,
}

impl BatchInput {
    /// Builds a batch input from a context and its content.
    #[must_use]
    pub fn new(context: ScanContext, bytes: Vec<u8>) -> Self {
        Self {
            path: context.virtual_path.clone(),
            bytes,
            context,
        }
    }
}

/// A detection backend.
///
/// Implementations must be safe to call from multiple worker threads; batch
/// invocations may run concurrently.
pub trait Scanner: Send + Sync {
    /// Scans one candidate addressed only by its path.
    fn scan(&self, path: &str, bytes: &[u8]) -> Result<Vec<Finding>, ScanError> {
        self.scan_with_context(&ScanContext::for_path(path), bytes)
    }

    /// Scans one candidate with full context.
    fn scan_with_context(&self, context: &ScanContext, bytes: &[u8]) -> Result<Vec<Finding>, ScanError>;

    /// Scans a batch of candidates in one backend invocation.
    ///
    /// The default implementation loops over [`Scanner::scan_with_context`];
    /// subprocess backends override it to amortise process startup.
    fn scan_batch(&self, inputs: &[BatchInput]) -> Result<Vec<Finding>, ScanError> {
        let mut findings = Vec::new();
        for input in inputs {
            findings.extend(self.scan_with_context(&input.context, &input.bytes)?);
        }
        Ok(findings)
    }

    /// Version string of the backend.
    fn version(&self) -> String;

    /// Stable ids of the detectors this backend can fire.
    fn detectors(&self) -> Vec<String>;
}

#[cfg(test)]
mod tests {
    use crate::finding::Severity;

    use super::*;

    /// Minimal backend that flags any content containing `"hit"`.
    struct FakeBackend;

    impl Scanner for FakeBackend {
        fn scan_with_context(&self, context: &ScanContext, bytes: &[u8]) -> Result<Vec<Finding>, ScanError> {
            if !bytes.windows(3).any(|w| w == b"hit") {
                return Ok(Vec::new());
            }
            Ok(vec![Finding {
                path: context.virtual_path.clone(),
                line: 1,
                column: 1,
                matched: "hit".to_string(),
                secret: None,
                detector: "fake/hit".to_string(),
                severity: Severity::High,
                confidence: 0.9,
                context: None,
                metadata: context.metadata.clone(),
            }])
        }

        fn version(&self) -> String {
            "fake-1.0".to_string()
        }

        fn detectors(&self) -> Vec<String> {
            vec!["fake/hit".to_string()]
        }
    }

    #[test]
    fn scan_default_routes_through_scan_with_context() {
        let backend = FakeBackend;
        let findings = backend.scan("a.txt", b"one hit here").unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].path, "a.txt");
    }

    #[test]
    fn scan_batch_default_concatenates_per_input_findings() {
        let backend = FakeBackend;
        let inputs = vec![
            BatchInput::new(ScanContext::for_path("a.txt"), b"hit".to_vec()),
            BatchInput::new(ScanContext::for_path("b.txt"), b"clean".to_vec()),
            BatchInput::new(ScanContext::for_path("c.txt"), b"hit again".to_vec()),
        ];

        let findings = backend.scan_batch(&inputs).unwrap();

        let paths: Vec<_> = findings.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a.txt", "c.txt"]);
    }

    #[test]
    fn context_metadata_flows_into_findings() {
        let backend = FakeBackend;
        let context = ScanContext::for_path("z.zip::inner.txt").with_metadata("archive", "z.zip");

        let findings = backend.scan_with_context(&context, b"hit").unwrap();

        assert_eq!(findings[0].metadata.get("archive"), Some(&"z.zip".to_string()));
    }

    #[test]
    fn batch_input_copies_virtual_path() {
        let input = BatchInput::new(ScanContext::for_path("v/p.txt"), Vec::new());
        assert_eq!(input.path, "v/p.txt");
    }
}
