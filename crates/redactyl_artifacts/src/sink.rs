//! The emission seam between decoders and the scan pipeline.

use redactyl_core::error::ScanError;
use redactyl_core::scanner::ScanContext;

/// Receives decoded artifact entries.
///
/// The engine's implementation turns entries into backend batch inputs;
/// tests collect them into vectors. Closures with the matching signature
/// implement the trait directly.
pub trait EntrySink {
    /// Hands over one decoded entry with its scan context.
    fn entry(&mut self, context: ScanContext, bytes: Vec<u8>) -> Result<(), ScanError>;
}

impl<F> EntrySink for F
where
    F: FnMut(ScanContext, Vec<u8>) -> Result<(), ScanError>,
{
    fn entry(&mut self, context: ScanContext, bytes: Vec<u8>) -> Result<(), ScanError> {
        self(context, bytes)
    }
}

/// Collects emitted entries in memory.
#[derive(Debug, Default)]
pub struct CollectSink {
    /// Everything emitted so far, in decoder order.
    pub entries: Vec<(ScanContext, Vec<u8>)>,
}

impl CollectSink {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual paths of all collected entries, in order.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.entries.iter().map(|(ctx, _)| ctx.virtual_path.clone()).collect()
    }
}

impl EntrySink for CollectSink {
    fn entry(&mut self, context: ScanContext, bytes: Vec<u8>) -> Result<(), ScanError> {
        self.entries.push((context, bytes));
        Ok(())
    }
}
