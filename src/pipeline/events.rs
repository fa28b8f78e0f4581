//! Events that flow to the writer thread.

use crate::document::DocumentRecord;
use crate::output::RunSummary;

/// Events sent to the single writer thread.
#[derive(Debug)]
pub enum OutputEvent {
    /// One parsed document; the sink expands it into its level row and
    /// object rows in one call, so a document's rows stay contiguous.
    Document(DocumentRecord),
    /// Final counters for the run.
    RunSummary(RunSummary),
    /// Flush buffered rows to disk.
    Flush,
}
