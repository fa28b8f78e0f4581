pub mod csv;

use std::path::Path;

use thiserror::Error;

use crate::config::Config;
use crate::document::DocumentRecord;

/// Counters reported at the end of a run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub archives_found: u64,
    pub archives_processed: u64,
    pub archives_failed: u64,
    pub documents_parsed: u64,
    pub documents_skipped: u64,
    pub level_rows: u64,
    pub object_rows: u64,
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] ::csv::Error),
}

/// Destination for extracted rows and the run summary.
///
/// The writer thread is the only caller, so implementations never see
/// concurrent row writes; a document's level row and object rows are recorded
/// in a single call so they can never be split across other documents.
pub trait OutputSink: Send {
    fn record_document(&self, record: &DocumentRecord) -> Result<(), OutputError>;
    fn record_run_summary(&self, summary: &RunSummary) -> Result<(), OutputError>;
    fn flush(&self) -> Result<(), OutputError>;
}

/// A no-op sink for dry-run mode that writes no files.
pub struct DryRunSink;

impl OutputSink for DryRunSink {
    fn record_document(&self, _record: &DocumentRecord) -> Result<(), OutputError> {
        Ok(())
    }
    fn record_run_summary(&self, _summary: &RunSummary) -> Result<(), OutputError> {
        Ok(())
    }
    fn flush(&self) -> Result<(), OutputError> {
        Ok(())
    }
}

pub fn build_sink(cfg: &Config, output_dir: &Path) -> Result<Box<dyn OutputSink>, OutputError> {
    Ok(Box::new(csv::CsvSink::new(cfg, output_dir)?))
}

pub fn build_dry_run_sink() -> Box<dyn OutputSink> {
    Box::new(DryRunSink)
}
