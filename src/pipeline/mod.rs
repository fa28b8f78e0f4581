//! # Pipeline Module
//!
//! Orchestrates archive enumeration, the extraction worker pool, and the
//! single writer thread that aggregates rows into the output tables.

pub mod events;
pub mod workers;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use anyhow::{Context, Result, bail};
use crossbeam_channel::bounded;
use tracing::{info, warn};

use crate::config::Config;
use crate::constants::{
    CHANNEL_CAPACITY_MULTIPLIER, FLUSH_DISPATCH_INTERVAL, MIN_CHANNEL_CAPACITY,
};
use crate::output::{OutputSink, RunSummary};
use crate::tasks::{self, ArchiveTask};

use events::OutputEvent;

/// Pipeline statistics collected during a run.
#[derive(Debug, Clone)]
pub struct PipelineStats {
    pub archives_found: u64,
    pub archives_processed: u64,
    pub archives_failed: u64,
    pub documents_parsed: u64,
    pub documents_skipped: u64,
    pub cancelled: bool,
}

struct PipelineCounters {
    archives_processed: Arc<AtomicU64>,
    archives_failed: Arc<AtomicU64>,
    documents_parsed: Arc<AtomicU64>,
    documents_skipped: Arc<AtomicU64>,
    object_rows: Arc<AtomicU64>,
}

impl PipelineCounters {
    fn new() -> Self {
        Self {
            archives_processed: Arc::new(AtomicU64::new(0)),
            archives_failed: Arc::new(AtomicU64::new(0)),
            documents_parsed: Arc::new(AtomicU64::new(0)),
            documents_skipped: Arc::new(AtomicU64::new(0)),
            object_rows: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// Run the extraction pipeline to completion.
pub fn run_pipeline(
    cfg: &Config,
    input_dir: &Path,
    sink: Box<dyn OutputSink>,
    workers: usize,
) -> Result<PipelineStats> {
    PipelineRunner::new(cfg, input_dir, sink, workers, Arc::new(AtomicBool::new(false))).run()
}

/// Run the pipeline with an external cancellation flag (e.g. Ctrl+C).
pub fn run_pipeline_with_cancel(
    cfg: &Config,
    input_dir: &Path,
    sink: Box<dyn OutputSink>,
    workers: usize,
    cancel_flag: Arc<AtomicBool>,
) -> Result<PipelineStats> {
    PipelineRunner::new(cfg, input_dir, sink, workers, cancel_flag).run()
}

struct PipelineRunner<'a> {
    cfg: &'a Config,
    input_dir: PathBuf,
    sink: Option<Box<dyn OutputSink>>,
    workers: usize,
    cancel_flag: Arc<AtomicBool>,
}

impl<'a> PipelineRunner<'a> {
    fn new(
        cfg: &'a Config,
        input_dir: &Path,
        sink: Box<dyn OutputSink>,
        workers: usize,
        cancel_flag: Arc<AtomicBool>,
    ) -> Self {
        Self {
            cfg,
            input_dir: input_dir.to_path_buf(),
            sink: Some(sink),
            workers,
            cancel_flag,
        }
    }

    fn run(mut self) -> Result<PipelineStats> {
        let tasks = tasks::enumerate_archives(&self.input_dir, &self.cfg.archive_suffix)?;
        let archives_found = tasks.len() as u64;
        info!(
            "scan complete: {} archives in {}",
            archives_found,
            self.input_dir.display()
        );

        let channel_cap = self
            .workers
            .saturating_mul(CHANNEL_CAPACITY_MULTIPLIER)
            .max(MIN_CHANNEL_CAPACITY);
        let (task_tx, task_rx) = bounded::<ArchiveTask>(channel_cap);
        let (out_tx, out_rx) = bounded::<OutputEvent>(channel_cap * 2);

        let counters = PipelineCounters::new();
        let sink = self.sink.take().expect("output sink already taken");
        let writer_handle =
            workers::spawn_writer_thread(sink, out_rx, self.cancel_flag.clone());
        let worker_handles = workers::spawn_extract_workers(
            self.workers,
            self.cfg.document_suffix.clone(),
            task_rx,
            out_tx.clone(),
            self.cancel_flag.clone(),
            counters.archives_processed.clone(),
            counters.archives_failed.clone(),
            counters.documents_parsed.clone(),
            counters.documents_skipped.clone(),
            counters.object_rows.clone(),
        );

        let mut cancelled = false;
        let mut dispatched = 0u64;
        for task in tasks {
            if self.cancel_flag.load(Ordering::Relaxed) {
                cancelled = true;
                break;
            }
            if task_tx.send(task).is_err() {
                // Workers only disappear early under cancellation or a fatal
                // writer error; either way the join below reports it.
                cancelled = true;
                break;
            }
            dispatched += 1;
            if dispatched % FLUSH_DISPATCH_INTERVAL == 0 {
                let _ = out_tx.send(OutputEvent::Flush);
            }
        }

        drop(task_tx);
        for handle in worker_handles {
            let _ = handle.join();
        }
        cancelled = cancelled || self.cancel_flag.load(Ordering::Relaxed);

        let summary = RunSummary {
            run_id: self.cfg.run_id.clone(),
            archives_found,
            archives_processed: counters.archives_processed.load(Ordering::Relaxed),
            archives_failed: counters.archives_failed.load(Ordering::Relaxed),
            documents_parsed: counters.documents_parsed.load(Ordering::Relaxed),
            documents_skipped: counters.documents_skipped.load(Ordering::Relaxed),
            level_rows: counters.documents_parsed.load(Ordering::Relaxed),
            object_rows: counters.object_rows.load(Ordering::Relaxed),
        };
        if let Err(err) = out_tx.send(OutputEvent::RunSummary(summary.clone())) {
            warn!("output channel closed while sending run summary: {err}");
        }
        drop(out_tx);

        if cancelled {
            info!("shutdown requested; stopping early");
        }
        // Logged before the writer result propagates so a failed run still
        // reports what was completed.
        info!(
            "run_summary archives_found={} archives_processed={} archives_failed={} \
             documents_parsed={} documents_skipped={} level_rows={} object_rows={}",
            summary.archives_found,
            summary.archives_processed,
            summary.archives_failed,
            summary.documents_parsed,
            summary.documents_skipped,
            summary.level_rows,
            summary.object_rows
        );

        match writer_handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(err).context("writing output tables failed"),
            Err(_) => bail!("output writer thread panicked"),
        }

        Ok(PipelineStats {
            archives_found,
            archives_processed: summary.archives_processed,
            archives_failed: summary.archives_failed,
            documents_parsed: summary.documents_parsed,
            documents_skipped: summary.documents_skipped,
            cancelled,
        })
    }
}
