//! Worker thread spawning for the extraction pipeline.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, error, warn};

use crate::archive::ZipArchive;
use crate::document;
use crate::output::{OutputError, OutputSink};
use crate::tasks::ArchiveTask;

use super::events::OutputEvent;

/// Spawn the single writer thread draining the event channel.
///
/// On a write failure the thread sets the cancellation flag, keeps draining
/// so producers never block on a dead consumer, and returns the error through
/// its join handle after a best-effort flush.
pub fn spawn_writer_thread(
    sink: Box<dyn OutputSink>,
    rx: Receiver<OutputEvent>,
    cancel_flag: Arc<AtomicBool>,
) -> thread::JoinHandle<Result<(), OutputError>> {
    thread::spawn(move || {
        let mut fatal: Option<OutputError> = None;
        for event in rx {
            if fatal.is_some() {
                continue;
            }
            let result = match event {
                OutputEvent::Document(record) => sink.record_document(&record),
                OutputEvent::RunSummary(summary) => sink.record_run_summary(&summary),
                OutputEvent::Flush => sink.flush(),
            };
            if let Err(err) = result {
                error!("output write failed: {err}; cancelling run");
                cancel_flag.store(true, Ordering::Relaxed);
                fatal = Some(err);
            }
        }
        match fatal {
            Some(err) => {
                let _ = sink.flush();
                Err(err)
            }
            None => {
                sink.flush()?;
                Ok(())
            }
        }
    })
}

/// Spawn the extraction worker pool.
///
/// Each worker owns one archive at a time: open, walk the entries with the
/// document suffix, parse, send. Entry-level failures are counted and
/// skipped; an archive that cannot be opened is counted as failed and the
/// worker moves on. The cancellation flag is checked between entries.
pub fn spawn_extract_workers(
    workers: usize,
    document_suffix: String,
    task_rx: Receiver<ArchiveTask>,
    out_tx: Sender<OutputEvent>,
    cancel_flag: Arc<AtomicBool>,
    archives_processed: Arc<AtomicU64>,
    archives_failed: Arc<AtomicU64>,
    documents_parsed: Arc<AtomicU64>,
    documents_skipped: Arc<AtomicU64>,
    object_rows: Arc<AtomicU64>,
) -> Vec<thread::JoinHandle<()>> {
    let mut handles = Vec::new();
    let worker_count = workers.max(1);

    for _ in 0..worker_count {
        let document_suffix = document_suffix.clone();
        let task_rx = task_rx.clone();
        let out_tx = out_tx.clone();
        let cancel_flag = cancel_flag.clone();
        let archives_processed = archives_processed.clone();
        let archives_failed = archives_failed.clone();
        let documents_parsed = documents_parsed.clone();
        let documents_skipped = documents_skipped.clone();
        let object_rows = object_rows.clone();

        handles.push(thread::spawn(move || {
            for task in task_rx {
                if cancel_flag.load(Ordering::Relaxed) {
                    break;
                }

                let archive = match ZipArchive::open(&task.path) {
                    Ok(archive) => archive,
                    Err(err) => {
                        archives_failed.fetch_add(1, Ordering::Relaxed);
                        warn!("failed to open archive {}: {err}", task.path.display());
                        continue;
                    }
                };

                let mut parsed = 0u64;
                let mut skipped = 0u64;
                let mut objects_sent = 0u64;
                let mut aborted = false;

                for entry in archive.entries() {
                    if cancel_flag.load(Ordering::Relaxed) {
                        aborted = true;
                        break;
                    }
                    if entry.is_directory || !entry.name.ends_with(&document_suffix) {
                        continue;
                    }

                    let bytes = match archive.read_entry(entry) {
                        Ok(bytes) => bytes,
                        Err(err) => {
                            skipped += 1;
                            warn!(
                                "skipping entry {} in {}: {err}",
                                entry.name,
                                task.path.display()
                            );
                            continue;
                        }
                    };

                    match document::parse_document(&bytes) {
                        Ok(record) => {
                            let object_count = record.objects.len() as u64;
                            if let Err(err) = out_tx.send(OutputEvent::Document(record)) {
                                warn!("output channel closed while sending document: {err}");
                                aborted = true;
                                break;
                            }
                            parsed += 1;
                            objects_sent += object_count;
                        }
                        Err(err) => {
                            skipped += 1;
                            debug!(
                                "malformed document {} in {}: {err}",
                                entry.name,
                                task.path.display()
                            );
                        }
                    }
                }

                documents_parsed.fetch_add(parsed, Ordering::Relaxed);
                documents_skipped.fetch_add(skipped, Ordering::Relaxed);
                object_rows.fetch_add(objects_sent, Ordering::Relaxed);
                if !aborted {
                    archives_processed.fetch_add(1, Ordering::Relaxed);
                }
            }
        }));
    }

    handles
}
