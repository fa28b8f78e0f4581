use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use serde::Serialize;

use crate::config::Config;
use crate::document::DocumentRecord;
use crate::output::{OutputError, OutputSink, RunSummary};

/// CSV tables for extracted rows.
///
/// Header rows are written at construction so an empty run still produces
/// well-formed tables.
pub struct CsvSink {
    levels_writer: Mutex<csv::Writer<File>>,
    objects_writer: Mutex<csv::Writer<File>>,
    summary_writer: Mutex<csv::Writer<File>>,
}

#[derive(Serialize)]
struct LevelRowCsv<'a> {
    id: &'a str,
    level: i64,
}

#[derive(Serialize)]
struct ObjectRowCsv<'a> {
    id: &'a str,
    object_name: &'a str,
}

#[derive(Serialize)]
struct RunSummaryCsv<'a> {
    run_id: &'a str,
    archives_found: u64,
    archives_processed: u64,
    archives_failed: u64,
    documents_parsed: u64,
    documents_skipped: u64,
    level_rows: u64,
    object_rows: u64,
}

impl CsvSink {
    pub fn new(cfg: &Config, output_dir: &Path) -> Result<Self, OutputError> {
        let levels_file = File::create(output_dir.join(&cfg.levels_file))?;
        let objects_file = File::create(output_dir.join(&cfg.objects_file))?;
        let summary_file = File::create(output_dir.join(&cfg.summary_file))?;

        let mut levels_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(levels_file);
        let mut objects_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(objects_file);
        let mut summary_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(summary_file);

        levels_writer.write_record(["id", "level"])?;
        objects_writer.write_record(["id", "object_name"])?;
        summary_writer.write_record([
            "run_id",
            "archives_found",
            "archives_processed",
            "archives_failed",
            "documents_parsed",
            "documents_skipped",
            "level_rows",
            "object_rows",
        ])?;

        // Headers must survive even if the run dies before its first flush.
        levels_writer.flush()?;
        objects_writer.flush()?;
        summary_writer.flush()?;

        Ok(Self {
            levels_writer: Mutex::new(levels_writer),
            objects_writer: Mutex::new(objects_writer),
            summary_writer: Mutex::new(summary_writer),
        })
    }
}

impl OutputSink for CsvSink {
    fn record_document(&self, record: &DocumentRecord) -> Result<(), OutputError> {
        {
            let mut guard = self.levels_writer.lock().unwrap();
            guard.serialize(LevelRowCsv {
                id: &record.id,
                level: record.level,
            })?;
        }
        let mut guard = self.objects_writer.lock().unwrap();
        for object_name in &record.objects {
            guard.serialize(ObjectRowCsv {
                id: &record.id,
                object_name,
            })?;
        }
        Ok(())
    }

    fn record_run_summary(&self, summary: &RunSummary) -> Result<(), OutputError> {
        let mut guard = self.summary_writer.lock().unwrap();
        guard.serialize(RunSummaryCsv {
            run_id: &summary.run_id,
            archives_found: summary.archives_found,
            archives_processed: summary.archives_processed,
            archives_failed: summary.archives_failed,
            documents_parsed: summary.documents_parsed,
            documents_skipped: summary.documents_skipped,
            level_rows: summary.level_rows,
            object_rows: summary.object_rows,
        })?;
        Ok(())
    }

    fn flush(&self) -> Result<(), OutputError> {
        let mut levels = self.levels_writer.lock().unwrap();
        let mut objects = self.objects_writer.lock().unwrap();
        let mut summary = self.summary_writer.lock().unwrap();
        levels.flush()?;
        objects.flush()?;
        summary.flush()?;
        Ok(())
    }
}
