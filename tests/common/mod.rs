//! Shared test infrastructure: hand-built zip archives, XML documents, and
//! CSV readback helpers.

// Each test binary compiles this module; not every binary uses every helper.
#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::Path;

use flate2::write::DeflateEncoder;
use flate2::{Compression, Crc};

use docsift::config::{self, Config};
use docsift::output;
use docsift::pipeline::{self, PipelineStats};

/// One archive member for `build_archive`.
pub struct EntrySpec {
    pub name: String,
    pub method: u16,
    pub payload: Vec<u8>,
    pub uncompressed_size: u32,
    pub crc32: u32,
}

/// A member stored without compression.
pub fn stored(name: &str, data: &[u8]) -> EntrySpec {
    EntrySpec {
        name: name.to_string(),
        method: 0,
        payload: data.to_vec(),
        uncompressed_size: data.len() as u32,
        crc32: crc32(data),
    }
}

/// A member compressed with raw deflate.
pub fn deflated(name: &str, data: &[u8]) -> EntrySpec {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("deflate");
    let payload = encoder.finish().expect("deflate");
    EntrySpec {
        name: name.to_string(),
        method: 8,
        payload,
        uncompressed_size: data.len() as u32,
        crc32: crc32(data),
    }
}

/// A member whose deflate stream is garbage; reading it must fail without
/// poisoning the rest of the archive.
pub fn corrupted(name: &str) -> EntrySpec {
    EntrySpec {
        name: name.to_string(),
        method: 8,
        payload: vec![0xAB; 32],
        uncompressed_size: 64,
        crc32: 0,
    }
}

/// A member using a compression method the reader does not support.
pub fn unsupported(name: &str, data: &[u8]) -> EntrySpec {
    EntrySpec {
        name: name.to_string(),
        method: 99,
        payload: data.to_vec(),
        uncompressed_size: data.len() as u32,
        crc32: crc32(data),
    }
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = Crc::new();
    crc.update(data);
    crc.sum()
}

/// Build a complete zip archive byte stream: local file headers and data,
/// then the central directory, then the end-of-central-directory record.
pub fn build_archive(entries: &[EntrySpec]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut central = Vec::new();

    for entry in entries {
        let name_bytes = entry.name.as_bytes();
        let lfh_offset = out.len() as u32;

        out.extend_from_slice(b"PK\x03\x04");
        out.extend_from_slice(&20u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&entry.method.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&entry.crc32.to_le_bytes());
        out.extend_from_slice(&(entry.payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&entry.uncompressed_size.to_le_bytes());
        out.extend_from_slice(&(name_bytes.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(name_bytes);
        out.extend_from_slice(&entry.payload);

        central.extend_from_slice(b"PK\x01\x02");
        central.extend_from_slice(&20u16.to_le_bytes());
        central.extend_from_slice(&20u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&entry.method.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&entry.crc32.to_le_bytes());
        central.extend_from_slice(&(entry.payload.len() as u32).to_le_bytes());
        central.extend_from_slice(&entry.uncompressed_size.to_le_bytes());
        central.extend_from_slice(&(name_bytes.len() as u16).to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u16.to_le_bytes());
        central.extend_from_slice(&0u32.to_le_bytes());
        central.extend_from_slice(&lfh_offset.to_le_bytes());
        central.extend_from_slice(name_bytes);
    }

    let cd_offset = out.len() as u32;
    let cd_size = central.len() as u32;
    out.extend_from_slice(&central);

    out.extend_from_slice(b"PK\x05\x06");
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    out.extend_from_slice(&cd_size.to_le_bytes());
    out.extend_from_slice(&cd_offset.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());

    out
}

/// Render one document in the extraction schema.
pub fn xml_document(id: &str, level: &str, objects: &[&str]) -> Vec<u8> {
    let mut xml = String::from("<root>");
    xml.push_str(&format!("<var name=\"id\" value=\"{id}\"/>"));
    xml.push_str(&format!("<var name=\"level\" value=\"{level}\"/>"));
    xml.push_str("<objects>");
    for name in objects {
        xml.push_str(&format!("<object name=\"{name}\"/>"));
    }
    xml.push_str("</objects></root>");
    xml.into_bytes()
}

/// Default config with a fixed run id for stable assertions.
pub fn test_config() -> Config {
    let mut cfg = config::load_config(None).expect("config").config;
    cfg.run_id = "test_run".to_string();
    cfg
}

/// Run the full pipeline over `input`, writing tables into `output_dir`.
pub fn run_extraction(input: &Path, output_dir: &Path, workers: usize) -> PipelineStats {
    let cfg = test_config();
    fs::create_dir_all(output_dir).expect("output dir");
    let sink = output::build_sink(&cfg, output_dir).expect("sink");
    pipeline::run_pipeline(&cfg, input, sink, workers).expect("pipeline")
}

/// Read a CSV table back as (header, rows).
pub fn read_table(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .expect("open table");
    let mut records = reader.records();
    let header: Vec<String> = records
        .next()
        .expect("header row")
        .expect("header row")
        .iter()
        .map(|field| field.to_string())
        .collect();
    let mut rows = Vec::new();
    for record in records {
        let record = record.expect("row");
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    (header, rows)
}

/// Rows as sorted `(first, second)` pairs, for order-insensitive comparison.
pub fn sorted_pairs(rows: &[Vec<String>]) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = rows
        .iter()
        .map(|row| (row[0].clone(), row[1].clone()))
        .collect();
    pairs.sort();
    pairs
}
