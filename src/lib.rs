//! # docsift
//!
//! Parallel extraction of structured XML documents from zip archives into
//! relational CSV tables.
//!
//! A run enumerates the archives in an input directory, fans them out across
//! a fixed pool of worker threads, parses every XML document inside each
//! archive, and aggregates the extracted rows through a bounded channel into
//! a single writer thread producing two tables: `levels.csv` (`id,level`, one
//! row per document) and `objects.csv` (`id,object_name`, one row per object).
//! Malformed documents and unreadable archives are counted and skipped; they
//! never abort a run.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let loaded = docsift::config::load_config(None)?;
//!     let sink = docsift::output::build_sink(&loaded.config, Path::new("out"))?;
//!     let stats =
//!         docsift::pipeline::run_pipeline(&loaded.config, Path::new("archives"), sink, 4)?;
//!     println!(
//!         "parsed {} documents, skipped {}",
//!         stats.documents_parsed, stats.documents_skipped
//!     );
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod config;
pub mod constants;
pub mod document;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod tasks;
pub mod util;
