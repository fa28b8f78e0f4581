use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CliOptions {
    /// Input directory containing zip archives
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output directory for the CSV tables
    #[arg(short, long, default_value = "./output")]
    pub output: PathBuf,

    /// Optional path to config file (YAML)
    #[arg(long)]
    pub config_path: Option<PathBuf>,

    /// Number of worker threads
    #[arg(long, default_value_t = num_cpus::get())]
    pub workers: usize,

    /// Parse everything but write no output files
    #[arg(long)]
    pub dry_run: bool,
}

pub fn parse() -> CliOptions {
    CliOptions::parse()
}
