use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use tracing::{info, warn};

use docsift::{cli, config, logging, output, pipeline, util};

fn main() -> Result<()> {
    logging::init_logging();

    let cli_opts = cli::parse();
    let loaded = config::load_config(cli_opts.config_path.as_deref())?;
    let cfg = loaded.config;

    info!(
        "starting run_id={} input={} output={} workers={} config_hash={}",
        cfg.run_id,
        cli_opts.input.display(),
        cli_opts.output.display(),
        cli_opts.workers,
        loaded.config_hash
    );

    let sink = if cli_opts.dry_run {
        info!("dry-run mode: no output files will be written");
        output::build_dry_run_sink()
    } else {
        util::ensure_output_dir(&cli_opts.output)?;
        output::build_sink(&cfg, &cli_opts.output)?
    };

    let cancel_flag = Arc::new(AtomicBool::new(false));
    {
        let flag = cancel_flag.clone();
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::Relaxed);
        })?;
    }

    let stats = pipeline::run_pipeline_with_cancel(
        &cfg,
        &cli_opts.input,
        sink,
        cli_opts.workers,
        cancel_flag,
    )?;

    if stats.documents_skipped > 0 {
        warn!(
            "{} documents skipped due to per-entry errors",
            stats.documents_skipped
        );
    }
    if stats.archives_failed > 0 {
        warn!("{} archives could not be opened", stats.archives_failed);
    }
    info!("docsift run finished");
    Ok(())
}
