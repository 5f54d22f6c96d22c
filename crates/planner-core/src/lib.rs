pub mod board;
pub mod calendar;
pub mod cli;
pub mod commands;
pub mod config;
pub mod render;
pub mod store;
pub mod task;
pub mod timer;

use std::ffi::OsString;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{debug, info};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(verbose = cli.verbose, quiet = cli.quiet, "starting planner");

    let mut cfg = config::Config::load(cli.config.as_deref())?;
    cfg.apply_overrides(
        cli.rc_overrides
            .into_iter()
            .map(|kv| (kv.key, kv.value)),
    );
    debug!(files = ?cfg.loaded_files, "configuration loaded");

    let data_dir = config::resolve_data_dir(&cfg, cli.data.as_deref())
        .context("failed to resolve data directory")?;

    let mut store = store::TaskStore::open(&data_dir)
        .with_context(|| format!("failed to open task store at {}", data_dir.display()))?;
    let mut timer = timer::TimerEngine::open(&data_dir, &mut store)
        .context("failed to open timer engine")?;

    let mut renderer = render::Renderer::new(&cfg)?;

    commands::dispatch(&mut store, &mut timer, &mut renderer, cli.command, Utc::now())?;

    info!("done");
    Ok(())
}
