mod commands;
mod logging;

use std::process;

use anyhow::Result;
use backup_warden::planner::ActionKind;
use backup_warden::{ArchivePlanner, BackupConfig, JobContext};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use tracing::error;

fn main() -> Result<()> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match backup_warden::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    match args.command {
        Some(Commands::Plan {
            slow_volumes,
            test_run,
        }) => {
            if let Err(err) = run_plan(&config, slow_volumes, test_run) {
                error!("Error: {}", err);
                process::exit(1);
            }
        }
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn run_plan(config: &BackupConfig, slow_volumes: bool, test_run: bool) -> Result<()> {
    let planner = ArchivePlanner::from_config(config)?;
    let job = JobContext::new(slow_volumes, test_run);

    let candidates = planner.compression_candidates(&job);
    if !candidates.is_empty() {
        println!("{}", "Compression candidates:".bold());
        for source in &candidates {
            println!("  {}", source.path().display());
        }
    }

    let actions = planner.plan(&job);
    if actions.is_empty() {
        println!("{}", "Everything is up to date.".green());
        return Ok(());
    }

    for action in &actions {
        let line = action.description();
        match action.kind() {
            ActionKind::Compress => println!("{}", line.cyan()),
            ActionKind::Copy => println!("{}", line.green()),
            ActionKind::Delete => println!("{}", line.red()),
        }
    }
    println!("{} actions planned (nothing executed)", actions.len());

    Ok(())
}
