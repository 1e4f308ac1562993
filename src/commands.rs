use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "warden")]
#[command(about = "Backup replication planner", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan the configured directories and print the planned actions
    /// without executing any of them
    Plan {
        /// Include slow (network/removable) volumes in this run
        #[arg(long)]
        slow_volumes: bool,
        /// Treat this as a test run (test-only directories also qualify
        /// for compression)
        #[arg(long)]
        test_run: bool,
    },
    /// Print configuration values
    PrintConfig,
}
