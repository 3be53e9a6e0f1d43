// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines the subcommands for standing up and cleaning up fixtures.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dockyard")]
#[command(about = "Container fixtures for integration tests: start, wire and tear down")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the full stack and keep it running until interrupted
    Up {
        /// Configuration file (discovered in the current directory otherwise)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Remove every container created by dockyard
    Reap {
        /// Configuration file (discovered in the current directory otherwise)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
