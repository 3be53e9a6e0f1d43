// ABOUTME: Entry point for the dockyard CLI application.
// ABOUTME: Parses arguments and dispatches to the fleet and reaper.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use dockyard::Fleet;
use dockyard::compose::{FullStack, FullStackOverrides};
use dockyard::config::FleetConfig;
use dockyard::error::Result;
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Up { config } => {
            let config = load_config(config.as_deref())?;
            up(config).await
        }
        Commands::Reap { config } => {
            let config = load_config(config.as_deref())?;
            let fleet = Fleet::connect_local(config).await?;
            let removed = dockyard::reap::reap(&fleet.runtime()).await?;
            println!("Removed {} container(s)", removed);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<FleetConfig> {
    let config = match path {
        Some(path) => FleetConfig::load(path)?,
        None => FleetConfig::discover_or_default(&env::current_dir()?)?,
    };
    config.with_env_image_overrides()
}

/// Start the full stack, print where it lives, and remove it on Ctrl-C.
async fn up(config: FleetConfig) -> Result<()> {
    let fleet = Fleet::connect_local(config).await?;
    println!("Starting full stack...");
    let mut stack = fleet
        .start_full_stack(&FullStackOverrides::default())
        .await?;

    print_addresses(&stack)?;
    println!("Press Ctrl-C to stop and remove the stack.");

    tokio::signal::ctrl_c().await?;

    println!("Removing full stack...");
    stack.remove().await?;
    println!("Done.");
    Ok(())
}

fn print_addresses(stack: &FullStack) -> Result<()> {
    println!(
        "  chain node      {}  rpc 127.0.0.1:{}  p2p {}",
        stack.chain_node.ip()?,
        stack.chain_node.rpc_port(),
        stack.chain_node.p2p_port(),
    );
    println!(
        "  content store   {}  api 127.0.0.1:{}",
        stack.content_store.multiaddr()?,
        stack.content_store.api_port(),
    );
    println!(
        "  document store  {}  host 127.0.0.1:{}",
        stack.document_store.mongodb_url()?,
        stack.document_store.host_port(),
    );
    println!(
        "  drive api       {}  rpc 127.0.0.1:{}",
        stack.drive_api.ip()?,
        stack.drive_api.rpc_port(),
    );
    println!("  insight         {}", stack.insight.uri()?);
    println!(
        "  dapi core       {}  rpc 127.0.0.1:{}",
        stack.dapi_core.ip()?,
        stack.dapi_core.rpc_port(),
    );
    println!(
        "  tx filter       {}  grpc 127.0.0.1:{}",
        stack.tx_filter_stream.ip()?,
        stack.tx_filter_stream.grpc_port(),
    );
    Ok(())
}
