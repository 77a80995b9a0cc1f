//! TileLabel CLI - Command-line interface
//!
//! Inspects the label configuration, looks labels up directly, and replays
//! scripted viewer sessions against the label engine.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::lookup::LookupArgs;
use commands::replay::ReplayArgs;

#[derive(Debug, Parser)]
#[command(name = "tilelabel", version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Manage configuration settings
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Resolve labels for tiles once and print them
    Lookup(LookupArgs),

    /// Replay a script of viewer events against the label engine
    Replay(ReplayArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Config(command) => commands::config::run(command),
        Commands::Lookup(args) => commands::lookup::run(args, cli.verbose).await,
        Commands::Replay(args) => commands::replay::run(args, cli.verbose).await,
    };

    if let Err(e) = result {
        e.exit();
    }
}
