//! epgrab CLI - Command-line interface
//!
//! This binary provides a command-line interface to the epgrab library:
//! loading and validating the configuration, inspecting and migrating the
//! settings file, and testing lineup detection for a postal/ZIP code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod error;

use commands::config::ConfigCommands;
use commands::{config, lineup, load};

#[derive(Parser)]
#[command(name = "epgrab")]
#[command(version = epgrab::VERSION)]
#[command(about = "TV guide grabber configuration and lineup management", long_about = None)]
struct Cli {
    /// Path to the configuration file (default: ~/.epgrab/epgrab.xml)
    #[arg(long, global = true)]
    config_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate the configuration, printing a summary
    Load(load::LoadArgs),

    /// Inspect or migrate the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Test lineup detection for a postal/ZIP code
    Lineup(lineup::LineupArgs),
}

fn main() {
    let cli = Cli::parse();
    let config_file = config::resolve_config_file(cli.config_file);

    let result = match cli.command {
        Commands::Load(args) => load::run(args, config_file),
        Commands::Config { command } => config::run(command, &config_file),
        Commands::Lineup(args) => lineup::run(args),
    };

    if let Err(e) = result {
        e.exit();
    }
}
