// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Stasis CLI
//!
//! Command-line interface for checkpointing running containers with CRIU.

use clap::{ArgAction, Parser, Subcommand};

mod commands;
mod summary;

/// Stasis - checkpoint running containers with CRIU
#[derive(Parser)]
#[command(name = "stasis")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (defaults apply when omitted)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Checkpoint a running container
    Checkpoint {
        /// Container name or ID to checkpoint
        #[arg(long)]
        container: String,

        /// Name for the checkpoint
        #[arg(long, default_value = "checkpoint1")]
        name: String,

        /// Base directory for checkpoints (overrides the config file)
        #[arg(long)]
        dir: Option<String>,

        /// Leave container running after checkpoint
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        leave_running: bool,

        /// Checkpoint established TCP connections
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        tcp: bool,

        /// Checkpoint file locks
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        file_locks: bool,

        /// Perform a memory-tracking pre-dump first
        #[arg(long)]
        pre_dump: bool,
    },

    /// Show the runtime facts and exclusions for a container without capturing
    Inspect {
        /// Container name or ID
        #[arg(long)]
        container: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        file: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    // Dispatch to command handlers
    match cli.command {
        Commands::Checkpoint {
            container,
            name,
            dir,
            leave_running,
            tcp,
            file_locks,
            pre_dump,
        } => {
            let options = stasis_core::CheckpointOptions {
                leave_running,
                preserve_tcp: tcp,
                preserve_file_locks: file_locks,
                enable_pre_dump: pre_dump,
            };
            commands::checkpoint::execute(cli.config.as_deref(), &container, &name, dir, options)
                .await
        }
        Commands::Inspect { container, json } => {
            commands::inspect::execute(cli.config.as_deref(), &container, json).await
        }
        Commands::Validate { file } => commands::validate::execute(&file).await,
    }
}
