// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! hp - hotpush CLI

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use hp_cli::commands::{deploy, status, stop};
use hp_cli::output::OutputFormat;
use hp_cli::{color, ControlClient, ExitError, DEFAULT_TARGET, DEFAULT_UPLOAD_WORKERS};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "hp",
    version,
    about = "Push a local app to a hotpush daemon, build it, and run it",
    styles = color::styles(),
)]
struct Cli {
    /// Daemon control address
    #[arg(long, global = true, env = "HP_TARGET", default_value = DEFAULT_TARGET)]
    target: String,

    /// Shared secret expected by the daemon
    #[arg(long, global = true, env = "HP_AUTH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload the app directory, compile it, and start it
    Deploy {
        /// App config; its directory is the app root
        #[arg(default_value = "hotpush.toml")]
        config: PathBuf,

        /// Concurrent uploads
        #[arg(long, default_value_t = DEFAULT_UPLOAD_WORKERS)]
        workers: usize,
    },
    /// Show the live build's state, address, and log
    Status {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Stop the running app
    Stop,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        if let Some(exit) = e.downcast_ref::<ExitError>() {
            if !exit.message.is_empty() {
                eprintln!("Error: {}", exit.message);
            }
            std::process::exit(exit.code);
        }
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let filter = EnvFilter::try_from_env("HP_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let client = ControlClient::new(cli.target, cli.token);

    match cli.command {
        Commands::Deploy { config, workers } => deploy::handle(&client, &config, workers).await,
        Commands::Status { format } => status::handle(&client, format).await,
        Commands::Stop => stop::handle(&client).await,
    }
}
