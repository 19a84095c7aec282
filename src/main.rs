//! CLI for clipqueue
//!
//! Subcommands:
//! - `run`: start a node and attach the operator console
//! - `config`: print the effective configuration

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use clipqueue::config::load_config;
use clipqueue::console;
use clipqueue::node::Node;
use clipqueue::utils::{QueueError, logging};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "clipqueue", version, about = "Replicated message queue for a video wall")]
struct Cli {
    /// Log level: error, warn, info, debug or trace
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start a node and read console commands from stdin
    Run,
    /// Print the configuration after files and environment are applied
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    let result = match cli.command {
        Command::Run => run_node().await,
        Command::Config => print_config(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_node() -> Result<(), QueueError> {
    let settings = load_config()?;
    let node = Node::start(&settings).await?;
    let timeout = settings.queue.timeout();

    tokio::select! {
        result = console::run(node.queue.clone(), timeout) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    Ok(())
}

fn print_config() -> Result<(), QueueError> {
    let settings = load_config()?;
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}
