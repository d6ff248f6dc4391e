mod commands;
mod prompts;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Tiller -- drive interactive terminal sessions under oracle supervision.
#[derive(Parser, Debug)]
#[command(name = "tiller", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a command under supervision
    Run {
        /// Path to the configuration file (default: ./tiller.toml if present)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Oracle to use, overriding the configuration (rules or llm)
        #[arg(long)]
        oracle: Option<String>,

        /// Model for the llm oracle, overriding the configuration
        #[arg(long)]
        model: Option<String>,

        /// Do not mirror child output to stdout
        #[arg(long)]
        quiet: bool,

        /// Command and arguments to execute
        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<String>,
    },

    /// Write a starter tiller.toml to the current directory
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing with env filter (e.g., RUST_LOG=debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            oracle,
            model,
            quiet,
            command,
        } => {
            let code = commands::run::run(
                config.as_deref(),
                oracle.as_deref(),
                model.as_deref(),
                quiet,
                &command,
            )?;
            std::process::exit(code);
        }
        Commands::Init { force } => commands::init::run(force),
    }
}
