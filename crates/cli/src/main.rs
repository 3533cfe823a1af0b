//! FormScout CLI: the main entry point.
//!
//! Commands:
//! - `discover`: explore a form and write a Playwright test for it
//! - `tools`: list the automation backend's tools
//! - `seeds`: list the built-in seed procedures

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "formscout",
    about = "FormScout: LLM-driven web form discovery and Playwright test generation",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to ./formscout.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Explore a form and generate test files
    Discover(commands::discover::DiscoverArgs),

    /// Start the automation backend and print its tool catalog
    Tools,

    /// List the built-in seed procedures
    Seeds,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Discover(args) => commands::discover::run(config_path, args).await?,
        Commands::Tools => commands::tools::run(config_path).await?,
        Commands::Seeds => commands::seeds::run(),
    }

    Ok(())
}
