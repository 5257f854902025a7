//! Vertix vertical shorts generator
//!
//! Cuts a source video into up to three windows and re-frames each one into a
//! centered 9:16 clip.
//!
//! # Usage
//!
//! ```bash
//! vertix generate --input talk.mp4 --output-dir processed
//! vertix batch ./downloads --jobs 2
//! vertix plan --duration 200 --width 1920 --height 1080
//! vertix inspect --input talk.mp4 --json
//! vertix config init
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use vertix::app::DefaultAppContainer;
use vertix::cli::{commands, Cli, Commands};
use vertix::config_initialization::initialize_configuration;
use vertix::utils::logging::init_logging;

/// Main entry point for the Vertix CLI application
#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    let loaded = initialize_configuration(cli.config.as_deref(), &cli.config_overrides())
        .context("Failed to load configuration")?;
    init_logging(&loaded.config.logging);

    if let Some(source) = &loaded.source {
        info!("Configuration loaded from {}", source.display());
    }
    info!("Starting Vertix v{}", env!("CARGO_PKG_VERSION"));

    let config = &loaded.config;

    // Execute the requested command
    match cli.command {
        Commands::Generate(args) => {
            let container = DefaultAppContainer::new(config).context("Failed to initialize media backend")?;
            commands::generate(&container, args).await
        }
        Commands::Batch(args) => {
            let container = DefaultAppContainer::new(config).context("Failed to initialize media backend")?;
            commands::batch(&container, args).await
        }
        Commands::Plan(args) => {
            // Dimensions given on the command line need no media backend
            let container = match args.input {
                Some(_) => Some(DefaultAppContainer::new(config).context("Failed to initialize media backend")?),
                None => None,
            };
            let container = container.as_ref().map(|c| c as &dyn vertix::app::AppContainer);
            commands::plan(container, args, config.segment_length).await
        }
        Commands::Inspect(args) => {
            let container = DefaultAppContainer::new(config).context("Failed to initialize media backend")?;
            commands::inspect(&container, args).await
        }
        Commands::Config(args) => commands::config(&loaded, args.command),
    }
}
