//! CLI module for Vertix
//!
//! This module handles command-line argument parsing and command execution.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config_initialization::ConfigOverrides;
use crate::utils::logging::{LogFormat, LogLevel};

pub mod args;
pub mod commands;

pub use args::{BatchArgs, ConfigArgs, ConfigCommand, EncodeArgs, GenerateArgs, InspectArgs, PlanArgs};

/// Vertix vertical shorts generator
///
/// Cuts a source video into up to three short windows and re-frames each one
/// into a centered 9:16 vertical clip.
#[derive(Parser, Debug)]
#[command(name = "vertix")]
#[command(about = "Vertix - Turn landscape videos into vertical shorts")]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: vertix.toml, then config/vertix.toml)
    #[arg(long, env = "VERTIX_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_parser = args::parse_log_level)]
    pub log_level: Option<LogLevel>,

    /// Log output format (pretty, compact, json)
    #[arg(long, global = true, value_parser = args::parse_log_format)]
    pub log_format: Option<LogFormat>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate vertical shorts from one video
    Generate(GenerateArgs),
    /// Generate shorts for every video in files or directories
    Batch(BatchArgs),
    /// Show the segments and crop that would be used, without encoding
    Plan(PlanArgs),
    /// Inspect video file information
    Inspect(InspectArgs),
    /// Show or initialize the configuration
    Config(ConfigArgs),
}

impl Cli {
    /// Flags that override the configuration file and environment
    pub fn config_overrides(&self) -> ConfigOverrides {
        let mut overrides = match &self.command {
            Commands::Generate(args) => {
                let mut overrides = args.encode.overrides();
                overrides.output_dir = args.output_dir.clone();
                overrides.segment_length = args.segment_length;
                overrides
            }
            Commands::Batch(args) => {
                let mut overrides = args.encode.overrides();
                overrides.output_dir = args.output_dir.clone();
                overrides.segment_length = args.segment_length;
                overrides.max_concurrent_jobs = args.jobs;
                overrides
            }
            Commands::Plan(args) => ConfigOverrides {
                segment_length: args.segment_length,
                ..Default::default()
            },
            Commands::Inspect(_) | Commands::Config(_) => ConfigOverrides::default(),
        };
        overrides.log_level = self.log_level;
        overrides.log_format = self.log_format;
        overrides
    }
}
