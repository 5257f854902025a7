//! Command-line argument definitions

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::config_initialization::ConfigOverrides;
use crate::domain::model::TimeSpec;
use crate::engine::{OverwritePolicy, MAX_CRF};
use crate::utils::logging::{LogFormat, LogLevel};

/// Encoder flags shared by `generate` and `batch`
#[derive(Args, Debug, Clone, Default)]
pub struct EncodeArgs {
    /// Constant Rate Factor (0-51)
    #[arg(long, value_parser = parse_crf)]
    pub crf: Option<u8>,

    /// Encoding preset
    #[arg(long)]
    pub preset: Option<String>,

    /// Encoder threads
    #[arg(long, value_parser = parse_threads)]
    pub threads: Option<usize>,

    /// Output container format
    #[arg(long)]
    pub container: Option<String>,

    /// What to do when a short already exists (always, never)
    #[arg(long, value_parser = parse_overwrite)]
    pub overwrite: Option<OverwritePolicy>,

    /// Drop the audio track
    #[arg(long)]
    pub no_audio: bool,
}

impl EncodeArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            crf: self.crf,
            preset: self.preset.clone(),
            threads: self.threads,
            container: self.container.clone(),
            overwrite: self.overwrite,
            audio: self.no_audio.then_some(false),
            ..Default::default()
        }
    }
}

/// Arguments for the generate command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory for the generated shorts
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Length of each short (seconds, MM:SS or HH:MM:SS)
    #[arg(short = 'l', long, value_parser = parse_seconds)]
    pub segment_length: Option<f64>,

    #[command(flatten)]
    pub encode: EncodeArgs,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the batch command
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Video files or directories to scan
    #[arg(required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Directory for the generated shorts
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Length of each short (seconds, MM:SS or HH:MM:SS)
    #[arg(short = 'l', long, value_parser = parse_seconds)]
    pub segment_length: Option<f64>,

    /// Maximum number of videos processed at once
    #[arg(short, long, value_parser = parse_threads)]
    pub jobs: Option<usize>,

    #[command(flatten)]
    pub encode: EncodeArgs,

    /// Print the results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Probe this video for duration and frame size
    #[arg(short, long, required_unless_present = "duration", conflicts_with_all = ["duration", "width", "height"])]
    pub input: Option<PathBuf>,

    /// Source duration (seconds, MM:SS or HH:MM:SS)
    #[arg(long, value_parser = parse_seconds, requires_all = ["width", "height"])]
    pub duration: Option<f64>,

    /// Source frame width in pixels
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub width: Option<u32>,

    /// Source frame height in pixels
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub height: Option<u32>,

    /// Length of each short (seconds, MM:SS or HH:MM:SS)
    #[arg(short = 'l', long, value_parser = parse_seconds)]
    pub segment_length: Option<f64>,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,
    /// Write the default configuration to a file
    Init {
        /// Destination file
        #[arg(default_value = "vertix.toml")]
        path: PathBuf,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

pub(crate) fn parse_crf(value: &str) -> Result<u8, String> {
    clap_num::number_range(value, 0, MAX_CRF)
}

pub(crate) fn parse_threads(value: &str) -> Result<usize, String> {
    clap_num::number_range(value, 1, 256)
}

pub(crate) fn parse_seconds(value: &str) -> Result<f64, String> {
    TimeSpec::parse(value)
        .map(|time| time.as_seconds())
        .map_err(|e| e.message())
}

pub(crate) fn parse_overwrite(value: &str) -> Result<OverwritePolicy, String> {
    OverwritePolicy::parse(value).map_err(|e| e.message())
}

pub(crate) fn parse_log_level(value: &str) -> Result<LogLevel, String> {
    LogLevel::parse(value).map_err(|e| e.message())
}

pub(crate) fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    LogFormat::parse(value).map_err(|e| e.message())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seconds_formats() {
        assert_eq!(parse_seconds("45").unwrap(), 45.0);
        assert_eq!(parse_seconds("01:30").unwrap(), 90.0);
        assert_eq!(parse_seconds("01:00:00").unwrap(), 3600.0);
        assert!(parse_seconds("soon").is_err());
    }

    #[test]
    fn test_parse_crf_range() {
        assert_eq!(parse_crf("0").unwrap(), 0);
        assert_eq!(parse_crf("51").unwrap(), 51);
        assert!(parse_crf("52").is_err());
        assert!(parse_crf("-1").is_err());
    }

    #[test]
    fn test_no_audio_maps_to_override() {
        let args = EncodeArgs {
            no_audio: true,
            ..Default::default()
        };
        assert_eq!(args.overrides().audio, Some(false));
        assert_eq!(EncodeArgs::default().overrides().audio, None);
    }
}
