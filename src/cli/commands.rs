//! Command implementations

use anyhow::{Context, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info};

use crate::adapters::TomlConfigAdapter;
use crate::app::{AppContainer, BatchInteractor, BatchReport};
use crate::cli::args::{BatchArgs, ConfigCommand, GenerateArgs, InspectArgs, PlanArgs};
use crate::config_initialization::LoadedConfig;
use crate::domain::errors::DomainError;
use crate::domain::model::{SourceMedia, TimeSpec};
use crate::domain::usecases::{PlanReport, ShortsEnvelope, ShortsRequest, ShortsResponse};
use crate::ports::{ConfigPort, ShortsService};
use crate::utils::Utils;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize result to JSON")?;
    println!("{}", json);
    Ok(())
}

/// Report a domain failure, as an error envelope when JSON was requested
fn fail(error: DomainError, json: bool) -> Result<()> {
    error!("{}", error);
    if json {
        print_json(&ShortsEnvelope::from(&error))?;
    }
    Err(error.into())
}

/// Execute the generate command
pub async fn generate(container: &dyn AppContainer, args: GenerateArgs) -> Result<()> {
    info!("Generating shorts for {}", args.input.display());

    let request = ShortsRequest::new(&args.input)
        .with_output_dir(args.output_dir.clone())
        .with_segment_length(args.segment_length);

    match container.shorts_service().generate(request).await {
        Ok(response) => {
            if args.json {
                print_json(&response.envelope())
            } else {
                display_response(&response);
                Ok(())
            }
        }
        Err(e) => fail(e, args.json),
    }
}

/// Execute the batch command
pub async fn batch(container: &dyn AppContainer, args: BatchArgs) -> Result<()> {
    let sources = match BatchInteractor::discover(&args.inputs) {
        Ok(sources) => sources,
        Err(e) => return fail(e, args.json),
    };
    if sources.is_empty() {
        return fail(
            DomainError::BadArgs("No supported video files found".to_string()),
            args.json,
        );
    }

    let template = ShortsRequest::new("")
        .with_output_dir(args.output_dir.clone())
        .with_segment_length(args.segment_length);
    let items = container.batch_interactor().run(sources, &template).await;
    let report = BatchReport::from_items(&items);

    if args.json {
        print_json(&report)?;
    } else {
        for item in &items {
            match &item.result {
                Ok(response) => {
                    println!("✓ {} ({} shorts)", item.input.display(), response.outputs.len());
                    for output in &response.outputs {
                        println!("    {}", output.path.display());
                    }
                }
                Err(e) => println!("✗ {}: {}", item.input.display(), e),
            }
        }
        println!();
        println!("{} succeeded, {} failed", report.succeeded, report.failed);
    }

    if report.failed > 0 {
        anyhow::bail!("{} of {} videos failed", report.failed, items.len());
    }
    Ok(())
}

/// Execute the plan command
pub async fn plan(container: Option<&dyn AppContainer>, args: PlanArgs, segment_length: f64) -> Result<()> {
    let report = match (&args.input, args.duration, args.width, args.height) {
        (Some(input), _, _, _) => {
            let container = container.context("Probing requires the media backend")?;
            container.inspect_interactor().plan(input, segment_length).await
        }
        (None, Some(duration), Some(width), Some(height)) => {
            PlanReport::build(duration, width, height, segment_length)
        }
        _ => Err(DomainError::BadArgs(
            "Either --input or --duration, --width and --height are required".to_string(),
        )),
    };

    match report {
        Ok(report) if args.json => print_json(&report),
        Ok(report) => {
            display_plan(&report);
            Ok(())
        }
        Err(e) => fail(e, args.json),
    }
}

/// Execute the inspect command
pub async fn inspect(container: &dyn AppContainer, args: InspectArgs) -> Result<()> {
    info!("Inspecting {}", args.input.display());

    match container.inspect_interactor().inspect(&args.input).await {
        Ok(media) if args.json => print_json(&media),
        Ok(media) => {
            display_media_info(&media);
            Ok(())
        }
        Err(e) => fail(e, args.json),
    }
}

/// Execute a config subcommand
pub fn config(loaded: &LoadedConfig, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            if let Some(source) = &loaded.source {
                println!("# loaded from {}", source.display());
            }
            let toml = TomlConfigAdapter::serialize_config(&loaded.config)?;
            print!("{}", toml);
            Ok(())
        }
        ConfigCommand::Init { path, force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists: {} (use --force to replace it)",
                    path.display()
                );
            }
            let adapter = TomlConfigAdapter::new(&path);
            adapter.save_config(&Default::default())?;
            println!("Wrote default configuration to {}", adapter.config_file_path().display());
            Ok(())
        }
    }
}

fn display_response(response: &ShortsResponse) {
    println!("{}", response.message());
    println!("Source: {}", response.source.path.display());
    println!(
        "Crop: {} (segment length {}s)",
        response.crop, response.segment_length
    );
    for output in &response.outputs {
        println!(
            "  #{} {} -> {}  {}  {}",
            output.index,
            TimeSpec::from_seconds(output.start),
            TimeSpec::from_seconds(output.end),
            Utils::format_file_size(output.bytes),
            output.path.display()
        );
    }
    println!(
        "Finished in {}",
        Utils::format_duration(Duration::from_secs_f64(response.processing_seconds.max(0.0)))
    );
}

fn display_plan(report: &PlanReport) {
    println!("Shorts Plan");
    println!("===========");
    println!(
        "Source: {}x{}, {}",
        report.width,
        report.height,
        TimeSpec::from_seconds(report.duration)
    );
    println!(
        "Crop: x={:.2} y={:.2} {:.2}x{:.2} (pixels: {})",
        report.crop.x, report.crop.y, report.crop.width, report.crop.height, report.pixel_crop
    );
    println!("Segment length: {}s", report.segment_length);
    println!();

    if report.segments.is_empty() {
        println!("No segments: the source is empty");
    }
    for segment in &report.segments {
        println!(
            "  part{}: {} -> {} ({:.2}s)",
            segment.index,
            TimeSpec::from_seconds(segment.start),
            TimeSpec::from_seconds(segment.end),
            segment.duration()
        );
    }
}

/// Display media information in human-readable format
fn display_media_info(media: &SourceMedia) {
    println!("Media Information");
    println!("=================");
    println!("File: {}", media.path.display());
    println!("Duration: {}", TimeSpec::from_seconds(media.duration));
    println!("Resolution: {}x{} (aspect {:.4})", media.width, media.height, media.aspect_ratio());
    match media.frame_rate {
        Some(rate) => println!("Frame Rate: {:.2} fps", rate),
        None => println!("Frame Rate: unknown"),
    }
    println!("Audio: {}", if media.has_audio { "yes" } else { "no" });
}
