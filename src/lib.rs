//! Vertix vertical shorts generator library
//!
//! The core is three pieces: [`domain::rules::plan_segments`] picks the time
//! windows, [`domain::rules::compute_crop`] computes the centered 9:16 crop,
//! and [`engine::ClipEmitter`] drives a decoder and an encode sink over every
//! window. Everything codec-specific sits behind the traits in [`ports`].

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use domain::errors::{DomainError, ErrorKind};
pub use domain::model::{CropRect, OutputDescriptor, PixelRect, Segment, SourceMedia};
pub use domain::rules::{compute_crop, plan_segments};
pub use engine::ClipEmitter;
pub use error::{VertixError, VertixResult};
