// Domain layer - Segment planning, crop geometry and the shorts contracts

pub mod errors;
pub mod model;
pub mod rules;
pub mod usecases;

pub use rules::{compute_crop, plan_segments};
