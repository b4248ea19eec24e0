//! Signal generators driven by engine-side rolling statistics.

pub mod band_crossing;

pub use band_crossing::{evaluate_crossing, BandCrossingGenerator, Crossing};
