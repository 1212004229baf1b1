//! Waveform containers shared by the NI-DAQmx Rust binding.
//!
//! This crate has no dependency on the driver: it only defines the data structures that
//! waveform-returning reads fill in, see [`waveform`] and [`timing`].

pub mod timing;
pub mod utils;
pub mod waveform;

pub use timing::*;
pub use utils::*;
pub use waveform::*;
