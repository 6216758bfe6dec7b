//! Content acquisition: the fallback ladder and image resolution.

pub mod chain;
pub mod image;

pub use chain::{AcquiredContent, AcquisitionChain, ChainConfig, Provenance};
pub use image::ImageFinder;
