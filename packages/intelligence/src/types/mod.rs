//! Domain types shared across the pipeline.

pub mod analysis;
pub mod item;
pub mod route;
