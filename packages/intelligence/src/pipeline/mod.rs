//! Pipeline assembly and the run loop.

pub mod run;

pub use run::{Pipeline, RunReport};
