//! Core trait abstractions for the intelligence pipeline.
//!
//! These traits define the seams between the pipeline and its external
//! services: page fetching, search, chat completion, persistence, and
//! alerting. Each module also ships a mock for tests.

pub mod fetcher;
pub mod llm;
pub mod notifier;
pub mod searcher;
pub mod store;
