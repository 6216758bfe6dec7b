//! Structured extraction: prompts, parsing, provider failover.

pub mod orchestrator;
pub mod parse;
pub mod prompts;

pub use orchestrator::{ExtractionOrchestrator, ExtractionOutcome, ProviderPlan};
