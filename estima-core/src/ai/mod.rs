//! AI-assisted requirement extraction
//!
//! Turns a need's document body into candidate requirements: one call lists
//! the requirement titles, then a bounded worker pool describes each title.

mod client;
mod extractor;
mod prompts;
mod responses;

pub use client::{AiClient, AiError, AiMode};
pub use extractor::{extract_requirements, ExtractedRequirement, ExtractionConfig, ExtractionOutcome};
pub use responses::{DescriptionResponse, TitlesResponse};
