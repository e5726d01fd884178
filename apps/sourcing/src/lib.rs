//! Cost-bounded candidate sourcing core.
//!
//! Stages, in run order: [`skills`] extraction, [`strategy`] generation, fingerprint
//! collection ([`collector`] and [`targeted`]), snippet [`scoring`]. [`pipeline`] wires
//! them into one run. [`ranking`] works later on enriched candidate records.

pub mod collector;
pub mod config;
pub mod errors;
pub mod llm_client;
pub mod logging;
pub mod pipeline;
pub mod ranking;
pub mod scoring;
pub mod search;
pub mod skills;
pub mod strategy;
pub mod targeted;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use config::SourcingConfig;
pub use errors::{QueryFailure, SourcingError};
pub use pipeline::{SourcingPipeline, SourcingRequest, SourcingRunReport};
