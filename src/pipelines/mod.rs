//! # Pipeline Module
//!
//! High-level orchestration of classification and smoothing rounds.

pub mod local_ancestry;

pub use local_ancestry::{run_from_config, LocalAncestryPipeline, RunSummary};
