//! # Utilities Module
//!
//! Cross-cutting helpers that don't belong in domain-specific modules.
//!
//! ## Sub-modules
//! - `logging`: tracing subscriber setup for span timings
//! - `telemetry`: atomic progress blackboard and heartbeat thread
//! - `threading`: rayon thread pool configuration
//! - `workspace`: per-thread scratch buffers for the smoothing engine

pub mod logging;
pub mod telemetry;
pub mod threading;
pub mod workspace;
