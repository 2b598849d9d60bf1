//! # Model Module
//!
//! ## Core Algorithms
//! - `classifier`: per-window ancestry estimates (the emission source)
//! - `transition`: recombination-driven ancestry switching between windows
//! - `crf`: forward-backward posteriors and Viterbi paths over the window chain
//! - `segments`: run-length view of a label path
//! - `prf`: keyed per-unit random streams

pub mod classifier;
pub mod crf;
pub mod prf;
pub mod segments;
pub mod transition;

pub use classifier::{AncestryClassifier, FrequencyClassifier, RoundContext};
pub use crf::{CrfUpdater, SmoothingEngine};
pub use segments::AncestrySegment;
pub use transition::{SwitchRule, TransitionModel, TransitionStep};
