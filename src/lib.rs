//! # admixcrf
//!
//! Local-ancestry inference core. Per-window ancestry estimates from a
//! classifier are smoothed along each haplotype by a linear-chain model whose
//! transitions follow recombination distance, and the smoothed posteriors feed
//! back into later classification rounds.
//!
//! ## Modules
//! - `config`: CLI argument parsing and immutable run parameters
//! - `data`: genome index, samples, compact probability codecs
//! - `error`: Error types and result aliases
//! - `model`: classifier, transition model, smoothing engine
//! - `pipelines`: round orchestration
//! - `utils`: logging, telemetry, threading, workspaces
//!
//! ## Example
//! ```no_run
//! use admixcrf::{CrfParams, FrequencyClassifier, GeneticMap, GenomeIndexBuilder, LocalAncestryPipeline, Population, SnpIdx};
//!
//! # fn main() -> admixcrf::Result<()> {
//! let map = GeneticMap::from_points([(0, 0.0), (1_000_000, 1.0)])?;
//! let mut builder = GenomeIndexBuilder::new(vec!["AFR".into(), "EUR".into()], map);
//! for i in 0..3 {
//!     builder.add_snp(i * 1000);
//! }
//! builder.add_window(SnpIdx::new(1), SnpIdx::new(0), SnpIdx::new(2));
//! builder.add_sample("ref1", Population::Reference(0), [vec![0, 0, 0], vec![0, 0, 1]]);
//! builder.add_sample("ref2", Population::Reference(1), [vec![1, 1, 1], vec![1, 1, 0]]);
//! builder.add_sample("query", Population::Query, [vec![0, 0, 0], vec![1, 1, 1]]);
//! let mut index = builder.build()?;
//!
//! let pipeline = LocalAncestryPipeline::new(CrfParams::new(2), FrequencyClassifier::new(100));
//! pipeline.run(&mut index)?;
//! let result = index.sample_by_id("query").unwrap().haplotype_result(0);
//! println!("{:?}", result.segments);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod pipelines;
pub mod utils;

// Re-export commonly used types
pub use config::{Config, CrfParams};
pub use data::codec::{LogOddsCodec, Logit16, Logit8};
pub use data::genetic_map::GeneticMap;
pub use data::haplotype::{HapIdx, SampleIdx};
pub use data::index::{GenomeIndex, GenomeIndexBuilder};
pub use data::matrix::AncestryMatrix;
pub use data::sample::{HaplotypeResult, Population, Sample};
pub use data::snp::SnpIdx;
pub use data::window::WindowIdx;
pub use error::{AdmixError, Result};
pub use model::classifier::{AncestryClassifier, FrequencyClassifier, RoundContext};
pub use model::crf::SmoothingEngine;
pub use model::segments::AncestrySegment;
pub use model::transition::{SwitchRule, TransitionModel, TransitionStep};
pub use pipelines::{run_from_config, LocalAncestryPipeline, RunSummary};
