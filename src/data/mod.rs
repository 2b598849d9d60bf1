//! # Data Module
//!
//! In-memory representations the classifier and smoothing engine work on.
//!
//! ## Design Philosophy
//! - **Flat buffers:** every per-haplotype window x ancestry table is one
//!   contiguous allocation, indexed `window * K + ancestry`.
//! - **Zero-cost newtypes:** `SnpIdx`, `WindowIdx`, `SampleIdx`, `HapIdx`
//!   keep the different index spaces apart at compile time.
//! - **Compact codes:** probabilities are stored as log-odds integers
//!   (`Logit8` estimates, `Logit16` posteriors).

pub mod codec;
pub mod genetic_map;
pub mod haplotype;
pub mod index;
pub mod matrix;
pub mod sample;
pub mod snp;
pub mod window;

// Re-export commonly used types
pub use codec::{LogOddsCodec, Logit16, Logit8};
pub use genetic_map::GeneticMap;
pub use haplotype::{HapIdx, SampleIdx, N_HAPS_PER_SAMPLE};
pub use index::{GenomeIndex, GenomeIndexBuilder, Topology};
pub use matrix::AncestryMatrix;
pub use sample::{HaplotypeResult, Population, Sample};
pub use snp::{Snp, SnpIdx, Snps, MISSING_ALLELE};
pub use window::{CrfWindow, WindowIdx, Windows};
