//! # Samples and Their Per-Haplotype Buffers
//!
//! A sample owns, for each of its two haplotypes:
//! - allele calls per SNP (classifier input),
//! - classifier estimates per window/ancestry (`Logit8`),
//! - current posterior per window/ancestry (`Logit16`),
//! - most-likely ancestry label per window.
//!
//! Every buffer is sized once at construction and rewritten in place by
//! later rounds; dropping the sample releases them together.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::data::codec::{LogOddsCodec, Logit16, Logit8};
use crate::data::haplotype::N_HAPS_PER_SAMPLE;
use crate::data::matrix::AncestryMatrix;
use crate::data::window::WindowIdx;
use crate::model::segments::{segments_from_labels, AncestrySegment};

/// A-priori population of a sample
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Population {
    /// Admixed or unknown sample to be analyzed
    Query,
    /// Member of the reference panel for the given ancestry
    Reference(u8),
}

impl Population {
    pub fn is_reference(self) -> bool {
        matches!(self, Population::Reference(_))
    }

    pub fn ancestry(self) -> Option<u8> {
        match self {
            Population::Query => None,
            Population::Reference(k) => Some(k),
        }
    }
}

/// One diploid sample
#[derive(Clone, Debug)]
pub struct Sample {
    id: Arc<str>,
    population: Population,
    alleles: [Vec<u8>; N_HAPS_PER_SAMPLE],
    estimates: [AncestryMatrix<i8>; N_HAPS_PER_SAMPLE],
    posterior: [AncestryMatrix<i16>; N_HAPS_PER_SAMPLE],
    labels: [Vec<u8>; N_HAPS_PER_SAMPLE],
}

impl Sample {
    /// Create a sample and allocate its buffers.
    ///
    /// Posteriors start at the uniform `1/K`; estimates and labels start at 0.
    pub fn new(
        id: impl Into<Arc<str>>,
        population: Population,
        alleles: [Vec<u8>; N_HAPS_PER_SAMPLE],
        n_windows: usize,
        n_ancestries: usize,
    ) -> Self {
        let uniform = Logit16::encode(1.0 / n_ancestries.max(1) as f64);
        let mut posterior = [
            AncestryMatrix::new(n_windows, n_ancestries),
            AncestryMatrix::new(n_windows, n_ancestries),
        ];
        for p in &mut posterior {
            p.fill(uniform);
        }

        Self {
            id: id.into(),
            population,
            alleles,
            estimates: [
                AncestryMatrix::new(n_windows, n_ancestries),
                AncestryMatrix::new(n_windows, n_ancestries),
            ],
            posterior,
            labels: [vec![0; n_windows], vec![0; n_windows]],
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn id_arc(&self) -> &Arc<str> {
        &self.id
    }

    pub fn population(&self) -> Population {
        self.population
    }

    /// Allele calls of one haplotype (0/1, 255 = missing)
    pub fn alleles(&self, slot: usize) -> &[u8] {
        &self.alleles[slot]
    }

    /// Classifier estimates of one haplotype
    pub fn estimates(&self, slot: usize) -> &AncestryMatrix<i8> {
        &self.estimates[slot]
    }

    pub fn estimates_mut(&mut self, slot: usize) -> &mut AncestryMatrix<i8> {
        &mut self.estimates[slot]
    }

    /// Current posterior of one haplotype
    pub fn posterior(&self, slot: usize) -> &AncestryMatrix<i16> {
        &self.posterior[slot]
    }

    /// Most-likely ancestry per window of one haplotype
    pub fn labels(&self, slot: usize) -> &[u8] {
        &self.labels[slot]
    }

    /// Estimates and posterior of one haplotype, borrowed together for smoothing
    pub fn smoothing_buffers_mut(
        &mut self,
        slot: usize,
    ) -> (&AncestryMatrix<i8>, &mut AncestryMatrix<i16>, &mut [u8]) {
        (
            &self.estimates[slot],
            &mut self.posterior[slot],
            &mut self.labels[slot],
        )
    }

    /// Hold a reference sample at its a-priori ancestry: one-hot estimates and
    /// posteriors at the extreme codes, and the ancestry as every label.
    ///
    /// Query samples are left untouched.
    pub fn pin_to_population(&mut self) {
        let Some(ancestry) = self.population.ancestry() else {
            return;
        };
        let k_ref = ancestry as usize;
        for slot in 0..N_HAPS_PER_SAMPLE {
            for row in self.estimates[slot].rows_mut() {
                for (k, v) in row.iter_mut().enumerate() {
                    *v = Logit8::encode(if k == k_ref { 1.0 } else { 0.0 });
                }
            }
            for row in self.posterior[slot].rows_mut() {
                for (k, v) in row.iter_mut().enumerate() {
                    *v = Logit16::encode(if k == k_ref { 1.0 } else { 0.0 });
                }
            }
            self.labels[slot].fill(ancestry);
        }
    }

    /// Decoded posterior probabilities of one haplotype at one window
    pub fn posterior_probs(&self, slot: usize, window: WindowIdx) -> Vec<f64> {
        self.posterior[slot]
            .row(window)
            .iter()
            .map(|&c| Logit16::decode(c))
            .collect()
    }

    /// Result view of one haplotype for the emitters
    pub fn haplotype_result(&self, slot: usize) -> HaplotypeResult<'_> {
        HaplotypeResult {
            posterior: &self.posterior[slot],
            labels: &self.labels[slot],
            segments: segments_from_labels(&self.labels[slot]),
        }
    }

    /// Number of windows the buffers were sized for
    pub fn n_windows(&self) -> usize {
        self.labels[0].len()
    }

    /// Number of ancestries the buffers were sized for
    pub fn n_ancestries(&self) -> usize {
        self.posterior[0].n_ancestries()
    }
}

/// Final per-haplotype output handed to result emitters
#[derive(Debug)]
pub struct HaplotypeResult<'a> {
    /// Wide-coded posterior, `n_windows × K`
    pub posterior: &'a AncestryMatrix<i16>,
    /// Most-likely ancestry per window
    pub labels: &'a [u8],
    /// Maximal runs of equal labels
    pub segments: Vec<AncestrySegment>,
}
