//! # Per-Window Ancestry Classification
//!
//! The classifier fills each targeted haplotype's `Logit8` estimate buffer
//! with per-window ancestry probabilities. The smoothing engine then treats
//! those estimates as emissions.
//!
//! [`FrequencyClassifier`] is the built-in implementation: a bagged
//! allele-frequency model.
//!
//! 1. Per SNP and ancestry, accumulate a weighted allele-1 count and a total
//!    weight over all contributing haplotypes. A haplotype's weight for
//!    ancestry `k` is its current posterior for `k` at the SNP's window.
//! 2. For each tree, resample the window's SNP range with replacement and
//!    sum per-ancestry log-likelihoods of the haplotype's alleles under the
//!    leave-one-out frequencies (own contribution removed, pseudocounts added).
//! 3. Softmax per tree, average over trees.
//!
//! Reference samples always contribute. Query samples contribute from round
//! 1 on, once they carry a posterior from the previous round.

use rand::Rng;
use rayon::prelude::*;
use tracing::debug;

use crate::data::codec::{LogOddsCodec, Logit16, Logit8};
use crate::data::haplotype::{SampleIdx, N_HAPS_PER_SAMPLE};
use crate::data::index::{GenomeIndex, Topology};
use crate::data::sample::{Population, Sample};
use crate::data::snp::MISSING_ALLELE;
use crate::error::{AdmixError, Result};
use crate::model::prf::{mix64, unit_rng};

/// Default frequency pseudocount per allele
pub const DEFAULT_PSEUDOCOUNT: f64 = 0.5;

/// What one classification round should do
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundContext {
    /// Round number, 0 for the initial round
    pub round: usize,
    /// Whether reference samples are re-classified this round
    pub include_reference: bool,
    /// Seed of this round's random streams
    pub seed: u64,
}

impl RoundContext {
    /// Context for `round`, deriving the round seed from the run seed
    pub fn new(round: usize, include_reference: bool, run_seed: u64) -> Self {
        Self {
            round,
            include_reference,
            seed: mix64(run_seed.wrapping_add(round as u64)),
        }
    }

    /// Whether samples of `population` get new estimates this round
    pub fn is_target(&self, population: Population) -> bool {
        !population.is_reference() || self.include_reference
    }

    /// Whether samples of `population` contribute training counts this round
    pub fn contributes(&self, population: Population) -> bool {
        population.is_reference() || self.round > 0
    }
}

/// Source of per-window ancestry estimates.
///
/// After `classify` returns `Ok`, every sample for which
/// [`RoundContext::is_target`] holds must have all its estimate cells set.
/// Posteriors from the previous round are readable through the index.
pub trait AncestryClassifier: Send + Sync {
    fn classify(&self, index: &mut GenomeIndex, ctx: &RoundContext) -> Result<()>;
}

/// Weighted allele counts per SNP and ancestry
#[derive(Clone, Debug)]
pub struct AlleleCounts {
    n_ancestries: usize,
    /// Weighted allele-1 count (n_snps x K)
    alt: Vec<f64>,
    /// Total weight of non-missing calls (n_snps x K)
    total: Vec<f64>,
}

impl AlleleCounts {
    /// Accumulate counts from every contributing sample.
    ///
    /// Parallel over SNPs; within a SNP samples are summed in index order so
    /// the result does not depend on the thread count.
    pub fn build(topology: &Topology, samples: &[Sample], ctx: &RoundContext) -> Self {
        let k = topology.n_ancestries();
        let n_snps = topology.n_snps();
        let mut alt = vec![0.0; n_snps * k];
        let mut total = vec![0.0; n_snps * k];
        if k == 0 {
            return Self {
                n_ancestries: k,
                alt,
                total,
            };
        }

        let contributors: Vec<&Sample> = samples
            .iter()
            .filter(|s| ctx.contributes(s.population()))
            .collect();
        let snps = topology.snps().as_slice();

        alt.par_chunks_mut(k)
            .zip(total.par_chunks_mut(k))
            .enumerate()
            .for_each(|(s, (alt_row, total_row))| {
                let window = snps[s].window.as_usize();
                for sample in &contributors {
                    for slot in 0..N_HAPS_PER_SAMPLE {
                        let allele = sample.alleles(slot)[s];
                        if allele == MISSING_ALLELE {
                            continue;
                        }
                        let post = sample.posterior(slot);
                        for a in 0..k {
                            let w = Logit16::decode(*post.get(window, a));
                            total_row[a] += w;
                            if allele == 1 {
                                alt_row[a] += w;
                            }
                        }
                    }
                }
            });

        Self {
            n_ancestries: k,
            alt,
            total,
        }
    }

    pub fn n_ancestries(&self) -> usize {
        self.n_ancestries
    }

    /// Weighted allele-1 counts of one SNP
    pub fn alt(&self, snp: usize) -> &[f64] {
        &self.alt[snp * self.n_ancestries..(snp + 1) * self.n_ancestries]
    }

    /// Total weights of one SNP
    pub fn total(&self, snp: usize) -> &[f64] {
        &self.total[snp * self.n_ancestries..(snp + 1) * self.n_ancestries]
    }
}

/// Bagged allele-frequency classifier
#[derive(Clone, Copy, Debug)]
pub struct FrequencyClassifier {
    n_trees: u32,
    pseudocount: f64,
}

impl FrequencyClassifier {
    pub fn new(n_trees: u32) -> Self {
        Self {
            n_trees,
            pseudocount: DEFAULT_PSEUDOCOUNT,
        }
    }

    pub fn with_pseudocount(mut self, pseudocount: f64) -> Self {
        self.pseudocount = pseudocount;
        self
    }

    pub fn n_trees(&self) -> u32 {
        self.n_trees
    }

    /// Estimates for both haplotypes of one sample
    fn classify_sample(
        &self,
        topology: &Topology,
        counts: &AlleleCounts,
        sample_idx: SampleIdx,
        sample: &mut Sample,
        ctx: &RoundContext,
    ) {
        let k = topology.n_ancestries();
        let n_windows = topology.n_windows();
        let windows = topology.windows().as_slice();
        let snps = topology.snps().as_slice();
        let own_counted = ctx.contributes(sample.population());
        let tree_weight = 1.0 / self.n_trees as f64;

        let mut acc = vec![0.0f64; n_windows * k];
        let mut log_lik = vec![0.0f64; k];
        let mut own = vec![0.0f64; k];

        for slot in 0..N_HAPS_PER_SAMPLE {
            acc.fill(0.0);
            let alleles = sample.alleles(slot);
            let posterior = sample.posterior(slot);

            for tree in 0..self.n_trees {
                let mut rng = unit_rng(ctx.seed, sample_idx, slot, tree);
                for (w, window) in windows.iter().enumerate() {
                    log_lik.fill(0.0);
                    let range = window.rf_range();
                    for _ in 0..window.rf_len() {
                        let s = rng.random_range(range.clone());
                        let allele = alleles[s];
                        if allele == MISSING_ALLELE {
                            continue;
                        }
                        if own_counted {
                            let own_window = snps[s].window.as_usize();
                            for (a, o) in own.iter_mut().enumerate() {
                                *o = Logit16::decode(*posterior.get(own_window, a));
                            }
                        }
                        let alt = counts.alt(s);
                        let total = counts.total(s);
                        for a in 0..k {
                            let (own_total, own_alt) = match (own_counted, allele) {
                                (false, _) => (0.0, 0.0),
                                (true, 1) => (own[a], own[a]),
                                (true, _) => (own[a], 0.0),
                            };
                            let num = (alt[a] - own_alt).max(0.0) + self.pseudocount;
                            let den = (total[a] - own_total).max(0.0) + 2.0 * self.pseudocount;
                            let freq = num / den;
                            log_lik[a] += if allele == 1 { freq.ln() } else { (1.0 - freq).ln() };
                        }
                    }

                    let max = log_lik.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    let mut sum = 0.0;
                    for l in log_lik.iter_mut() {
                        *l = (*l - max).exp();
                        sum += *l;
                    }
                    let row = &mut acc[w * k..(w + 1) * k];
                    for (r, l) in row.iter_mut().zip(&log_lik) {
                        *r += tree_weight * l / sum;
                    }
                }
            }

            for (e, &p) in sample
                .estimates_mut(slot)
                .as_mut_slice()
                .iter_mut()
                .zip(&acc)
            {
                *e = Logit8::encode(p);
            }
        }
    }
}

impl Default for FrequencyClassifier {
    fn default() -> Self {
        Self::new(100)
    }
}

impl AncestryClassifier for FrequencyClassifier {
    fn classify(&self, index: &mut GenomeIndex, ctx: &RoundContext) -> Result<()> {
        if self.n_trees == 0 {
            return Err(AdmixError::config("Number of trees must be at least 1"));
        }
        if !(self.pseudocount > 0.0 && self.pseudocount.is_finite()) {
            return Err(AdmixError::config(format!(
                "Pseudocount must be positive, got {}",
                self.pseudocount
            )));
        }

        let (topology, samples) = index.parts_mut();
        let counts = AlleleCounts::build(topology, samples, ctx);
        debug!(
            round = ctx.round,
            n_snps = topology.n_snps(),
            "Accumulated weighted allele counts"
        );

        samples
            .par_iter_mut()
            .enumerate()
            .filter(|(_, s)| ctx.is_target(s.population()))
            .for_each(|(i, sample)| {
                self.classify_sample(topology, &counts, SampleIdx::from(i), sample, ctx);
            });
        Ok(())
    }
}
