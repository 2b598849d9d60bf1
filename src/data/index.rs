//! # Genome Index
//!
//! The owning container for everything the classifier and the smoothing engine
//! operate on: reference population names, SNP and window tables, the genetic
//! map, and the samples with their buffers.
//!
//! Topology (names, SNPs, windows, map) is immutable once built; only sample
//! buffers change. [`GenomeIndex::parts_mut`] hands out the read-only topology
//! together with the mutable sample slice so per-sample work can run in
//! parallel while sharing the tables.
//!
//! Construction validates the invariants the core relies on; any violation is
//! an `InvalidData` error and nothing is built.

use std::collections::HashMap;
use std::sync::Arc;

use crate::data::genetic_map::GeneticMap;
use crate::data::haplotype::{SampleIdx, N_HAPS_PER_SAMPLE};
use crate::data::sample::{Population, Sample};
use crate::data::snp::{Snp, SnpIdx, Snps};
use crate::data::window::{CrfWindow, WindowIdx, Windows};
use crate::error::{AdmixError, Result};

/// Largest supported number of ancestries (labels are stored as `u8`)
pub const MAX_ANCESTRIES: usize = u8::MAX as usize;

/// Read-only tables shared by all samples
#[derive(Clone, Debug)]
pub struct Topology {
    ancestries: Vec<Arc<str>>,
    snps: Snps,
    windows: Windows,
    genetic_map: GeneticMap,
}

impl Topology {
    pub fn n_ancestries(&self) -> usize {
        self.ancestries.len()
    }

    pub fn ancestry_names(&self) -> &[Arc<str>] {
        &self.ancestries
    }

    pub fn snps(&self) -> &Snps {
        &self.snps
    }

    pub fn windows(&self) -> &Windows {
        &self.windows
    }

    pub fn genetic_map(&self) -> &GeneticMap {
        &self.genetic_map
    }

    pub fn n_windows(&self) -> usize {
        self.windows.len()
    }

    pub fn n_snps(&self) -> usize {
        self.snps.len()
    }
}

/// The genome index
#[derive(Clone, Debug)]
pub struct GenomeIndex {
    topology: Topology,
    samples: Vec<Sample>,
    sample_lookup: HashMap<Arc<str>, SampleIdx>,
}

impl GenomeIndex {
    /// Assemble and validate an index from prebuilt tables.
    pub fn new(
        ancestries: Vec<String>,
        snps: Snps,
        windows: Windows,
        genetic_map: GeneticMap,
        samples: Vec<Sample>,
    ) -> Result<Self> {
        let sample_lookup = samples
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id_arc().clone(), SampleIdx::from(i)))
            .collect::<HashMap<_, _>>();
        if sample_lookup.len() != samples.len() {
            return Err(AdmixError::invalid_data("Duplicate sample identifiers"));
        }

        let index = Self {
            topology: Topology {
                ancestries: ancestries.into_iter().map(Arc::from).collect(),
                snps,
                windows,
                genetic_map,
            },
            samples,
            sample_lookup,
        };
        index.validate()?;
        Ok(index)
    }

    /// Check every invariant the classifier and smoothing engine depend on.
    pub fn validate(&self) -> Result<()> {
        let t = &self.topology;
        let k = t.n_ancestries();
        if k == 0 || k > MAX_ANCESTRIES {
            return Err(AdmixError::invalid_data(format!(
                "Number of reference populations must be in 1..={}, got {}",
                MAX_ANCESTRIES, k
            )));
        }
        let mut names: Vec<&str> = t.ancestries.iter().map(|a| a.as_ref()).collect();
        names.sort_unstable();
        if names.windows(2).any(|w| w[0] == w[1]) {
            return Err(AdmixError::invalid_data("Duplicate reference population names"));
        }

        validate_windows(t.windows.as_slice(), t.snps.len())?;

        let n_windows = t.windows.len();
        for (i, snp) in t.snps.iter().enumerate() {
            if snp.window.as_usize() >= n_windows {
                return Err(AdmixError::invalid_data(format!(
                    "SNP {} (pos {}) assigned to window {} but only {} windows exist",
                    i,
                    snp.pos,
                    snp.window.as_usize(),
                    n_windows
                )));
            }
        }

        for sample in &self.samples {
            if let Population::Reference(a) = sample.population() {
                if a as usize >= k {
                    return Err(AdmixError::invalid_data(format!(
                        "Sample {} has reference population {} but only {} populations exist",
                        sample.id(),
                        a,
                        k
                    )));
                }
            }
            for slot in 0..N_HAPS_PER_SAMPLE {
                if sample.alleles(slot).len() != t.snps.len() {
                    return Err(AdmixError::invalid_data(format!(
                        "Sample {} haplotype {} has {} alleles, expected {}",
                        sample.id(),
                        slot,
                        sample.alleles(slot).len(),
                        t.snps.len()
                    )));
                }
            }
            if sample.n_windows() != n_windows || sample.n_ancestries() != k {
                return Err(AdmixError::invalid_data(format!(
                    "Sample {} buffers sized {}x{}, expected {}x{}",
                    sample.id(),
                    sample.n_windows(),
                    sample.n_ancestries(),
                    n_windows,
                    k
                )));
            }
        }
        Ok(())
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn n_ancestries(&self) -> usize {
        self.topology.n_ancestries()
    }

    pub fn n_windows(&self) -> usize {
        self.topology.n_windows()
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn snps(&self) -> &Snps {
        &self.topology.snps
    }

    pub fn windows(&self) -> &Windows {
        &self.topology.windows
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn sample(&self, idx: SampleIdx) -> &Sample {
        &self.samples[idx.as_usize()]
    }

    /// Look a sample up by identifier
    pub fn index_of(&self, id: &str) -> Option<SampleIdx> {
        self.sample_lookup.get(id).copied()
    }

    pub fn sample_by_id(&self, id: &str) -> Option<&Sample> {
        self.index_of(id).map(|i| self.sample(i))
    }

    /// Shared topology plus exclusive access to the sample buffers
    pub fn parts_mut(&mut self) -> (&Topology, &mut [Sample]) {
        (&self.topology, &mut self.samples)
    }
}

fn validate_windows(windows: &[CrfWindow], n_snps: usize) -> Result<()> {
    for (i, w) in windows.iter().enumerate() {
        if !w.genetic_pos.is_finite() {
            return Err(AdmixError::invalid_data(format!(
                "Window {} has non-finite genetic position",
                i
            )));
        }
        if !(w.rf_start <= w.snp && w.snp <= w.rf_end) {
            return Err(AdmixError::invalid_data(format!(
                "Window {} SNP range {}..={} does not contain its marker {}",
                i,
                w.rf_start.as_usize(),
                w.rf_end.as_usize(),
                w.snp.as_usize()
            )));
        }
        if w.rf_end.as_usize() >= n_snps {
            return Err(AdmixError::invalid_data(format!(
                "Window {} SNP range ends at {} but only {} SNPs exist",
                i,
                w.rf_end.as_usize(),
                n_snps
            )));
        }
        if i == 0 {
            continue;
        }
        let prev = &windows[i - 1];
        if w.genetic_pos <= prev.genetic_pos {
            return Err(AdmixError::invalid_data(format!(
                "Windows not strictly ordered by genetic position at window {} ({} cM after {} cM)",
                i, w.genetic_pos, prev.genetic_pos
            )));
        }
        if w.snp <= prev.snp {
            return Err(AdmixError::invalid_data(format!(
                "Windows not strictly ordered by marker at window {}",
                i
            )));
        }
        if w.rf_start < prev.rf_start || w.rf_end < prev.rf_end {
            return Err(AdmixError::invalid_data(format!(
                "Window {} SNP range moves backwards relative to window {}",
                i,
                i - 1
            )));
        }
    }
    Ok(())
}

/// Incremental construction of a [`GenomeIndex`] from in-memory inputs.
///
/// SNP genetic positions and window positions are taken from the genetic map.
/// Each SNP is assigned to the last window whose marker is at or before it
/// (SNPs ahead of the first marker go to window 0).
#[derive(Debug, Default)]
pub struct GenomeIndexBuilder {
    ancestries: Vec<String>,
    genetic_map: GeneticMap,
    snp_positions: Vec<u32>,
    windows: Vec<(SnpIdx, SnpIdx, SnpIdx)>,
    samples: Vec<(String, Population, [Vec<u8>; N_HAPS_PER_SAMPLE])>,
}

impl GenomeIndexBuilder {
    pub fn new(ancestries: Vec<String>, genetic_map: GeneticMap) -> Self {
        Self {
            ancestries,
            genetic_map,
            ..Self::default()
        }
    }

    /// Append a SNP at a physical position
    pub fn add_snp(&mut self, pos: u32) -> SnpIdx {
        self.snp_positions.push(pos);
        SnpIdx::from(self.snp_positions.len() - 1)
    }

    /// Append a window anchored on `snp`, classified from `rf_start..=rf_end`
    pub fn add_window(&mut self, snp: SnpIdx, rf_start: SnpIdx, rf_end: SnpIdx) -> WindowIdx {
        self.windows.push((snp, rf_start, rf_end));
        WindowIdx::from(self.windows.len() - 1)
    }

    /// Append a sample with its two haplotypes' allele calls
    pub fn add_sample(
        &mut self,
        id: impl Into<String>,
        population: Population,
        alleles: [Vec<u8>; N_HAPS_PER_SAMPLE],
    ) -> SampleIdx {
        self.samples.push((id.into(), population, alleles));
        SampleIdx::from(self.samples.len() - 1)
    }

    /// Derive positions and assignments, allocate sample buffers and validate.
    pub fn build(self) -> Result<GenomeIndex> {
        let n_ancestries = self.ancestries.len();
        let map = &self.genetic_map;

        let mut windows = Vec::with_capacity(self.windows.len());
        for &(snp, rf_start, rf_end) in &self.windows {
            let pos = self.snp_positions.get(snp.as_usize()).ok_or_else(|| {
                AdmixError::invalid_data(format!(
                    "Window marker SNP {} does not exist",
                    snp.as_usize()
                ))
            })?;
            windows.push(CrfWindow::new(snp, rf_start, rf_end, map.gen_pos(*pos)));
        }

        let mut snps = Vec::with_capacity(self.snp_positions.len());
        let mut w = 0usize;
        for (i, &pos) in self.snp_positions.iter().enumerate() {
            while w + 1 < windows.len() && windows[w + 1].snp.as_usize() <= i {
                w += 1;
            }
            snps.push(Snp::new(pos, map.gen_pos(pos), WindowIdx::from(w)));
        }

        let n_windows = windows.len();
        let samples = self
            .samples
            .into_iter()
            .map(|(id, population, alleles)| {
                Sample::new(id, population, alleles, n_windows, n_ancestries)
            })
            .collect();

        GenomeIndex::new(
            self.ancestries,
            Snps::new(snps),
            Windows::new(windows),
            self.genetic_map,
            samples,
        )
    }
}
