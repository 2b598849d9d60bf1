//! # SNP Table
//!
//! Ordered, read-only table of SNPs. Each SNP records its physical position,
//! its interpolated genetic position and the CRF window it is assigned to.

use serde::{Deserialize, Serialize};

use crate::data::window::WindowIdx;

/// Allele code for a missing call
pub const MISSING_ALLELE: u8 = 255;

/// Zero-cost newtype for SNP indices
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct SnpIdx(pub u32);

impl SnpIdx {
    pub fn new(idx: u32) -> Self {
        Self(idx)
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for SnpIdx {
    fn from(idx: usize) -> Self {
        Self(idx as u32)
    }
}

impl From<SnpIdx> for usize {
    fn from(idx: SnpIdx) -> usize {
        idx.0 as usize
    }
}

/// A single SNP
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snp {
    /// Physical position (bp)
    pub pos: u32,
    /// Genetic position (cM)
    pub genetic_pos: f64,
    /// Window this SNP belongs to
    pub window: WindowIdx,
}

impl Snp {
    pub fn new(pos: u32, genetic_pos: f64, window: WindowIdx) -> Self {
        Self {
            pos,
            genetic_pos,
            window,
        }
    }
}

/// Ordered SNP sequence
#[derive(Clone, Debug, Default)]
pub struct Snps {
    snps: Vec<Snp>,
}

impl Snps {
    pub fn new(snps: Vec<Snp>) -> Self {
        Self { snps }
    }

    pub fn len(&self) -> usize {
        self.snps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snps.is_empty()
    }

    pub fn get(&self, idx: SnpIdx) -> Option<&Snp> {
        self.snps.get(idx.as_usize())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Snp> {
        self.snps.iter()
    }

    pub fn as_slice(&self) -> &[Snp] {
        &self.snps
    }
}

impl std::ops::Index<SnpIdx> for Snps {
    type Output = Snp;

    fn index(&self, idx: SnpIdx) -> &Snp {
        &self.snps[idx.as_usize()]
    }
}
