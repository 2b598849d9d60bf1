//! # Sample and Haplotype Indices
//!
//! Zero-cost index newtypes for samples and their two haplotype copies.

use serde::{Deserialize, Serialize};

/// Number of haplotype copies carried by every sample
pub const N_HAPS_PER_SAMPLE: usize = 2;

/// Zero-cost newtype for sample indices
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct SampleIdx(pub u32);

impl SampleIdx {
    pub fn new(idx: u32) -> Self {
        Self(idx)
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Get the first haplotype index for this sample
    pub fn hap1(self) -> HapIdx {
        HapIdx::new(self.0 * 2)
    }

    /// Get the second haplotype index for this sample
    pub fn hap2(self) -> HapIdx {
        HapIdx::new(self.0 * 2 + 1)
    }
}

impl From<u32> for SampleIdx {
    fn from(idx: u32) -> Self {
        Self(idx)
    }
}

impl From<usize> for SampleIdx {
    fn from(idx: usize) -> Self {
        Self(idx as u32)
    }
}

impl From<SampleIdx> for usize {
    fn from(idx: SampleIdx) -> usize {
        idx.0 as usize
    }
}

/// Zero-cost newtype for global haplotype indices (`2 * sample + slot`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct HapIdx(pub u32);

impl HapIdx {
    pub fn new(idx: u32) -> Self {
        Self(idx)
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Get the sample index for this haplotype
    pub fn sample(self) -> SampleIdx {
        SampleIdx::new(self.0 / 2)
    }

    /// Slot of this haplotype within its sample (0 or 1)
    pub fn slot(self) -> usize {
        (self.0 % 2) as usize
    }

    /// Check if this is the first haplotype of the sample
    pub fn is_first(self) -> bool {
        self.0 % 2 == 0
    }

    /// Get the other haplotype for this sample
    pub fn other(self) -> HapIdx {
        if self.is_first() {
            HapIdx::new(self.0 + 1)
        } else {
            HapIdx::new(self.0 - 1)
        }
    }
}

impl From<u32> for HapIdx {
    fn from(idx: u32) -> Self {
        Self(idx)
    }
}

impl From<HapIdx> for usize {
    fn from(idx: HapIdx) -> usize {
        idx.0 as usize
    }
}
