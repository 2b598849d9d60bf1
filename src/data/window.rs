//! # CRF Windows
//!
//! The chromosome is cut into discrete chain positions ("windows"), each
//! anchored on one marker SNP. The classifier estimating ancestry at a window
//! may look at a wider, inclusive SNP range overlapping neighbouring windows:
//!
//! ```text
//!   snps:     0  1  2  3  4  5  6  7  8  9
//!   window 1:       [rf_start ... snp ... rf_end]
//!                    2        4         7
//! ```
//!
//! Windows are ordered by marker index and by genetic position; that order is
//! the chain order of the smoothing engine.

use serde::{Deserialize, Serialize};

use crate::data::snp::SnpIdx;

/// Zero-cost newtype for window (chain position) indices
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct WindowIdx(pub u32);

impl WindowIdx {
    pub fn new(idx: u32) -> Self {
        Self(idx)
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for WindowIdx {
    fn from(idx: usize) -> Self {
        Self(idx as u32)
    }
}

impl From<WindowIdx> for usize {
    fn from(idx: WindowIdx) -> usize {
        idx.0 as usize
    }
}

/// One chain position
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrfWindow {
    /// Representative marker
    pub snp: SnpIdx,
    /// First SNP (inclusive) used to classify this window
    pub rf_start: SnpIdx,
    /// Last SNP (inclusive) used to classify this window
    pub rf_end: SnpIdx,
    /// Genetic position (cM)
    pub genetic_pos: f64,
}

impl CrfWindow {
    pub fn new(snp: SnpIdx, rf_start: SnpIdx, rf_end: SnpIdx, genetic_pos: f64) -> Self {
        Self {
            snp,
            rf_start,
            rf_end,
            genetic_pos,
        }
    }

    /// SNP indices used for classification, as a `usize` range
    pub fn rf_range(&self) -> std::ops::RangeInclusive<usize> {
        self.rf_start.as_usize()..=self.rf_end.as_usize()
    }

    /// Number of SNPs in the classification range
    pub fn rf_len(&self) -> usize {
        (self.rf_end.as_usize() + 1).saturating_sub(self.rf_start.as_usize())
    }
}

/// Ordered window sequence
#[derive(Clone, Debug, Default)]
pub struct Windows {
    windows: Vec<CrfWindow>,
}

impl Windows {
    pub fn new(windows: Vec<CrfWindow>) -> Self {
        Self { windows }
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn get(&self, idx: WindowIdx) -> Option<&CrfWindow> {
        self.windows.get(idx.as_usize())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CrfWindow> {
        self.windows.iter()
    }

    pub fn as_slice(&self) -> &[CrfWindow] {
        &self.windows
    }

    /// Genetic distances (Morgans) between consecutive windows.
    ///
    /// Entry `w` is the distance from window `w - 1` to window `w`; entry 0 is 0.
    pub fn gen_dists_morgans(&self) -> Vec<f64> {
        std::iter::once(0.0)
            .chain(
                self.windows
                    .windows(2)
                    .map(|w| (w[1].genetic_pos - w[0].genetic_pos) / 100.0),
            )
            .take(self.windows.len())
            .collect()
    }
}

impl std::ops::Index<WindowIdx> for Windows {
    type Output = CrfWindow;

    fn index(&self, idx: WindowIdx) -> &CrfWindow {
        &self.windows[idx.as_usize()]
    }
}
