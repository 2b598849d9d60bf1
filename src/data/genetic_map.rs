//! # Genetic Map
//!
//! Physical-to-genetic position interpolation for one chromosome.
//!
//! The loader supplies the map as `(bp, cM)` points; this type only answers
//! lookups. Between points positions are interpolated linearly, beyond the
//! ends the nearest segment's rate is extrapolated, and an empty map falls
//! back to 1 cM per Mb.

use crate::error::{AdmixError, Result};

/// Default scale factor: 1 cM per Mb (1e-6 cM per bp)
pub const DEFAULT_SCALE_FACTOR: f64 = 1e-6;

/// Piecewise-linear genetic map for one chromosome
#[derive(Clone, Debug, Default)]
pub struct GeneticMap {
    /// Physical positions (bp), strictly ascending
    positions: Vec<u32>,

    /// Genetic positions (cM) corresponding to physical positions
    gen_positions: Vec<f64>,
}

impl GeneticMap {
    /// Build a map from `(bp, cM)` points.
    pub fn from_points(points: impl IntoIterator<Item = (u32, f64)>) -> Result<Self> {
        let (positions, gen_positions): (Vec<u32>, Vec<f64>) = points.into_iter().unzip();

        if let Some(i) = gen_positions.iter().position(|g| !g.is_finite()) {
            return Err(AdmixError::invalid_data(format!(
                "Genetic map position at {} bp is not finite",
                positions[i]
            )));
        }
        for i in 1..positions.len() {
            if positions[i] <= positions[i - 1] {
                return Err(AdmixError::invalid_data(format!(
                    "Genetic map positions not in ascending order at position {}",
                    positions[i]
                )));
            }
        }

        Ok(Self {
            positions,
            gen_positions,
        })
    }

    /// Number of map points
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Interpolate genetic position (cM) from physical position (bp)
    pub fn gen_pos(&self, phys_pos: u32) -> f64 {
        if self.positions.is_empty() {
            return phys_pos as f64 * DEFAULT_SCALE_FACTOR;
        }

        match self.positions.binary_search(&phys_pos) {
            Ok(idx) => self.gen_positions[idx],
            Err(0) => {
                let rate = self.segment_rate(0);
                self.gen_positions[0] - rate * (self.positions[0] - phys_pos) as f64
            }
            Err(idx) if idx == self.positions.len() => {
                let last = idx - 1;
                let rate = self.segment_rate(last.saturating_sub(1));
                self.gen_positions[last] + rate * (phys_pos - self.positions[last]) as f64
            }
            Err(idx) => {
                let p0 = self.positions[idx - 1] as f64;
                let p1 = self.positions[idx] as f64;
                let g0 = self.gen_positions[idx - 1];
                let g1 = self.gen_positions[idx];
                let t = (phys_pos as f64 - p0) / (p1 - p0);
                g0 + t * (g1 - g0)
            }
        }
    }

    /// Get genetic distance between two physical positions (cM)
    pub fn gen_dist(&self, pos1: u32, pos2: u32) -> f64 {
        (self.gen_pos(pos2) - self.gen_pos(pos1)).abs()
    }

    /// cM per bp of the segment starting at point `i`
    fn segment_rate(&self, i: usize) -> f64 {
        if i + 1 < self.positions.len() {
            (self.gen_positions[i + 1] - self.gen_positions[i])
                / (self.positions[i + 1] - self.positions[i]) as f64
        } else {
            DEFAULT_SCALE_FACTOR
        }
    }
}
