//! # Recombination Transition Model
//!
//! Ancestry along a haplotype changes only where a recombination separates
//! two windows. With `d` the genetic distance (Morgans) between adjacent
//! windows and `g` the average number of generations since admixture, the
//! probability of a switch is
//!
//! ```text
//! ρ(d) = 1 - exp(-d * g)
//! ```
//!
//! [`SwitchRule::ToOther`] (the default) spreads that mass uniformly over the
//! other K-1 ancestries:
//!
//! ```text
//! P(stay)                = exp(-d * g)
//! P(move to specific j)  = (1 - exp(-d * g)) / (K - 1)
//! ```
//!
//! [`SwitchRule::Redraw`] instead redraws the ancestry from all K, so a
//! recombination may land back on the same ancestry:
//!
//! ```text
//! P(stay)                = exp(-d * g) + ρ / K
//! P(move to specific j)  = ρ / K
//! ```
//!
//! Both tend to stay = 1 as `d → 0`. As `d·g → ∞` the default tends to
//! stay = 0 while `Redraw` tends to the uniform 1/K.
//!
//! Either way the matrix is `switch` everywhere plus `stay - switch` on the
//! diagonal, which is all the O(K) updates in the engine need.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::data::window::Windows;
use crate::error::{AdmixError, Result};

/// Where the ancestry goes after a recombination
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum SwitchRule {
    /// Uniformly to one of the other K-1 ancestries
    #[default]
    ToOther,
    /// Uniformly to any of the K ancestries, including the current one
    Redraw,
}

/// Stay and per-target switch probability across one window boundary
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionStep {
    pub stay: f64,
    pub switch: f64,
}

impl TransitionStep {
    /// No recombination possible
    pub const IDENTITY: Self = Self {
        stay: 1.0,
        switch: 0.0,
    };
}

/// Transition probabilities between adjacent windows
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionModel {
    generations: f64,
    n_ancestries: usize,
    rule: SwitchRule,
}

impl TransitionModel {
    /// Create a model for `n_ancestries` states with the default switch rule.
    ///
    /// A single ancestry leaves nothing to smooth and is rejected, as are
    /// negative or non-finite generation counts.
    pub fn new(generations: f64, n_ancestries: usize) -> Result<Self> {
        if n_ancestries < 2 {
            return Err(AdmixError::config(format!(
                "Smoothing needs at least 2 reference populations, got {}",
                n_ancestries
            )));
        }
        if !generations.is_finite() || generations < 0.0 {
            return Err(AdmixError::config(format!(
                "Generations since admixture must be a finite value >= 0, got {}",
                generations
            )));
        }
        Ok(Self {
            generations,
            n_ancestries,
            rule: SwitchRule::default(),
        })
    }

    pub fn with_rule(mut self, rule: SwitchRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn generations(&self) -> f64 {
        self.generations
    }

    pub fn n_ancestries(&self) -> usize {
        self.n_ancestries
    }

    pub fn rule(&self) -> SwitchRule {
        self.rule
    }

    /// Probability of a recombination over `gen_dist` Morgans
    #[inline]
    pub fn p_recomb(&self, gen_dist: f64) -> f64 {
        -f64::exp_m1(-gen_dist.max(0.0) * self.generations)
    }

    /// Stay and switch probabilities over `gen_dist` Morgans
    #[inline]
    pub fn step(&self, gen_dist: f64) -> TransitionStep {
        let p = self.p_recomb(gen_dist);
        match self.rule {
            SwitchRule::ToOther => TransitionStep {
                stay: 1.0 - p,
                switch: p / (self.n_ancestries - 1) as f64,
            },
            SwitchRule::Redraw => {
                let switch = p / self.n_ancestries as f64;
                TransitionStep {
                    stay: (1.0 - p) + switch,
                    switch,
                }
            }
        }
    }

    /// Probability of keeping the same ancestry over `gen_dist` Morgans
    #[inline]
    pub fn stay_prob(&self, gen_dist: f64) -> f64 {
        self.step(gen_dist).stay
    }

    /// Probability of moving to one specific other ancestry over `gen_dist` Morgans
    #[inline]
    pub fn switch_prob(&self, gen_dist: f64) -> f64 {
        self.step(gen_dist).switch
    }

    /// Transition into each window from its predecessor.
    ///
    /// Entry 0 is the identity; the chain has no predecessor there.
    pub fn steps(&self, windows: &Windows) -> Vec<TransitionStep> {
        windows
            .gen_dists_morgans()
            .into_iter()
            .enumerate()
            .map(|(w, d)| if w == 0 { TransitionStep::IDENTITY } else { self.step(d) })
            .collect()
    }
}
