//! # Configuration
//!
//! `Config` is the command-line surface an embedding binary exposes; it
//! validates user input and produces the immutable [`CrfParams`] the core
//! consumes. Nothing in the core reads `Config` directly.

use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::data::index::MAX_ANCESTRIES;
use crate::error::{AdmixError, Result};
use crate::model::classifier::FrequencyClassifier;
use crate::model::transition::SwitchRule;
use crate::utils::threading::default_thread_count;

/// Smallest accepted forest size
pub const MIN_TREES: u32 = 10;

/// Seed used when none is given
pub const DEFAULT_SEED: &str = "0xDEADBEEF";

/// Local-ancestry inference options
#[derive(Parser, Debug, Clone)]
#[command(
    name = "admixcrf",
    version,
    about = "Local ancestry inference with a conditional random field over genomic windows"
)]
pub struct Config {
    /// Number of EM rounds after the initial classification
    #[arg(short = 'e', long = "em-iterations", default_value_t = 0)]
    pub em_iterations: usize,

    /// Average number of generations since admixture
    #[arg(short = 'G', long = "generations", default_value_t = 8.0, allow_negative_numbers = true)]
    pub generations: f64,

    /// Where ancestry moves after a recombination between windows
    #[arg(long = "switch-rule", value_enum, default_value_t = SwitchRule::ToOther)]
    pub switch_rule: SwitchRule,

    /// Trees per window classifier
    #[arg(short = 't', long = "trees", default_value_t = 100)]
    pub n_trees: u32,

    /// Re-classify and re-smooth reference haplotypes during EM rounds
    #[arg(long = "reanalyze-reference")]
    pub reanalyze_reference: bool,

    /// Worker threads (default: all available CPUs)
    #[arg(long = "n-threads")]
    pub n_threads: Option<usize>,

    /// Random seed: decimal, 0x-prefixed hex, or "clock"
    #[arg(long = "random-seed", default_value = DEFAULT_SEED)]
    pub random_seed: String,

    /// Print span timings through tracing
    #[arg(long)]
    pub profile: bool,

    /// Report progress on stderr every N seconds (0 disables)
    #[arg(long = "heartbeat-secs", default_value_t = 0)]
    pub heartbeat_secs: u64,
}

impl Config {
    /// Parse command-line arguments and validate them
    pub fn parse_and_validate() -> Result<Self> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !self.generations.is_finite() || self.generations < 0.0 {
            return Err(AdmixError::config(format!(
                "Generations must be a finite value >= 0, got {}",
                self.generations
            )));
        }
        if self.n_trees < MIN_TREES {
            return Err(AdmixError::config(format!(
                "Number of trees must be at least {}, got {}",
                MIN_TREES, self.n_trees
            )));
        }
        parse_seed(&self.random_seed)?;
        Ok(())
    }

    /// Worker threads, clamped to at least 1
    pub fn nthreads(&self) -> usize {
        self.n_threads.unwrap_or_else(default_thread_count).max(1)
    }

    /// Resolved random seed
    pub fn seed(&self) -> Result<u64> {
        parse_seed(&self.random_seed)
    }

    /// Immutable parameters for an index with `n_ancestries` reference populations
    pub fn params(&self, n_ancestries: usize) -> Result<CrfParams> {
        self.validate()?;
        let params = CrfParams {
            n_ancestries,
            em_iterations: self.em_iterations,
            reanalyze_reference: self.reanalyze_reference,
            generations: self.generations,
            switch_rule: self.switch_rule,
            n_threads: self.nthreads(),
            seed: self.seed()?,
        };
        params.validate()?;
        Ok(params)
    }

    /// The built-in classifier configured with this forest size
    pub fn classifier(&self) -> FrequencyClassifier {
        FrequencyClassifier::new(self.n_trees)
    }
}

/// Parameters consumed by the iteration controller and the smoothing engine
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrfParams {
    /// Number of reference populations (K)
    pub n_ancestries: usize,
    /// Rounds after round 0
    pub em_iterations: usize,
    /// Re-analyze reference samples after round 0
    pub reanalyze_reference: bool,
    /// Average generations since admixture
    pub generations: f64,
    /// Transition rule after a recombination
    pub switch_rule: SwitchRule,
    /// Worker pool size
    pub n_threads: usize,
    /// Run seed for keyed random streams
    pub seed: u64,
}

impl CrfParams {
    /// Defaults for `n_ancestries` populations: no EM, 8 generations, one thread
    pub fn new(n_ancestries: usize) -> Self {
        Self {
            n_ancestries,
            em_iterations: 0,
            reanalyze_reference: false,
            generations: 8.0,
            switch_rule: SwitchRule::ToOther,
            n_threads: 1,
            seed: 0xDEAD_BEEF,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_ancestries < 2 || self.n_ancestries > MAX_ANCESTRIES {
            return Err(AdmixError::config(format!(
                "Number of reference populations must be in 2..={}, got {}",
                MAX_ANCESTRIES, self.n_ancestries
            )));
        }
        if self.n_threads == 0 {
            return Err(AdmixError::config("Thread count must be at least 1"));
        }
        if !self.generations.is_finite() || self.generations < 0.0 {
            return Err(AdmixError::config(format!(
                "Generations must be a finite value >= 0, got {}",
                self.generations
            )));
        }
        Ok(())
    }

    /// Total classifier rounds
    pub fn n_rounds(&self) -> usize {
        self.em_iterations + 1
    }
}

/// Parse a seed given as decimal, `0x` hex, or `clock`
pub fn parse_seed(s: &str) -> Result<u64> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("clock") {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AdmixError::config(format!("System clock before epoch: {}", e)))?
            .as_nanos();
        return Ok(nanos as u64);
    }
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    };
    parsed.map_err(|e| AdmixError::config(format!("Invalid random seed '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["admixcrf"]).unwrap();
        assert_eq!(config.em_iterations, 0);
        assert_eq!(config.generations, 8.0);
        assert_eq!(config.n_trees, 100);
        assert!(!config.reanalyze_reference);
        assert_eq!(config.switch_rule, SwitchRule::ToOther);
        assert_eq!(config.seed().unwrap(), 0xDEAD_BEEF);
        assert!(config.nthreads() >= 1);
        config.validate().unwrap();
    }

    #[test]
    fn test_short_flags() {
        let config = Config::try_parse_from([
            "admixcrf",
            "-e",
            "3",
            "-G",
            "12.5",
            "-t",
            "25",
            "--reanalyze-reference",
            "--n-threads",
            "0",
            "--random-seed",
            "1234",
            "--switch-rule",
            "redraw",
        ])
        .unwrap();
        let params = config.params(3).unwrap();
        assert_eq!(params.em_iterations, 3);
        assert_eq!(params.n_rounds(), 4);
        assert_eq!(params.generations, 12.5);
        assert!(params.reanalyze_reference);
        assert_eq!(params.n_threads, 1);
        assert_eq!(params.seed, 1234);
        assert_eq!(params.switch_rule, SwitchRule::Redraw);
        assert_eq!(config.classifier().n_trees(), 25);
    }

    #[test]
    fn test_validation_errors() {
        let config = Config::try_parse_from(["admixcrf", "-t", "5"]).unwrap();
        assert!(config.validate().is_err());

        let config = Config::try_parse_from(["admixcrf", "-G", "-1"]).unwrap();
        assert!(config.validate().is_err());

        let config = Config::try_parse_from(["admixcrf"]).unwrap();
        assert!(config.params(1).is_err());
    }

    #[test]
    fn test_parse_seed() {
        assert_eq!(parse_seed("0x10").unwrap(), 16);
        assert_eq!(parse_seed("0XfF").unwrap(), 255);
        assert_eq!(parse_seed("42").unwrap(), 42);
        assert!(parse_seed("clock").is_ok());
        assert!(parse_seed("banana").is_err());
    }

    #[test]
    fn test_params_validate() {
        let mut params = CrfParams::new(2);
        params.validate().unwrap();
        params.n_threads = 0;
        assert!(params.validate().is_err());
        assert!(CrfParams::new(1).validate().is_err());
    }
}
