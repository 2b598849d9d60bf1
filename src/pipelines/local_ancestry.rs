//! # Local Ancestry Pipeline
//!
//! Orchestrates the classify/smooth rounds over a populated genome index:
//! 1. Pin reference samples to their a-priori ancestry
//! 2. Round 0: classify query samples, smooth their estimates
//! 3. `em_iterations` further rounds: re-classify with the previous round's
//!    posteriors as training weights (and reference samples too when
//!    re-analysis is enabled), then re-smooth
//! 4. On the final round, decode the most-likely ancestry path
//!
//! Each stage is a full barrier. All parallel work runs inside a pool sized
//! from the parameters; the parallel unit is one sample.

use std::cell::RefCell;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, instrument};

use crate::config::{Config, CrfParams};
use crate::data::haplotype::{SampleIdx, N_HAPS_PER_SAMPLE};
use crate::data::index::GenomeIndex;
use crate::data::sample::Sample;
use crate::error::{AdmixError, Result};
use crate::model::classifier::{AncestryClassifier, RoundContext};
use crate::model::crf::SmoothingEngine;
use crate::model::transition::TransitionModel;
use crate::utils::logging::init_profiling;
use crate::utils::telemetry::{HeartbeatConfig, HeartbeatHandle, Stage, TelemetryBlackboard};
use crate::utils::threading::build_thread_pool;
use crate::utils::workspace::CrfWorkspace;

thread_local! {
    static THREAD_WORKSPACE: RefCell<Option<CrfWorkspace>> = const { RefCell::new(None) };
}

/// What a run did
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Classifier rounds executed
    pub rounds: usize,
    /// Per round: summed chain log-likelihood over smoothed haplotypes
    pub log_likelihood: Vec<f64>,
}

/// Classify/smooth controller, generic over the classifier
pub struct LocalAncestryPipeline<C: AncestryClassifier> {
    params: CrfParams,
    classifier: C,
    telemetry: Option<Arc<TelemetryBlackboard>>,
}

impl<C: AncestryClassifier> LocalAncestryPipeline<C> {
    pub fn new(params: CrfParams, classifier: C) -> Self {
        Self {
            params,
            classifier,
            telemetry: None,
        }
    }

    /// Report progress to a shared blackboard
    pub fn with_telemetry(mut self, telemetry: Arc<TelemetryBlackboard>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn params(&self) -> &CrfParams {
        &self.params
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Run every round, leaving posteriors and labels in the index.
    ///
    /// Fails before any computation if the parameters are invalid or do not
    /// match the index. Any worker error aborts the run.
    #[instrument(skip_all, fields(n_samples = index.n_samples(), n_windows = index.n_windows()))]
    pub fn run(&self, index: &mut GenomeIndex) -> Result<RunSummary> {
        self.params.validate()?;
        if index.n_ancestries() != self.params.n_ancestries {
            return Err(AdmixError::config(format!(
                "Index has {} reference populations, parameters expect {}",
                index.n_ancestries(),
                self.params.n_ancestries
            )));
        }

        let engine = self.engine(index)?;
        let pool = build_thread_pool(self.params.n_threads)?;
        let n_rounds = self.params.n_rounds();

        if let Some(t) = &self.telemetry {
            t.set_stage(Stage::Initializing);
            t.set_total_samples(index.n_samples() as u64);
        }
        info!(
            n_rounds,
            n_threads = self.params.n_threads,
            generations = self.params.generations,
            switch_rule = ?self.params.switch_rule,
            "Starting local ancestry inference"
        );

        {
            let (_, samples) = index.parts_mut();
            samples.iter_mut().for_each(Sample::pin_to_population);
        }

        let mut log_likelihood = Vec::with_capacity(n_rounds);
        for round in 0..n_rounds {
            let ctx = RoundContext::new(
                round,
                round > 0 && self.params.reanalyze_reference,
                self.params.seed,
            );
            let decode = round + 1 == n_rounds;
            if let Some(t) = &self.telemetry {
                t.start_round(round as u64, n_rounds as u64);
            }

            let ll = info_span!("round", round).in_scope(|| -> Result<f64> {
                if let Some(t) = &self.telemetry {
                    t.set_stage(Stage::Classifying);
                }
                info_span!("classify")
                    .in_scope(|| pool.install(|| self.classifier.classify(index, &ctx)))?;

                if let Some(t) = &self.telemetry {
                    t.set_stage(Stage::Smoothing);
                    t.reset_samples();
                }
                info_span!("smooth")
                    .in_scope(|| pool.install(|| self.smooth_round(&engine, index, &ctx, decode)))
            })?;

            debug!(round, log_likelihood = ll, decode, "Round complete");
            log_likelihood.push(ll);
        }

        if let Some(t) = &self.telemetry {
            t.set_stage(Stage::Complete);
        }
        Ok(RunSummary {
            rounds: n_rounds,
            log_likelihood,
        })
    }

    /// Expected stay-in-state probability across each window boundary for
    /// one haplotype, from its current classifier estimates
    pub fn stay_in_state(&self, index: &GenomeIndex, sample: SampleIdx, slot: usize) -> Result<Vec<f64>> {
        if slot >= N_HAPS_PER_SAMPLE || sample.as_usize() >= index.n_samples() {
            return Err(AdmixError::invalid_data(format!(
                "No haplotype {} of sample {}",
                slot,
                sample.as_usize()
            )));
        }
        let engine = self.engine(index)?;
        let mut out = Vec::new();
        let mut ws = CrfWorkspace::new(engine.n_windows(), engine.n_ancestries());
        engine.stay_in_state(index.sample(sample).estimates(slot), &mut out, &mut ws)?;
        Ok(out)
    }

    fn engine(&self, index: &GenomeIndex) -> Result<SmoothingEngine> {
        let transition = TransitionModel::new(self.params.generations, index.n_ancestries())?
            .with_rule(self.params.switch_rule);
        Ok(SmoothingEngine::new(index.windows(), transition))
    }

    /// Smooth every targeted sample; returns the summed log-likelihood
    fn smooth_round(
        &self,
        engine: &SmoothingEngine,
        index: &mut GenomeIndex,
        ctx: &RoundContext,
        decode: bool,
    ) -> Result<f64> {
        let telemetry = self.telemetry.as_deref();
        let (_, samples) = index.parts_mut();

        let per_sample = samples
            .par_iter_mut()
            .map(|sample| -> Result<f64> {
                if !ctx.is_target(sample.population()) {
                    return Ok(0.0);
                }
                let ll = THREAD_WORKSPACE.with(|cell| -> Result<f64> {
                    let mut guard = cell.borrow_mut();
                    let ws = guard.get_or_insert_with(|| {
                        CrfWorkspace::new(engine.n_windows(), engine.n_ancestries())
                    });
                    let mut total = 0.0;
                    for slot in 0..N_HAPS_PER_SAMPLE {
                        let (estimates, posterior, labels) = sample.smoothing_buffers_mut(slot);
                        total += engine.smooth_haplotype(
                            estimates,
                            posterior,
                            decode.then_some(labels),
                            ws,
                        )?;
                    }
                    Ok(total)
                })?;
                if let Some(t) = telemetry {
                    t.add_samples(1);
                }
                Ok(ll)
            })
            .collect::<Result<Vec<f64>>>()?;

        Ok(per_sample.iter().sum())
    }
}

/// Run the built-in classifier pipeline as configured on the command line:
/// optional span profiling and heartbeat, parameters sized to the index.
pub fn run_from_config(config: &Config, index: &mut GenomeIndex) -> Result<RunSummary> {
    if config.profile && init_profiling() {
        eprintln!("=== Profiling enabled ===");
    }
    let params = config.params(index.n_ancestries())?;

    let telemetry = TelemetryBlackboard::new();
    let heartbeat = if config.heartbeat_secs > 0 {
        Some(HeartbeatHandle::spawn(
            telemetry.clone(),
            HeartbeatConfig {
                interval_secs: config.heartbeat_secs,
                ..HeartbeatConfig::default()
            },
        )?)
    } else {
        None
    };

    let pipeline = LocalAncestryPipeline::new(params, config.classifier()).with_telemetry(telemetry);
    let result = pipeline.run(index);

    if let Some(hb) = heartbeat {
        hb.shutdown();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::genetic_map::GeneticMap;
    use crate::data::index::GenomeIndexBuilder;
    use crate::data::sample::Population;
    use crate::data::snp::SnpIdx;
    use crate::model::classifier::FrequencyClassifier;

    fn small_index(n_ancestries: usize) -> GenomeIndex {
        let names = (0..n_ancestries).map(|k| format!("P{}", k)).collect();
        let map = GeneticMap::from_points([(0, 0.0), (1_000_000, 5.0)]).unwrap();
        let mut b = GenomeIndexBuilder::new(names, map);
        for i in 0..12 {
            b.add_snp(i * 80_000);
        }
        for w in 0..4u32 {
            b.add_window(SnpIdx::new(w * 3 + 1), SnpIdx::new(w * 3), SnpIdx::new(w * 3 + 2));
        }
        for k in 0..n_ancestries as u8 {
            let alleles = vec![k % 2; 12];
            b.add_sample(format!("R{}", k), Population::Reference(k), [alleles.clone(), alleles]);
        }
        b.add_sample("Q", Population::Query, [vec![0; 12], vec![1; 12]]);
        b.build().unwrap()
    }

    #[test]
    fn test_rejects_ancestry_mismatch() {
        let mut index = small_index(2);
        let pipeline = LocalAncestryPipeline::new(CrfParams::new(3), FrequencyClassifier::new(10));
        let err = pipeline.run(&mut index).unwrap_err();
        assert!(matches!(err, AdmixError::Config { .. }));
    }

    #[test]
    fn test_run_reports_rounds() {
        let mut index = small_index(2);
        let mut params = CrfParams::new(2);
        params.em_iterations = 2;
        let telemetry = TelemetryBlackboard::new();
        let pipeline = LocalAncestryPipeline::new(params, FrequencyClassifier::new(10))
            .with_telemetry(telemetry.clone());

        let summary = pipeline.run(&mut index).unwrap();
        assert_eq!(summary.rounds, 3);
        assert_eq!(summary.log_likelihood.len(), 3);
        assert!(summary.log_likelihood.iter().all(|ll| ll.is_finite()));
        assert_eq!(telemetry.stage(), Stage::Complete);
        assert_eq!(telemetry.current_round(), 3);
        // Only the query is smoothed without re-analysis
        assert_eq!(telemetry.samples_processed(), 1);

        let q = index.sample_by_id("Q").unwrap();
        assert!(q.labels(0).iter().all(|&l| l == 0));
        assert!(q.labels(1).iter().all(|&l| l == 1));
    }

    #[test]
    fn test_run_from_config() {
        use clap::Parser;

        let mut index = small_index(2);
        let config = Config::try_parse_from(["admixcrf", "-e", "1", "-t", "10", "--n-threads", "2"]).unwrap();
        let summary = run_from_config(&config, &mut index).unwrap();
        assert_eq!(summary.rounds, 2);

        let bad = Config::try_parse_from(["admixcrf", "-t", "3"]).unwrap();
        assert!(run_from_config(&bad, &mut index).is_err());
    }

    #[test]
    fn test_stay_in_state_bounds() {
        let mut index = small_index(2);
        let pipeline = LocalAncestryPipeline::new(CrfParams::new(2), FrequencyClassifier::new(10));
        pipeline.run(&mut index).unwrap();
        let q = index.index_of("Q").unwrap();
        let stay = pipeline.stay_in_state(&index, q, 0).unwrap();
        assert_eq!(stay.len(), 3);
        assert!(stay.iter().all(|&s| s > 0.5 && s <= 1.0 + 1e-12));
        assert!(pipeline.stay_in_state(&index, q, 2).is_err());
    }
}
