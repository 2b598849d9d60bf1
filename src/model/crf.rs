//! # Linear-Chain Smoothing Engine
//!
//! Turns noisy per-window classifier estimates into posterior ancestry
//! probabilities and a most-likely ancestry path for one haplotype.
//!
//! ## Chain
//! - States: the K ancestries
//! - Emissions: decoded classifier estimates, renormalized per window
//! - Transitions: [`TransitionModel`], uniform prior at window 0
//!
//! ## Recursions
//! Forward and backward values are renormalized at every window. The
//! transition matrix is `switch` off the diagonal and `stay` on it, so both
//! updates reduce to a scale and a shift per state:
//!
//! ```text
//! fwd[k] = emit[k] * ((stay - switch) * fwd[k] / Σfwd + switch)
//! bwd[k] = (stay - switch) * emit[k] * bwd[k] / Σ(emit * bwd) + switch
//! ```
//!
//! Viterbi uses the same structure: the best predecessor of state `j` is
//! either `j` itself or the best other state, so each window costs O(K).

use crate::data::codec::{LogOddsCodec, Logit16, Logit8};
use crate::data::matrix::AncestryMatrix;
use crate::data::window::Windows;
use crate::error::{AdmixError, Result};
use crate::model::transition::{TransitionModel, TransitionStep};
use crate::utils::workspace::CrfWorkspace;

/// Static update kernels shared by the forward and backward passes
pub struct CrfUpdater;

impl CrfUpdater {
    /// Forward update in place.
    ///
    /// `fwd` holds the previous window's values summing to `fwd_sum`. Returns
    /// the sum of the updated values.
    #[inline]
    pub fn fwd_update(fwd: &mut [f64], fwd_sum: f64, step: TransitionStep, emit: &[f64]) -> f64 {
        let shift = step.switch;
        let scale = (step.stay - step.switch) / fwd_sum;

        let mut sum = 0.0;
        for (f, &e) in fwd.iter_mut().zip(emit) {
            *f = e * (scale * *f + shift);
            sum += *f;
        }
        sum
    }

    /// Backward update in place.
    ///
    /// `bwd` holds the next window's values, `emit` the next window's
    /// emissions. The result sums to 1.
    #[inline]
    pub fn bwd_update(bwd: &mut [f64], step: TransitionStep, emit: &[f64]) {
        let mut sum = 0.0;
        for (b, &e) in bwd.iter_mut().zip(emit) {
            *b *= e;
            sum += *b;
        }

        let shift = step.switch;
        let scale = (step.stay - step.switch) / sum;
        for b in bwd.iter_mut() {
            *b = scale * *b + shift;
        }
    }
}

/// Forward-backward and Viterbi over the window chain.
///
/// Immutable once built; share one engine across worker threads and give
/// each thread its own [`CrfWorkspace`].
#[derive(Clone, Debug)]
pub struct SmoothingEngine {
    transition: TransitionModel,
    /// Transition into window `w` from `w - 1`
    steps: Vec<TransitionStep>,
}

impl SmoothingEngine {
    pub fn new(windows: &Windows, transition: TransitionModel) -> Self {
        Self {
            steps: transition.steps(windows),
            transition,
        }
    }

    pub fn n_windows(&self) -> usize {
        self.steps.len()
    }

    pub fn n_ancestries(&self) -> usize {
        self.transition.n_ancestries()
    }

    pub fn transition(&self) -> &TransitionModel {
        &self.transition
    }

    pub fn steps(&self) -> &[TransitionStep] {
        &self.steps
    }

    /// Posterior ancestry probabilities for one haplotype.
    ///
    /// Writes `Logit16` codes into `posterior` and returns the chain's
    /// log-likelihood (up to the constant factors of emission renormalization).
    /// An empty chain is a no-op.
    pub fn forward_backward(
        &self,
        estimates: &AncestryMatrix<i8>,
        posterior: &mut AncestryMatrix<i16>,
        ws: &mut CrfWorkspace,
    ) -> Result<f64> {
        self.check_shape(estimates.n_windows(), estimates.n_ancestries())?;
        self.check_shape(posterior.n_windows(), posterior.n_ancestries())?;
        let n_windows = self.n_windows();
        if n_windows == 0 {
            return Ok(0.0);
        }
        let k = self.n_ancestries();

        self.load_emissions(estimates, ws)?;
        let log_lik = self.forward(ws, k);

        ws.bwd.fill(1.0 / k as f64);
        for w in (0..n_windows).rev() {
            if w + 1 < n_windows {
                let next = (w + 1) * k..(w + 2) * k;
                CrfUpdater::bwd_update(&mut ws.bwd, self.steps[w + 1], &ws.emit[next]);
            }

            let fwd = &ws.fwd[w * k..(w + 1) * k];
            let total: f64 = fwd.iter().zip(&ws.bwd).map(|(f, b)| f * b).sum();
            if !(total > 0.0 && total.is_finite()) {
                return Err(AdmixError::algorithm(format!(
                    "Posterior underflow at window {}",
                    w
                )));
            }
            let out = &mut posterior.as_mut_slice()[w * k..(w + 1) * k];
            for ((o, f), b) in out.iter_mut().zip(fwd).zip(&ws.bwd) {
                *o = Logit16::encode(f * b / total);
            }
        }

        Ok(log_lik)
    }

    /// Most-likely ancestry path for one haplotype.
    ///
    /// Ties prefer staying in the current ancestry, then the lowest index.
    pub fn viterbi(
        &self,
        estimates: &AncestryMatrix<i8>,
        labels: &mut [u8],
        ws: &mut CrfWorkspace,
    ) -> Result<()> {
        self.check_shape(estimates.n_windows(), estimates.n_ancestries())?;
        if labels.len() != self.n_windows() {
            return Err(AdmixError::invalid_data(format!(
                "Label buffer has {} windows, chain has {}",
                labels.len(),
                self.n_windows()
            )));
        }
        let n_windows = self.n_windows();
        if n_windows == 0 {
            return Ok(());
        }
        let k = self.n_ancestries();

        self.load_emissions(estimates, ws)?;
        ws.delta.copy_from_slice(&ws.emit[0..k]);

        for w in 1..n_windows {
            let TransitionStep { stay, switch } = self.steps[w];
            let (best, second) = top_two(&ws.delta);
            let emit = &ws.emit[w * k..(w + 1) * k];
            let backptr = &mut ws.backptr[w * k..(w + 1) * k];

            let mut max = 0.0f64;
            for j in 0..k {
                let other = if j == best { second } else { best };
                let stay_score = ws.delta[j] * stay;
                let switch_score = ws.delta[other] * switch;
                let (score, from) = if stay_score >= switch_score {
                    (stay_score, j)
                } else {
                    (switch_score, other)
                };
                ws.delta_next[j] = score * emit[j];
                backptr[j] = from as u8;
                max = max.max(ws.delta_next[j]);
            }

            if !(max > 0.0 && max.is_finite()) {
                return Err(AdmixError::algorithm(format!(
                    "Viterbi underflow at window {}",
                    w
                )));
            }
            for d in ws.delta_next.iter_mut() {
                *d /= max;
            }
            std::mem::swap(&mut ws.delta, &mut ws.delta_next);
        }

        let mut state = argmax(&ws.delta);
        labels[n_windows - 1] = state as u8;
        for w in (1..n_windows).rev() {
            state = ws.backptr[w * k + state] as usize;
            labels[w - 1] = state as u8;
        }
        Ok(())
    }

    /// Expected probability of keeping the same ancestry across each window
    /// boundary: entry `w` covers the step from window `w` to `w + 1`.
    ///
    /// Low values mark likely ancestry switch points.
    pub fn stay_in_state(
        &self,
        estimates: &AncestryMatrix<i8>,
        out: &mut Vec<f64>,
        ws: &mut CrfWorkspace,
    ) -> Result<()> {
        self.check_shape(estimates.n_windows(), estimates.n_ancestries())?;
        out.clear();
        let n_windows = self.n_windows();
        if n_windows < 2 {
            return Ok(());
        }
        let k = self.n_ancestries();
        out.resize(n_windows - 1, 0.0);

        self.load_emissions(estimates, ws)?;
        self.forward(ws, k);

        ws.bwd.fill(1.0 / k as f64);
        for w in (0..n_windows - 1).rev() {
            let step = self.steps[w + 1];
            let TransitionStep { stay, switch } = step;
            let fwd = &ws.fwd[w * k..(w + 1) * k];
            let emit = &ws.emit[(w + 1) * k..(w + 2) * k];

            // ξ(i, j) ∝ fwd[i] T(i, j) emit[j] bwd[j]; fwd sums to 1
            let mut diag = 0.0;
            let mut eb_sum = 0.0;
            for j in 0..k {
                let eb = emit[j] * ws.bwd[j];
                diag += fwd[j] * eb;
                eb_sum += eb;
            }
            let total = (stay - switch) * diag + switch * eb_sum;
            if !(total > 0.0 && total.is_finite()) {
                return Err(AdmixError::algorithm(format!(
                    "Transition posterior underflow at window {}",
                    w
                )));
            }
            out[w] = stay * diag / total;

            CrfUpdater::bwd_update(&mut ws.bwd, step, emit);
        }
        Ok(())
    }

    /// Posterior and, when `labels` is given, the Viterbi path
    pub fn smooth_haplotype(
        &self,
        estimates: &AncestryMatrix<i8>,
        posterior: &mut AncestryMatrix<i16>,
        labels: Option<&mut [u8]>,
        ws: &mut CrfWorkspace,
    ) -> Result<f64> {
        let log_lik = self.forward_backward(estimates, posterior, ws)?;
        if let Some(labels) = labels {
            self.viterbi(estimates, labels, ws)?;
        }
        Ok(log_lik)
    }

    fn check_shape(&self, n_windows: usize, n_ancestries: usize) -> Result<()> {
        if n_windows != self.n_windows() || n_ancestries != self.n_ancestries() {
            return Err(AdmixError::invalid_data(format!(
                "Buffer is {}x{}, chain is {}x{}",
                n_windows,
                n_ancestries,
                self.n_windows(),
                self.n_ancestries()
            )));
        }
        Ok(())
    }

    /// Decode and renormalize every estimate row into `ws.emit`
    fn load_emissions(&self, estimates: &AncestryMatrix<i8>, ws: &mut CrfWorkspace) -> Result<()> {
        let k = self.n_ancestries();
        ws.ensure(self.n_windows(), k);

        for (w, (row, emit)) in estimates
            .rows()
            .zip(ws.emit.chunks_exact_mut(k))
            .enumerate()
        {
            let mut sum = 0.0;
            for (e, &code) in emit.iter_mut().zip(row) {
                *e = Logit8::decode(code);
                sum += *e;
            }
            if !(sum > 0.0 && sum.is_finite()) {
                return Err(AdmixError::algorithm(format!(
                    "Classifier estimates at window {} sum to {}",
                    w, sum
                )));
            }
            for e in emit.iter_mut() {
                *e /= sum;
            }
        }
        Ok(())
    }

    /// Fill `ws.fwd` with normalized forward values; returns the log-likelihood
    fn forward(&self, ws: &mut CrfWorkspace, k: usize) -> f64 {
        let n_windows = self.n_windows();
        let prior = 1.0 / k as f64;

        let mut sum = 0.0;
        for (f, &e) in ws.fwd[..k].iter_mut().zip(&ws.emit[..k]) {
            *f = prior * e;
            sum += *f;
        }
        let mut log_lik = sum.ln();
        ws.fwd[..k].iter_mut().for_each(|f| *f /= sum);

        for w in 1..n_windows {
            let (prev, cur) = ws.fwd.split_at_mut(w * k);
            let cur = &mut cur[..k];
            cur.copy_from_slice(&prev[(w - 1) * k..]);
            let sum = CrfUpdater::fwd_update(cur, 1.0, self.steps[w], &ws.emit[w * k..(w + 1) * k]);
            log_lik += sum.ln();
            cur.iter_mut().for_each(|f| *f /= sum);
        }
        log_lik
    }
}

/// Index of the largest value; the lowest index wins ties
#[inline]
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Indices of the largest and second-largest values, lowest index first on ties
#[inline]
fn top_two(values: &[f64]) -> (usize, usize) {
    let best = argmax(values);
    let mut second = if best == 0 { 1 } else { 0 };
    for (i, &v) in values.iter().enumerate() {
        if i != best && v > values[second] {
            second = i;
        }
    }
    (best, second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::snp::SnpIdx;
    use crate::data::window::{CrfWindow, WindowIdx};
    use crate::model::transition::SwitchRule;

    fn windows_at(cm: &[f64]) -> Windows {
        Windows::new(
            cm.iter()
                .enumerate()
                .map(|(i, &g)| {
                    let s = SnpIdx::new(i as u32);
                    CrfWindow::new(s, s, s, g)
                })
                .collect(),
        )
    }

    fn estimates_from<R: AsRef<[f64]>>(rows: &[R]) -> AncestryMatrix<i8> {
        let mut m = AncestryMatrix::new(rows.len(), rows[0].as_ref().len());
        for (w, row) in rows.iter().enumerate() {
            for (k, &p) in row.as_ref().iter().enumerate() {
                *m.get_mut(w, k) = Logit8::encode(p);
            }
        }
        m
    }

    /// Dense O(W K^2) forward-backward without rescaling. `trans(w, i, j)` is
    /// the transition into window `w`; emissions decode the narrow codes by hand.
    fn dense_posterior(
        est: &AncestryMatrix<i8>,
        trans: impl Fn(usize, usize, usize) -> f64,
    ) -> Vec<Vec<f64>> {
        let n = est.n_windows();
        let k = est.n_ancestries();
        let emit: Vec<Vec<f64>> = est
            .rows()
            .map(|r| {
                let v: Vec<f64> = r
                    .iter()
                    .map(|&c| 1.0 / (1.0 + (-(c as f64) / 12.0).exp()))
                    .collect();
                let s: f64 = v.iter().sum();
                v.into_iter().map(|x| x / s).collect()
            })
            .collect();

        let mut alpha = vec![vec![0.0; k]; n];
        for j in 0..k {
            alpha[0][j] = emit[0][j] / k as f64;
        }
        for w in 1..n {
            for j in 0..k {
                let s: f64 = (0..k).map(|i| alpha[w - 1][i] * trans(w, i, j)).sum();
                alpha[w][j] = s * emit[w][j];
            }
        }
        let mut beta = vec![vec![1.0; k]; n];
        for w in (0..n - 1).rev() {
            for i in 0..k {
                beta[w][i] = (0..k)
                    .map(|j| trans(w + 1, i, j) * emit[w + 1][j] * beta[w + 1][j])
                    .sum();
            }
        }
        (0..n)
            .map(|w| {
                let g: Vec<f64> = (0..k).map(|j| alpha[w][j] * beta[w][j]).collect();
                let s: f64 = g.iter().sum();
                g.into_iter().map(|x| x / s).collect()
            })
            .collect()
    }

    /// Windows at 0, 1, 3, 8 and 18 cM with K = 3
    const SCENARIO_CM: [f64; 5] = [0.0, 1.0, 3.0, 8.0, 18.0];
    /// The same spacing in Morgans, into windows 1..5
    const SCENARIO_MORGANS: [f64; 4] = [0.01, 0.02, 0.05, 0.1];

    fn scenario_estimates() -> AncestryMatrix<i8> {
        estimates_from(&[
            &[0.7, 0.2, 0.1],
            &[0.6, 0.3, 0.1],
            &[0.2, 0.5, 0.3],
            &[0.1, 0.8, 0.1],
            &[0.3, 0.3, 0.4],
        ])
    }

    fn assert_posterior_close(post: &AncestryMatrix<i16>, expected: &[Vec<f64>]) {
        for (w, exp_row) in expected.iter().enumerate() {
            let row = post.row(WindowIdx::new(w as u32));
            let sum: f64 = row.iter().map(|&c| Logit16::decode(c)).sum();
            assert!((sum - 1.0).abs() < 1e-3, "window {} sums to {}", w, sum);
            for (k, &want) in exp_row.iter().enumerate() {
                let got = Logit16::decode(row[k]);
                assert!(
                    (got - want).abs() < 1e-3,
                    "window {} ancestry {}: {} vs {}",
                    w,
                    k,
                    got,
                    want
                );
            }
        }
    }

    #[test]
    fn test_updater_bwd_normalizes() {
        let mut bwd = vec![0.25; 4];
        let step = TransitionStep {
            stay: 0.97,
            switch: 0.01,
        };
        CrfUpdater::bwd_update(&mut bwd, step, &[0.7, 0.1, 0.1, 0.1]);
        let sum: f64 = bwd.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(bwd[0] > bwd[1]);
    }

    #[test]
    fn test_updater_fwd_matches_dense_product() {
        let step = TransitionStep {
            stay: 0.91,
            switch: 0.03,
        };
        let prev = [0.5, 0.2, 0.2, 0.1];
        let emit = [0.7, 0.1, 0.1, 0.1];
        let mut fwd = prev.to_vec();
        let sum = CrfUpdater::fwd_update(&mut fwd, 1.0, step, &emit);

        for j in 0..4 {
            let dense: f64 = (0..4)
                .map(|i| prev[i] * if i == j { 0.91 } else { 0.03 })
                .sum::<f64>()
                * emit[j];
            assert!((fwd[j] - dense).abs() < 1e-12);
        }
        let direct: f64 = fwd.iter().sum();
        assert!((sum - direct).abs() < 1e-12);
    }

    #[test]
    fn test_matches_dense_reference() {
        let g = 8.0;
        let engine = SmoothingEngine::new(
            &windows_at(&SCENARIO_CM),
            TransitionModel::new(g, 3).unwrap(),
        );
        let est = scenario_estimates();

        let mut post = AncestryMatrix::new(5, 3);
        let mut ws = CrfWorkspace::default();
        engine.forward_backward(&est, &mut post, &mut ws).unwrap();

        let expected = dense_posterior(&est, |w, i, j| {
            let stay = (-SCENARIO_MORGANS[w - 1] * g).exp();
            if i == j {
                stay
            } else {
                (1.0 - stay) / 2.0
            }
        });
        assert_posterior_close(&post, &expected);
    }

    #[test]
    fn test_redraw_rule_matches_dense_reference() {
        let g = 8.0;
        let model = TransitionModel::new(g, 3)
            .unwrap()
            .with_rule(SwitchRule::Redraw);
        let engine = SmoothingEngine::new(&windows_at(&SCENARIO_CM), model);
        let est = scenario_estimates();

        let mut post = AncestryMatrix::new(5, 3);
        engine
            .forward_backward(&est, &mut post, &mut CrfWorkspace::default())
            .unwrap();

        let expected = dense_posterior(&est, |w, i, j| {
            let e = (-SCENARIO_MORGANS[w - 1] * g).exp();
            let redraw = (1.0 - e) / 3.0;
            if i == j {
                e + redraw
            } else {
                redraw
            }
        });
        assert_posterior_close(&post, &expected);
    }

    #[test]
    fn test_two_segment_path() {
        let cm: Vec<f64> = (0..20).map(|i| i as f64 * 0.5).collect();
        let windows = windows_at(&cm);
        let engine = SmoothingEngine::new(&windows, TransitionModel::new(8.0, 2).unwrap());

        let mut rows: Vec<&[f64]> = Vec::new();
        for w in 0..20 {
            // One noisy window inside each block
            let row: &[f64] = match (w < 10, w == 4 || w == 15) {
                (true, false) => &[0.9, 0.1],
                (true, true) => &[0.4, 0.6],
                (false, false) => &[0.1, 0.9],
                (false, true) => &[0.6, 0.4],
            };
            rows.push(row);
        }
        let est = estimates_from(&rows);

        let mut labels = vec![0u8; 20];
        let mut post = AncestryMatrix::new(20, 2);
        let mut ws = CrfWorkspace::default();
        engine
            .smooth_haplotype(&est, &mut post, Some(&mut labels), &mut ws)
            .unwrap();

        let expected: Vec<u8> = (0..20).map(|w| if w < 10 { 0 } else { 1 }).collect();
        assert_eq!(labels, expected);
        assert!(Logit16::decode(*post.get(4, 0)) > 0.5);
        assert!(Logit16::decode(*post.get(15, 1)) > 0.5);
    }

    #[test]
    fn test_large_gap_splits_segments() {
        // Windows 0-2 favour A, 3-4 favour B, 50 cM gap between 2 and 3
        let windows = windows_at(&[0.0, 0.1, 0.2, 50.2, 50.3]);
        let engine = SmoothingEngine::new(&windows, TransitionModel::new(8.0, 2).unwrap());
        let est = estimates_from(&[
            &[0.8, 0.2],
            &[0.8, 0.2],
            &[0.8, 0.2],
            &[0.2, 0.8],
            &[0.2, 0.8],
        ]);
        let mut labels = vec![0u8; 5];
        engine
            .viterbi(&est, &mut labels, &mut CrfWorkspace::default())
            .unwrap();

        let segs = crate::model::segments::segments_from_labels(&labels);
        assert_eq!(segs.len(), 2);
        assert_eq!((segs[0].start.0, segs[0].end.0, segs[0].ancestry), (0, 2, 0));
        assert_eq!((segs[1].start.0, segs[1].end.0, segs[1].ancestry), (3, 4, 1));
    }

    #[test]
    fn test_viterbi_tie_prefers_lowest() {
        let windows = windows_at(&[0.0, 1.0, 2.0]);
        let engine = SmoothingEngine::new(&windows, TransitionModel::new(8.0, 3).unwrap());
        let est = estimates_from(&[&[0.3, 0.3, 0.3], &[0.3, 0.3, 0.3], &[0.3, 0.3, 0.3]]);
        let mut labels = vec![9u8; 3];
        engine
            .viterbi(&est, &mut labels, &mut CrfWorkspace::default())
            .unwrap();
        assert_eq!(labels, vec![0, 0, 0]);
    }

    #[test]
    fn test_viterbi_leaves_best_state_when_staying_is_unlikely() {
        // 100 cM apart: staying has probability exp(-8), each other ancestry ~0.5
        let engine = SmoothingEngine::new(
            &windows_at(&[0.0, 100.0]),
            TransitionModel::new(8.0, 3).unwrap(),
        );
        let est = estimates_from(&[&[0.6, 0.3, 0.1], &[0.4, 0.35, 0.25]]);
        let mut labels = vec![9u8; 2];
        engine
            .viterbi(&est, &mut labels, &mut CrfWorkspace::default())
            .unwrap();

        // Exhaustive search over the 9 paths
        let e0 = [0.6, 0.3, 0.1];
        let e1 = [0.4, 0.35, 0.25];
        let stay = (-8.0f64).exp();
        let mut best = (0usize, 0usize);
        let mut best_score = -1.0;
        for i in 0..3 {
            for j in 0..3 {
                let t = if i == j { stay } else { (1.0 - stay) / 2.0 };
                let score = e0[i] * t * e1[j];
                if score > best_score {
                    best_score = score;
                    best = (i, j);
                }
            }
        }
        assert_eq!(best, (0, 1));
        assert_eq!(labels, vec![best.0 as u8, best.1 as u8]);
    }

    #[test]
    fn test_stay_in_state_marks_switch() {
        let cm: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let windows = windows_at(&cm);
        let engine = SmoothingEngine::new(&windows, TransitionModel::new(8.0, 2).unwrap());
        let rows: Vec<&[f64]> = (0..10)
            .map(|w| if w < 5 { &[0.95, 0.05][..] } else { &[0.05, 0.95][..] })
            .collect();
        let est = estimates_from(&rows);

        let mut stay = Vec::new();
        engine
            .stay_in_state(&est, &mut stay, &mut CrfWorkspace::default())
            .unwrap();
        assert_eq!(stay.len(), 9);
        assert!(stay.iter().all(|&s| (0.0..=1.0 + 1e-12).contains(&s)));

        let min = stay
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(min, 4);
        assert!(stay[4] < 0.5);
        assert!(stay[0] > 0.5);
    }

    #[test]
    fn test_empty_chain_is_noop() {
        let engine = SmoothingEngine::new(&Windows::default(), TransitionModel::new(8.0, 2).unwrap());
        let est: AncestryMatrix<i8> = AncestryMatrix::new(0, 2);
        let mut post: AncestryMatrix<i16> = AncestryMatrix::new(0, 2);
        let mut labels: Vec<u8> = Vec::new();
        let mut ws = CrfWorkspace::default();
        assert_eq!(engine.forward_backward(&est, &mut post, &mut ws).unwrap(), 0.0);
        engine.viterbi(&est, &mut labels, &mut ws).unwrap();
        let mut stay = vec![1.0];
        engine.stay_in_state(&est, &mut stay, &mut ws).unwrap();
        assert!(stay.is_empty());
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let windows = windows_at(&[0.0, 1.0]);
        let engine = SmoothingEngine::new(&windows, TransitionModel::new(8.0, 2).unwrap());
        let est: AncestryMatrix<i8> = AncestryMatrix::new(3, 2);
        let mut post: AncestryMatrix<i16> = AncestryMatrix::new(3, 2);
        assert!(engine
            .forward_backward(&est, &mut post, &mut CrfWorkspace::default())
            .is_err());
    }
}
