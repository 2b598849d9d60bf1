use admixcrf::data::snp::SnpIdx;
use admixcrf::data::window::{CrfWindow, Windows};
use admixcrf::model::crf::{CrfUpdater, SmoothingEngine};
use admixcrf::utils::workspace::CrfWorkspace;
use admixcrf::{AncestryMatrix, LogOddsCodec, Logit16, Logit8, TransitionModel, TransitionStep};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

fn windows(n: usize) -> Windows {
    Windows::new(
        (0..n)
            .map(|i| {
                let s = SnpIdx::new(i as u32);
                CrfWindow::new(s, s, s, i as f64 * 0.2)
            })
            .collect(),
    )
}

/// Estimates drifting between ancestries every 50 windows
fn estimates(n_windows: usize, k: usize) -> AncestryMatrix<i8> {
    let mut m = AncestryMatrix::new(n_windows, k);
    for w in 0..n_windows {
        let hot = (w / 50) % k;
        for a in 0..k {
            *m.get_mut(w, a) = Logit8::encode(if a == hot { 0.8 } else { 0.2 / (k - 1) as f64 });
        }
    }
    m
}

/// Benchmark the codecs on a grid of probabilities
fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    let probs: Vec<f64> = (1..1000).map(|i| i as f64 / 1000.0).collect();
    group.throughput(Throughput::Elements(probs.len() as u64));

    group.bench_function("logit8_encode", |b| {
        b.iter(|| probs.iter().map(|&p| Logit8::encode(black_box(p)) as i32).sum::<i32>())
    });
    group.bench_function("logit16_encode", |b| {
        b.iter(|| probs.iter().map(|&p| Logit16::encode(black_box(p)) as i32).sum::<i32>())
    });

    group.finish();
}

/// Benchmark single forward/backward updates with different ancestry counts
fn bench_updates(c: &mut Criterion) {
    let mut group = c.benchmark_group("crf_update");
    let step = TransitionStep {
        stay: 0.99,
        switch: 0.01,
    };

    for k in [2usize, 3, 5, 8] {
        group.throughput(Throughput::Elements(k as u64));
        let emit: Vec<f64> = (0..k).map(|i| (i + 1) as f64 / (k * (k + 1) / 2) as f64).collect();

        group.bench_with_input(BenchmarkId::new("fwd", k), &k, |b, &k| {
            let mut fwd = vec![1.0 / k as f64; k];
            b.iter(|| {
                let sum = CrfUpdater::fwd_update(black_box(&mut fwd), 1.0, black_box(step), &emit);
                fwd.iter_mut().for_each(|f| *f /= sum);
                black_box(sum)
            })
        });
        group.bench_with_input(BenchmarkId::new("bwd", k), &k, |b, &k| {
            let mut bwd = vec![1.0 / k as f64; k];
            b.iter(|| CrfUpdater::bwd_update(black_box(&mut bwd), black_box(step), &emit))
        });
    }

    group.finish();
}

/// Benchmark full-haplotype forward-backward and Viterbi scaling
fn bench_haplotype(c: &mut Criterion) {
    let mut group = c.benchmark_group("crf_haplotype");
    group.sample_size(50);
    let k = 4;

    for n_windows in [100usize, 1000, 10_000] {
        group.throughput(Throughput::Elements((n_windows * k) as u64));
        let engine = SmoothingEngine::new(
            &windows(n_windows),
            TransitionModel::new(8.0, k).expect("valid model"),
        );
        let est = estimates(n_windows, k);
        let mut ws = CrfWorkspace::new(n_windows, k);

        group.bench_with_input(
            BenchmarkId::new("forward_backward", n_windows),
            &n_windows,
            |b, &n_windows| {
                let mut post = AncestryMatrix::new(n_windows, k);
                b.iter(|| engine.forward_backward(black_box(&est), &mut post, &mut ws))
            },
        );
        group.bench_with_input(
            BenchmarkId::new("viterbi", n_windows),
            &n_windows,
            |b, &n_windows| {
                let mut labels = vec![0u8; n_windows];
                b.iter(|| engine.viterbi(black_box(&est), &mut labels, &mut ws))
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_codec, bench_updates, bench_haplotype);
criterion_main!(benches);
