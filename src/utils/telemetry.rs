//! # Telemetry Blackboard
//!
//! Thread-safe progress tracking for the local-ancestry pipeline.
//! Worker threads bump atomic counters from inside rayon iterators; an
//! optional heartbeat thread samples them and reports progress to stderr.

use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Pipeline stage for high-level progress tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Stage {
    Initializing = 0,
    Classifying = 1,
    Smoothing = 2,
    Complete = 3,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Initializing => "Initializing",
            Stage::Classifying => "Classifying",
            Stage::Smoothing => "Smoothing",
            Stage::Complete => "Complete",
        }
    }

    fn from_u64(val: u64) -> Self {
        match val {
            0 => Stage::Initializing,
            1 => Stage::Classifying,
            2 => Stage::Smoothing,
            _ => Stage::Complete,
        }
    }
}

/// Shared progress state.
///
/// Relaxed ordering throughout: the heartbeat only needs approximate values.
pub struct TelemetryBlackboard {
    stage: AtomicU64,

    current_round: AtomicU64,
    total_rounds: AtomicU64,

    samples_processed: AtomicU64,
    total_samples: AtomicU64,

    start_time: Instant,
    last_progress_nanos: AtomicU64,

    shutdown: AtomicBool,
}

impl TelemetryBlackboard {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[inline]
    pub fn set_stage(&self, stage: Stage) {
        self.stage.store(stage as u64, Ordering::Relaxed);
        self.touch_progress();
    }

    #[inline]
    pub fn stage(&self) -> Stage {
        Stage::from_u64(self.stage.load(Ordering::Relaxed))
    }

    /// Enter round `round` (0-based) of `total`, resetting the sample counter
    pub fn start_round(&self, round: u64, total: u64) {
        self.current_round.store(round + 1, Ordering::Relaxed);
        self.total_rounds.store(total, Ordering::Relaxed);
        self.samples_processed.store(0, Ordering::Relaxed);
        self.touch_progress();
    }

    pub fn set_total_samples(&self, total: u64) {
        self.total_samples.store(total, Ordering::Relaxed);
    }

    /// Reset the sample counter at a stage boundary
    pub fn reset_samples(&self) {
        self.samples_processed.store(0, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_samples(&self, n: u64) {
        self.samples_processed.fetch_add(n, Ordering::Relaxed);
        self.touch_progress();
    }

    pub fn samples_processed(&self) -> u64 {
        self.samples_processed.load(Ordering::Relaxed)
    }

    pub fn current_round(&self) -> u64 {
        self.current_round.load(Ordering::Relaxed)
    }

    #[inline]
    fn touch_progress(&self) {
        let elapsed = self.start_time.elapsed().as_nanos() as u64;
        self.last_progress_nanos.store(elapsed, Ordering::Relaxed);
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            stage: self.stage(),
            current_round: self.current_round.load(Ordering::Relaxed),
            total_rounds: self.total_rounds.load(Ordering::Relaxed),
            samples_processed: self.samples_processed.load(Ordering::Relaxed),
            total_samples: self.total_samples.load(Ordering::Relaxed),
            elapsed_secs: self.elapsed_secs(),
            last_progress_nanos: self.last_progress_nanos.load(Ordering::Relaxed),
            current_nanos: self.start_time.elapsed().as_nanos() as u64,
        }
    }

    fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    fn signal_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

impl Default for TelemetryBlackboard {
    fn default() -> Self {
        Self {
            stage: AtomicU64::new(Stage::Initializing as u64),
            current_round: AtomicU64::new(0),
            total_rounds: AtomicU64::new(0),
            samples_processed: AtomicU64::new(0),
            total_samples: AtomicU64::new(0),
            start_time: Instant::now(),
            last_progress_nanos: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
        }
    }
}

struct TelemetrySnapshot {
    stage: Stage,
    current_round: u64,
    total_rounds: u64,
    samples_processed: u64,
    total_samples: u64,
    elapsed_secs: f64,
    last_progress_nanos: u64,
    current_nanos: u64,
}

/// Heartbeat output configuration
pub struct HeartbeatConfig {
    /// Interval between heartbeats (seconds)
    pub interval_secs: u64,
    /// Stall warning threshold (seconds with no progress)
    pub stall_threshold_secs: u64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            stall_threshold_secs: 300,
        }
    }
}

/// Handle to the heartbeat thread
pub struct HeartbeatHandle {
    handle: Option<JoinHandle<()>>,
    blackboard: Arc<TelemetryBlackboard>,
}

impl HeartbeatHandle {
    /// Spawn the heartbeat thread
    pub fn spawn(blackboard: Arc<TelemetryBlackboard>, config: HeartbeatConfig) -> io::Result<Self> {
        let bb = blackboard.clone();
        let is_tty = io::stderr().is_terminal();

        let handle = thread::Builder::new()
            .name("heartbeat".to_string())
            .spawn(move || heartbeat_loop(bb, config, is_tty))?;

        Ok(Self {
            handle: Some(handle),
            blackboard,
        })
    }

    /// Signal shutdown and wait for the thread to finish
    pub fn shutdown(mut self) {
        self.blackboard.signal_shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for HeartbeatHandle {
    fn drop(&mut self) {
        // Signal only; joining here could block for a full interval
        self.blackboard.signal_shutdown();
    }
}

/// Resident set size in MB (Linux only)
fn get_rss_mb() -> Option<u64> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/self/statm")
            .ok()
            .and_then(|s| s.split_whitespace().nth(1)?.parse::<u64>().ok())
            .map(|pages| pages * 4096 / (1024 * 1024))
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        format!("{:.0}s", secs)
    } else if secs < 3600.0 {
        let mins = (secs / 60.0).floor();
        format!("{:.0}m{:.0}s", mins, secs % 60.0)
    } else {
        format!("{:.1}h", secs / 3600.0)
    }
}

fn heartbeat_loop(bb: Arc<TelemetryBlackboard>, config: HeartbeatConfig, is_tty: bool) {
    let interval = Duration::from_secs(config.interval_secs);
    let mut last_samples = 0u64;
    let mut last_time = Instant::now();

    loop {
        thread::sleep(interval);
        if bb.is_shutdown() {
            break;
        }

        let snap = bb.snapshot();

        let now = Instant::now();
        let dt = now.duration_since(last_time).as_secs_f64();
        let velocity = if dt > 0.1 {
            snap.samples_processed.saturating_sub(last_samples) as f64 / dt
        } else {
            0.0
        };
        last_samples = snap.samples_processed;
        last_time = now;

        let eta = if velocity > 0.0 && snap.total_samples > snap.samples_processed {
            format_duration((snap.total_samples - snap.samples_processed) as f64 / velocity)
        } else {
            "unknown".to_string()
        };

        let stall_secs = snap.current_nanos.saturating_sub(snap.last_progress_nanos) / 1_000_000_000;
        let is_stalled = stall_secs > config.stall_threshold_secs;
        let rss_mb = get_rss_mb();

        if is_tty {
            print_tty_progress(&snap, &eta, rss_mb, velocity, is_stalled);
        } else {
            print_log_progress(&snap, &eta, rss_mb, velocity, is_stalled);
        }
    }

    if is_tty {
        eprint!("\r\x1b[K");
        let _ = io::stderr().flush();
    }
}

fn print_tty_progress(
    snap: &TelemetrySnapshot,
    eta: &str,
    rss_mb: Option<u64>,
    velocity: f64,
    is_stalled: bool,
) {
    let progress_pct = if snap.total_samples > 0 {
        (snap.samples_processed as f64 / snap.total_samples as f64 * 100.0).min(100.0)
    } else {
        0.0
    };

    let bar_width = 20;
    let filled = ((progress_pct / 100.0) * bar_width as f64) as usize;
    let bar: String =
        "=".repeat(filled.min(bar_width)) + &" ".repeat(bar_width.saturating_sub(filled));

    let mem_str = rss_mb.map(|mb| format!(" {}MB", mb)).unwrap_or_default();
    let stall_str = if is_stalled { " [STALLED]" } else { "" };

    eprint!(
        "\r[{}] {:>5.1}% | {} R{}/{} S{}/{} | {:.1} samples/s | {} | ETA: {}{}{}    \x1b[K",
        bar,
        progress_pct,
        snap.stage.as_str(),
        snap.current_round,
        snap.total_rounds,
        snap.samples_processed,
        snap.total_samples,
        velocity,
        format_duration(snap.elapsed_secs),
        eta,
        mem_str,
        stall_str
    );
    let _ = io::stderr().flush();
}

fn print_log_progress(
    snap: &TelemetrySnapshot,
    eta: &str,
    rss_mb: Option<u64>,
    velocity: f64,
    is_stalled: bool,
) {
    eprintln!(
        "[HEARTBEAT] stage=\"{}\" round={}/{} samples={}/{} velocity={:.1}/s \
         elapsed={:.0}s eta={} rss_mb={} stalled={}",
        snap.stage.as_str(),
        snap.current_round,
        snap.total_rounds,
        snap.samples_processed,
        snap.total_samples,
        velocity,
        snap.elapsed_secs,
        eta,
        rss_mb.map(|m| m.to_string()).unwrap_or_else(|| "?".to_string()),
        is_stalled
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_roundtrip() {
        for stage in [
            Stage::Initializing,
            Stage::Classifying,
            Stage::Smoothing,
            Stage::Complete,
        ] {
            assert_eq!(Stage::from_u64(stage as u64), stage);
        }
    }

    #[test]
    fn test_blackboard_counters() {
        let bb = TelemetryBlackboard::new();
        bb.set_stage(Stage::Smoothing);
        assert_eq!(bb.stage(), Stage::Smoothing);

        bb.start_round(0, 3);
        bb.add_samples(5);
        bb.add_samples(2);
        assert_eq!(bb.current_round(), 1);
        assert_eq!(bb.samples_processed(), 7);

        bb.reset_samples();
        assert_eq!(bb.samples_processed(), 0);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30.0), "30s");
        assert_eq!(format_duration(90.0), "1m30s");
        assert_eq!(format_duration(3661.0), "1.0h");
    }

    #[test]
    fn test_heartbeat_shutdown() {
        let bb = TelemetryBlackboard::new();
        let hb = HeartbeatHandle::spawn(
            bb,
            HeartbeatConfig {
                interval_secs: 0,
                stall_threshold_secs: 1,
            },
        )
        .unwrap();
        hb.shutdown();
    }
}
