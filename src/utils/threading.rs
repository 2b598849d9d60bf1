//! # Threading Configuration
//!
//! Every pipeline run gets its own rayon pool sized from the configured
//! thread count; work is submitted with `pool.install(..)` so the global pool
//! is never touched.

use crate::error::{AdmixError, Result};

/// Create a pool of `n_threads` named workers.
pub fn build_thread_pool(n_threads: usize) -> Result<rayon::ThreadPool> {
    if n_threads == 0 {
        return Err(AdmixError::config("Thread count must be at least 1"));
    }
    Ok(rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .thread_name(|i| format!("admixcrf-worker-{}", i))
        .build()?)
}

/// Number of available CPUs, at least 1
pub fn default_thread_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_size() {
        let pool = build_thread_pool(3).unwrap();
        assert_eq!(pool.current_num_threads(), 3);
        assert!(build_thread_pool(0).is_err());
        assert!(default_thread_count() >= 1);
    }
}
