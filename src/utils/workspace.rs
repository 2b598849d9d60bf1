//! # Workspace for Smoothing Buffers
//!
//! The smoothing engine borrows its scratch space instead of owning it, so the
//! engine can be shared read-only across threads while each worker thread keeps
//! one `CrfWorkspace` and passes `&mut` into every call.

/// Scratch buffers for one haplotype chain
#[derive(Debug, Default)]
pub struct CrfWorkspace {
    /// Decoded, normalized emissions (n_windows x K)
    pub emit: Vec<f64>,

    /// Normalized forward values (n_windows x K)
    pub fwd: Vec<f64>,

    /// Rolling backward values (K)
    pub bwd: Vec<f64>,

    /// Viterbi scores of the current window (K)
    pub delta: Vec<f64>,

    /// Viterbi scores of the next window (K)
    pub delta_next: Vec<f64>,

    /// Viterbi backpointers (n_windows x K)
    pub backptr: Vec<u8>,

    n_windows: usize,
    n_ancestries: usize,
}

impl CrfWorkspace {
    pub fn new(n_windows: usize, n_ancestries: usize) -> Self {
        let mut ws = Self::default();
        ws.resize(n_windows, n_ancestries);
        ws
    }

    /// Resize buffers for new dimensions. Contents are unspecified afterwards.
    pub fn resize(&mut self, n_windows: usize, n_ancestries: usize) {
        let n = n_windows * n_ancestries;
        self.emit.resize(n, 0.0);
        self.fwd.resize(n, 0.0);
        self.backptr.resize(n, 0);
        self.bwd.resize(n_ancestries, 0.0);
        self.delta.resize(n_ancestries, 0.0);
        self.delta_next.resize(n_ancestries, 0.0);
        self.n_windows = n_windows;
        self.n_ancestries = n_ancestries;
    }

    /// Resize only if the dimensions differ
    pub fn ensure(&mut self, n_windows: usize, n_ancestries: usize) {
        if self.n_windows != n_windows || self.n_ancestries != n_ancestries {
            self.resize(n_windows, n_ancestries);
        }
    }

    pub fn n_windows(&self) -> usize {
        self.n_windows
    }

    pub fn n_ancestries(&self) -> usize {
        self.n_ancestries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize() {
        let mut ws = CrfWorkspace::new(10, 3);
        assert_eq!(ws.fwd.len(), 30);
        assert_eq!(ws.bwd.len(), 3);

        ws.ensure(5, 4);
        assert_eq!(ws.emit.len(), 20);
        assert_eq!(ws.backptr.len(), 20);
        assert_eq!(ws.delta.len(), 4);
        assert_eq!((ws.n_windows(), ws.n_ancestries()), (5, 4));
    }
}
