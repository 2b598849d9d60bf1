//! # Window × Ancestry Matrix
//!
//! One contiguous buffer per sample haplotype, row-major by window:
//!
//! ```text
//! index(window, ancestry) = window * n_ancestries + ancestry
//! ```
//!
//! All ancestries of a window sit next to each other, which is the access
//! pattern of every loop in the classifier and the smoothing engine, and a
//! flat buffer avoids one pointer per window (pointers would take as much
//! memory as the 1- and 2-byte codes themselves).

use crate::data::window::WindowIdx;

/// Fixed-shape `n_windows × n_ancestries` buffer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AncestryMatrix<T> {
    n_windows: usize,
    n_ancestries: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> AncestryMatrix<T> {
    /// Allocate a zero-filled (`T::default()`) matrix
    pub fn new(n_windows: usize, n_ancestries: usize) -> Self {
        Self {
            n_windows,
            n_ancestries,
            data: vec![T::default(); n_windows * n_ancestries],
        }
    }

    /// Fill every cell with `value`
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }
}

impl<T> AncestryMatrix<T> {
    pub fn n_windows(&self) -> usize {
        self.n_windows
    }

    pub fn n_ancestries(&self) -> usize {
        self.n_ancestries
    }

    /// Flattened offset of `(window, ancestry)`.
    ///
    /// # Panics
    /// If either coordinate is out of range.
    #[inline]
    pub fn index(&self, window: usize, ancestry: usize) -> usize {
        assert!(
            window < self.n_windows && ancestry < self.n_ancestries,
            "({}, {}) out of bounds for {}x{} ancestry matrix",
            window,
            ancestry,
            self.n_windows,
            self.n_ancestries
        );
        window * self.n_ancestries + ancestry
    }

    #[inline]
    pub fn get(&self, window: usize, ancestry: usize) -> &T {
        &self.data[self.index(window, ancestry)]
    }

    #[inline]
    pub fn get_mut(&mut self, window: usize, ancestry: usize) -> &mut T {
        let i = self.index(window, ancestry);
        &mut self.data[i]
    }

    /// All ancestries of one window
    #[inline]
    pub fn row(&self, window: WindowIdx) -> &[T] {
        let start = window.as_usize() * self.n_ancestries;
        &self.data[start..start + self.n_ancestries]
    }

    #[inline]
    pub fn row_mut(&mut self, window: WindowIdx) -> &mut [T] {
        let start = window.as_usize() * self.n_ancestries;
        &mut self.data[start..start + self.n_ancestries]
    }

    /// Iterate over window rows in chain order
    pub fn rows(&self) -> std::slice::ChunksExact<'_, T> {
        self.data.chunks_exact(self.n_ancestries.max(1))
    }

    pub fn rows_mut(&mut self) -> std::slice::ChunksExactMut<'_, T> {
        self.data.chunks_exact_mut(self.n_ancestries.max(1))
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }
}
