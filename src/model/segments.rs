//! # Ancestry Segments
//!
//! Collapse a per-window label path into maximal runs of equal ancestry.
//! Boundaries always fall between windows.

use serde::{Deserialize, Serialize};

use crate::data::window::WindowIdx;

/// A maximal run of consecutive windows with the same most-likely ancestry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncestrySegment {
    /// First window of the run
    pub start: WindowIdx,
    /// Last window of the run (inclusive)
    pub end: WindowIdx,
    /// Ancestry index
    pub ancestry: u8,
}

impl AncestrySegment {
    /// Number of windows covered
    pub fn n_windows(&self) -> usize {
        self.end.as_usize() - self.start.as_usize() + 1
    }
}

/// Split a label path into segments. An empty path has no segments.
pub fn segments_from_labels(labels: &[u8]) -> Vec<AncestrySegment> {
    let mut segments = Vec::new();
    let Some(&first) = labels.first() else {
        return segments;
    };

    let mut begin = 0usize;
    let mut current = first;
    for (w, &label) in labels.iter().enumerate().skip(1) {
        if label != current {
            segments.push(AncestrySegment {
                start: WindowIdx::from(begin),
                end: WindowIdx::from(w - 1),
                ancestry: current,
            });
            begin = w;
            current = label;
        }
    }
    segments.push(AncestrySegment {
        start: WindowIdx::from(begin),
        end: WindowIdx::from(labels.len() - 1),
        ancestry: current,
    });
    segments
}

/// Expand segments back into a per-window label path
pub fn labels_from_segments(segments: &[AncestrySegment]) -> Vec<u8> {
    let mut labels = Vec::new();
    for seg in segments {
        labels.extend(std::iter::repeat(seg.ancestry).take(seg.n_windows()));
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_cover_path() {
        let labels = [0u8, 0, 0, 2, 2, 1, 0, 0];
        let segs = segments_from_labels(&labels);
        assert_eq!(segs.len(), 4);
        assert_eq!(segs[0].start, WindowIdx::new(0));
        assert_eq!(segs[0].end, WindowIdx::new(2));
        assert_eq!(segs[2].n_windows(), 1);
        assert_eq!(labels_from_segments(&segs), labels.to_vec());

        // Neighbouring segments abut and differ in ancestry
        for pair in segs.windows(2) {
            assert_eq!(pair[0].end.as_usize() + 1, pair[1].start.as_usize());
            assert_ne!(pair[0].ancestry, pair[1].ancestry);
        }
    }

    #[test]
    fn test_single_and_empty_paths() {
        assert!(segments_from_labels(&[]).is_empty());

        let segs = segments_from_labels(&[3]);
        assert_eq!(
            segs,
            vec![AncestrySegment {
                start: WindowIdx::new(0),
                end: WindowIdx::new(0),
                ancestry: 3
            }]
        );
    }
}
