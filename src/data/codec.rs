//! # Compact Log-Odds Probability Codec
//!
//! Per-sample, per-window, per-ancestry storage dominates memory, so
//! probabilities are stored as small signed integers holding a scaled,
//! rounded log-odds value:
//!
//! ```text
//! encode(p) = clamp(round(-s * ln((1 - p) / p)), -MAX, MAX)
//! decode(v) = 1 / (1 + exp(-v / s))
//! ```
//!
//! | Codec     | Code  | Scale | Max error (p = 0.5) | Smallest value |
//! |-----------|-------|-------|---------------------|----------------|
//! | `Logit8`  | `i8`  | 12    | ~1%                 | ~2.53e-5       |
//! | `Logit16` | `i16` | 1024  | ~0.012%             | ~1.27e-14      |
//!
//! Rounding to the nearest code halves the error of truncation, which gives
//! about 2% and 0.024% for the same scales.
//!
//! `Logit8` holds classifier estimates. `Logit16` holds the forward-backward
//! posteriors that are fed back into the next classification round, where the
//! coarser code would wash out the extra resolution of the smoothing step.
//!
//! Both encodings are monotonic in `p`, so comparing codes orders
//! probabilities.

/// A fixed-width log-odds encoding of a probability in (0, 1).
pub trait LogOddsCodec {
    /// Storage type of one encoded probability
    type Code: Copy + Default + Ord + Send + Sync + std::fmt::Debug + 'static;

    /// Log-odds scale factor
    const SCALE: f64;

    /// Largest code magnitude
    const MAX: i32;

    /// Convert an in-range integer to the storage type.
    fn from_i32(v: i32) -> Self::Code;

    /// Widen a code to `i32`.
    fn to_i32(code: Self::Code) -> i32;

    /// Encode a probability. Inputs at or beyond 0 and 1 map to the extreme
    /// codes without evaluating the logarithm.
    #[inline]
    fn encode(p: f64) -> Self::Code {
        debug_assert!(!p.is_nan(), "cannot encode NaN probability");
        if p <= 0.0 {
            return Self::from_i32(-Self::MAX);
        }
        if p >= 1.0 {
            return Self::from_i32(Self::MAX);
        }
        let v = (-Self::SCALE * ((1.0 - p) / p).ln()).round();
        let max = Self::MAX as f64;
        Self::from_i32(v.clamp(-max, max) as i32)
    }

    /// Decode a code back to a probability.
    #[inline]
    fn decode(code: Self::Code) -> f64 {
        1.0 / (1.0 + (-(Self::to_i32(code) as f64) / Self::SCALE).exp())
    }

    /// Smallest representable probability
    fn min_prob() -> f64 {
        Self::decode(Self::from_i32(-Self::MAX))
    }

    /// Largest representable probability
    fn max_prob() -> f64 {
        Self::decode(Self::from_i32(Self::MAX))
    }
}

/// 8-bit log-odds codec for classifier estimates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Logit8;

impl LogOddsCodec for Logit8 {
    type Code = i8;
    const SCALE: f64 = 12.0;
    const MAX: i32 = 127;

    #[inline]
    fn from_i32(v: i32) -> i8 {
        v as i8
    }

    #[inline]
    fn to_i32(code: i8) -> i32 {
        code as i32
    }
}

/// 16-bit log-odds codec for forward-backward posteriors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Logit16;

impl LogOddsCodec for Logit16 {
    type Code = i16;
    const SCALE: f64 = 1024.0;
    const MAX: i32 = 32767;

    #[inline]
    fn from_i32(v: i32) -> i16 {
        v as i16
    }

    #[inline]
    fn to_i32(code: i16) -> i32 {
        code as i32
    }
}
