//! Per-query bucket parameters derived from the q-gram lemma

use crate::config::{FilterMode, SwiftParameters, MAX_EPSILON};
use crate::error::{Result, SwiftError};
use crate::seed::Shape;

/// Derived filter parameters for one query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketParams {
    /// Minimum number of q-gram hits a bucket needs to report a hit
    pub threshold: usize,
    /// Bucket height in diagonals (power of two)
    pub delta: usize,
    pub log_delta: u32,
    /// Number of diagonals shared with the next bucket
    pub overlap: usize,
    pub taboo_length: usize,
    /// Ring size minus one (power of two minus one)
    pub reuse_mask: usize,
    /// Largest gap between two counted q-grams that can still reach the
    /// threshold (local filtering only)
    pub distance_cut: usize,
}

impl BucketParams {
    /// Derive the parameters for one query.
    ///
    /// Semiglobal filtering sizes the threshold for the whole query, local
    /// filtering for matches of `min_length`.
    pub fn derive(
        query_len: usize,
        shape: &Shape,
        error_rate: f64,
        min_length: usize,
        mode: FilterMode,
        params: &SwiftParameters,
    ) -> Self {
        let span = shape.span();
        let weight = shape.weight();
        let len = if mode.semiglobal { query_len } else { min_length };
        let errors = (error_rate * len as f64).floor() as usize;

        let mut threshold = qgram_threshold(len, span, weight, error_rate);
        if !mode.semiglobal && error_rate > 0.0 {
            // shortest length at which one more error is allowed
            let n1 = ((errors + 1) as f64 / error_rate).ceil() as usize;
            threshold = threshold.min(qgram_threshold(n1, span, weight, error_rate));
        }
        let threshold = threshold.max(params.min_threshold.max(1) as i64) as usize;

        let band_errors = if mode.hamming_only { 0 } else { errors };
        let column = query_len.saturating_sub(span);
        let (log_delta, overlap, buckets_per_col) = if mode.diagonal {
            let log_delta = ceil_log2(band_errors + 1).max(params.min_log2_delta);
            let delta = 1usize << log_delta;
            let per_col = (column + 2 * delta + band_errors - 1) / delta;
            (log_delta, band_errors, per_col)
        } else {
            let log_delta = ceil_log2(column + 1 + band_errors).max(params.min_log2_delta);
            (log_delta, column + band_errors, 2)
        };

        let distance_cut = if mode.semiglobal {
            0
        } else {
            (threshold - 1) + span * errors + span
        };

        Self {
            threshold,
            delta: 1usize << log_delta,
            log_delta,
            overlap,
            taboo_length: params.taboo_length,
            reuse_mask: buckets_per_col.max(1).next_power_of_two() - 1,
            distance_cut,
        }
    }

    /// Number of ring slots for this query
    #[inline]
    pub fn num_buckets(&self) -> usize {
        self.reuse_mask + 1
    }

    /// Diagonal distance after which a ring slot is reused
    #[inline]
    pub fn reuse_period(&self) -> i64 {
        (self.num_buckets() << self.log_delta) as i64
    }
}

/// Q-gram lemma: minimum number of shared q-grams of an eps-match of length `len`
///
/// May be zero or negative when the lemma gives no guarantee.
pub fn qgram_threshold(len: usize, span: usize, weight: usize, error_rate: f64) -> i64 {
    let errors = (error_rate * len as f64).floor() as i64;
    len as i64 - span as i64 + 1 - errors * weight as i64
}

/// Check the settings shared by every query
pub fn validate_error_rate(error_rate: f64, shape: &Shape) -> Result<()> {
    if !(0.0..=MAX_EPSILON).contains(&error_rate) {
        return Err(SwiftError::InvalidErrorRate(error_rate));
    }
    if shape.span() > crate::seed::MAX_SHAPE_SPAN {
        return Err(SwiftError::QGramTooLong { span: shape.span() });
    }
    if error_rate > 0.0 && shape.span() as f64 >= 1.0 / error_rate {
        return Err(SwiftError::QGramNotBelowInverseErrorRate {
            span: shape.span(),
            inverse: 1.0 / error_rate,
        });
    }
    Ok(())
}

/// Smallest `k` with `2^k >= x`
#[inline]
fn ceil_log2(x: usize) -> u32 {
    if x <= 1 {
        0
    } else {
        usize::BITS - (x - 1).leading_zeros()
    }
}
