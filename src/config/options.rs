use clap::Args;

use super::filter::{SwiftParameters, VerificationStrategy};
use crate::error::{Result, SwiftError};
use crate::post::StoreLimits;

/// Upper bound for the error rate accepted by the filter
pub const MAX_EPSILON: f64 = 0.25;

#[derive(Args, Debug, Clone)]
pub struct StellarOptions {
    /// Maximal error rate of a match
    #[arg(short, long, default_value_t = 0.05)]
    pub epsilon: f64,
    /// Minimal length of a match
    #[arg(short, long, default_value_t = 100)]
    pub min_length: usize,
    /// Length of the q-grams used by the filter
    #[arg(short, long, default_value_t = 10)]
    pub kmer: usize,
    /// Maximal X-drop score during match extension
    #[arg(short, long, default_value_t = 5.0)]
    pub x_drop: f64,
    /// Maximal period of low-complexity repeats to skip
    #[arg(long, default_value_t = 1)]
    pub repeat_period: usize,
    /// Minimal length of low-complexity repeats to skip
    #[arg(long, default_value_t = 1000)]
    pub repeat_length: usize,
    /// Fraction of the total query length above which a q-gram is dropped
    #[arg(short, long, default_value_t = 1.0)]
    pub abundance_cut: f64,
    #[arg(long, default_value_t = true)]
    pub forward: bool,
    /// Also search the reverse complement of the haystack
    #[arg(short, long, default_value_t = false)]
    pub reverse: bool,
    /// Stop collecting matches for a query once it has this many
    #[arg(long)]
    pub disable_thresh: Option<usize>,
    /// Number of matches kept per query
    #[arg(short, long, default_value_t = 50)]
    pub num_matches: usize,
    /// Stored match count that triggers overlap removal and compaction
    #[arg(short = 's', long, default_value_t = 500)]
    pub compact_thresh: usize,
    #[arg(long, default_value_t = 4)]
    pub min_log2_delta: u32,
    #[arg(long, default_value_t = 1)]
    pub taboo_length: usize,
    /// exact | best-local
    #[arg(short, long, default_value = "exact")]
    pub verification: VerificationStrategy,
    /// Verify hits of different queries in parallel
    #[arg(long, default_value_t = false)]
    pub parallel: bool,
    #[arg(long, default_value_t = false)]
    pub progress: bool,
}

impl Default for StellarOptions {
    fn default() -> Self {
        Self {
            epsilon: 0.05,
            min_length: 100,
            kmer: 10,
            x_drop: 5.0,
            repeat_period: 1,
            repeat_length: 1000,
            abundance_cut: 1.0,
            forward: true,
            reverse: false,
            disable_thresh: None,
            num_matches: 50,
            compact_thresh: 500,
            min_log2_delta: 4,
            taboo_length: 1,
            verification: VerificationStrategy::Exact,
            parallel: false,
            progress: false,
        }
    }
}

/// Scores used when verifying a candidate window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationScoring {
    pub match_score: i32,
    /// Shared penalty for mismatches and indels
    pub mismatch_indel: i32,
    /// Score drop that terminates an extension
    pub score_drop_off: i32,
}

impl StellarOptions {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=MAX_EPSILON).contains(&self.epsilon) {
            return Err(SwiftError::InvalidErrorRate(self.epsilon));
        }
        if self.kmer == 0 {
            return Err(SwiftError::InvalidOption("kmer must be positive".into()));
        }
        if self.kmer > crate::seed::MAX_SHAPE_SPAN {
            return Err(SwiftError::QGramTooLong { span: self.kmer });
        }
        if self.epsilon > 0.0 && self.kmer as f64 >= 1.0 / self.epsilon {
            return Err(SwiftError::QGramNotBelowInverseErrorRate {
                span: self.kmer,
                inverse: 1.0 / self.epsilon,
            });
        }
        if !(0.0..=1.0).contains(&self.abundance_cut) {
            return Err(SwiftError::InvalidOption(format!(
                "abundance cut {} is outside [0, 1]",
                self.abundance_cut
            )));
        }
        if self.num_matches > self.compact_thresh {
            return Err(SwiftError::InvalidOption(format!(
                "num-matches ({}) must not exceed compact-thresh ({})",
                self.num_matches, self.compact_thresh
            )));
        }
        if self.min_length < self.kmer {
            return Err(SwiftError::InvalidOption(format!(
                "min-length ({}) must be at least the q-gram length ({})",
                self.min_length, self.kmer
            )));
        }
        if !self.forward && !self.reverse {
            return Err(SwiftError::InvalidOption(
                "at least one strand must be searched".into(),
            ));
        }
        if self.x_drop < 0.0 {
            return Err(SwiftError::InvalidOption("x-drop must not be negative".into()));
        }
        Ok(())
    }

    pub fn swift_parameters(&self) -> SwiftParameters {
        SwiftParameters {
            min_threshold: 1,
            min_log2_delta: self.min_log2_delta,
            taboo_length: self.taboo_length,
            progress: self.progress,
        }
    }

    pub fn store_limits(&self) -> StoreLimits {
        StoreLimits {
            disable_threshold: self.disable_thresh.unwrap_or(usize::MAX),
            compact_threshold: self.compact_thresh,
            max_kept: self.num_matches,
        }
    }

    /// Match = 1, mismatch/indel = max(ceil(-1/eps) + 1, -min_length)
    pub fn scoring(&self) -> VerificationScoring {
        let mismatch_indel = ((-1.0 / self.epsilon).ceil() + 1.0).max(-(self.min_length as f64)) as i32;
        VerificationScoring {
            match_score: 1,
            mismatch_indel,
            score_drop_off: (self.x_drop * f64::from(-mismatch_indel)) as i32,
        }
    }
}
