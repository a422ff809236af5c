//! Verification of filter hits
//!
//! A [`Verifier`] turns the region of a [`Hit`] into eps-matches. The banded
//! verifier enumerates local alignments within the hit's band of diagonals,
//! widened to tolerate indels and matches that extend past the q-grams that
//! were counted. Each local alignment is split where its score drops by more
//! than the X-drop, the outer pieces are extended with X-drop and the longest
//! eps-match covering each piece is reported.

use std::ops::Range;

use anyhow::{bail, Result};

use super::extend::{xdrop_extend, ExtendDirection, Extension};
use super::result::{EditOp, EditStats};
use super::sw_banded::{banded_local_alignments, BandedAlignment, BandedSwConfig};
use crate::config::{VerificationScoring, VerificationStrategy};
use crate::post::EpsMatch;
use crate::swift::Hit;

/// Region of the haystack and of one query reported by the filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationWindow {
    pub query_id: usize,
    pub haystack: Range<usize>,
    pub query: Range<usize>,
    /// Diagonals (haystack minus query position) the hit was counted on
    pub diagonals: Range<i64>,
}

impl VerificationWindow {
    pub fn from_hit(hit: &Hit, haystack_len: usize, query_len: usize) -> Self {
        Self {
            query_id: hit.query_id,
            haystack: hit.haystack_window(haystack_len),
            query: hit.query_window(query_len),
            diagonals: hit.diagonals(),
        }
    }
}

/// Finds eps-matches inside a verification window
pub trait Verifier: Sync {
    /// All eps-matches of length at least `min_length` found in `window`,
    /// in haystack and query coordinates
    fn verify(
        &self,
        haystack: &[u8],
        query: &[u8],
        window: &VerificationWindow,
        error_rate: f64,
        min_length: usize,
        scoring: &VerificationScoring,
    ) -> Result<Vec<EpsMatch>>;
}

/// Banded Waterman-Eggert verifier with X-drop splitting and extension.
/// [`VerificationStrategy::BestLocal`] only looks at the best local alignment.
#[derive(Debug, Clone, Copy, Default)]
pub struct BandedLocalVerifier {
    pub strategy: VerificationStrategy,
}

impl BandedLocalVerifier {
    pub fn new(strategy: VerificationStrategy) -> Self {
        Self { strategy }
    }
}

impl Verifier for BandedLocalVerifier {
    fn verify(
        &self,
        haystack: &[u8],
        query: &[u8],
        window: &VerificationWindow,
        error_rate: f64,
        min_length: usize,
        scoring: &VerificationScoring,
    ) -> Result<Vec<EpsMatch>> {
        if window.haystack.end > haystack.len() || window.query.end > query.len() {
            bail!(
                "verification window {:?} x {:?} exceeds sequences of length {} and {}",
                window.haystack,
                window.query,
                haystack.len(),
                query.len()
            );
        }

        // let the alignment run up to min_length past the counted q-grams
        let query_range = window.query.start.saturating_sub(min_length)
            ..(window.query.end + min_length).min(query.len());
        let slack = (error_rate * query_range.len() as f64).ceil() as i64;
        let diagonals = window.diagonals.start - slack..window.diagonals.end + slack;
        let haystack_len = haystack.len() as i64;
        let haystack_range = (query_range.start as i64 + diagonals.start).clamp(0, haystack_len)
            as usize
            ..(query_range.end as i64 + diagonals.end).clamp(0, haystack_len) as usize;

        let config = BandedSwConfig {
            match_score: scoring.match_score,
            mismatch_indel: scoring.mismatch_indel,
            x_drop: scoring.score_drop_off,
        };
        let limit = match self.strategy {
            VerificationStrategy::Exact => usize::MAX,
            VerificationStrategy::BestLocal => 1,
        };
        let min_score = min_local_score(error_rate, min_length);
        let alignments = banded_local_alignments(
            query,
            haystack,
            query_range,
            haystack_range,
            diagonals,
            &config,
            min_score,
            limit,
        );

        let min_columns = min_length - (error_rate * min_length as f64).floor() as usize;
        let mut found: Vec<EpsMatch> = Vec::new();
        for alignment in &alignments {
            let seeds = split_at_x_drops(alignment, &config, min_score);
            let last = seeds.len().saturating_sub(1);
            for (k, seed) in seeds.iter().enumerate() {
                // the outer pieces grow outwards, inner ones stay as they are
                let (extended, core) = extend_seed(query, haystack, seed, k == 0, k == last, &config);
                if extended.edit_script.len() < min_columns {
                    continue;
                }
                if let Some(m) = longest_eps_match(&extended, core, error_rate, min_length, scoring) {
                    if !found.contains(&m) {
                        found.push(m);
                    }
                }
            }
        }
        Ok(found)
    }
}

/// Lowest local alignment score an eps-match of at least `min_length`
/// columns is guaranteed to contain
fn min_local_score(error_rate: f64, min_length: usize) -> i32 {
    let min_length = min_length as f64;
    let errors = (error_rate * min_length).floor();
    let by_length = ((min_length - errors) / (errors + 1.0)).ceil();
    if error_rate <= 0.0 {
        return by_length.max(1.0) as i32;
    }
    // shortest length allowing one more error
    let next_len = ((errors + 1.0) / error_rate).ceil();
    let next_errors = (error_rate * next_len).floor();
    let by_next = ((next_len - next_errors) / (next_errors + 1.0)).ceil();
    by_length.min(by_next).max(1.0) as i32
}

#[inline]
fn op_score(op: EditOp, config: &BandedSwConfig) -> i32 {
    if op == EditOp::Match {
        config.match_score
    } else {
        config.mismatch_indel
    }
}

/// Pieces of `alignment` separated by stretches that drop the score by more
/// than `x_drop`, keeping those scoring at least `min_score`
fn split_at_x_drops(
    alignment: &BandedAlignment,
    config: &BandedSwConfig,
    min_score: i32,
) -> Vec<BandedAlignment> {
    let ops = &alignment.edit_script;
    let mut pieces = Vec::new();
    let (mut start, mut peak_end) = (0usize, 0usize);
    let (mut running, mut peak) = (0i32, 0i32);

    for (t, &op) in ops.iter().enumerate() {
        running += op_score(op, config);
        if running <= 0 {
            if peak >= min_score && peak_end > start {
                pieces.push(sub_alignment(alignment, start..peak_end, peak));
            }
            start = t + 1;
            peak_end = start;
            running = 0;
            peak = 0;
        } else if running > peak {
            peak = running;
            peak_end = t + 1;
        } else if peak - running > config.x_drop {
            if peak >= min_score {
                pieces.push(sub_alignment(alignment, start..peak_end, peak));
            }
            start = t + 1;
            peak_end = start;
            running = 0;
            peak = 0;
        }
    }
    if peak >= min_score && peak_end > start {
        pieces.push(sub_alignment(alignment, start..peak_end, peak));
    }
    pieces
}

/// Columns `columns` of `alignment` as an alignment of their own
fn sub_alignment(alignment: &BandedAlignment, columns: Range<usize>, score: i32) -> BandedAlignment {
    let ops = &alignment.edit_script;
    let advance = |range: Range<usize>| {
        ops[range].iter().fold((0usize, 0usize), |(q, h), op| {
            (
                q + usize::from(op.advances_query()),
                h + usize::from(op.advances_haystack()),
            )
        })
    };
    let (q_skip, h_skip) = advance(0..columns.start);
    let (q_len, h_len) = advance(columns.clone());
    BandedAlignment {
        score,
        query_begin: alignment.query_begin + q_skip,
        query_end: alignment.query_begin + q_skip + q_len,
        haystack_begin: alignment.haystack_begin + h_skip,
        haystack_end: alignment.haystack_begin + h_skip + h_len,
        edit_script: ops[columns].to_vec(),
    }
}

/// Grow `seed` by X-drop extension on the requested sides. Returns the
/// extended alignment and the columns that hold the seed.
fn extend_seed(
    query: &[u8],
    haystack: &[u8],
    seed: &BandedAlignment,
    left: bool,
    right: bool,
    config: &BandedSwConfig,
) -> (BandedAlignment, Range<usize>) {
    let before = if left {
        xdrop_extend(
            query,
            haystack,
            seed.query_begin,
            seed.haystack_begin,
            ExtendDirection::Left,
            config,
        )
    } else {
        Extension::default()
    };
    let after = if right {
        xdrop_extend(
            query,
            haystack,
            seed.query_end,
            seed.haystack_end,
            ExtendDirection::Right,
            config,
        )
    } else {
        Extension::default()
    };

    let core = before.edit_script.len()..before.edit_script.len() + seed.edit_script.len();
    let mut edit_script = before.edit_script;
    edit_script.extend_from_slice(&seed.edit_script);
    edit_script.extend(after.edit_script);
    let extended = BandedAlignment {
        score: before.score + seed.score + after.score,
        query_begin: seed.query_begin - before.query_len,
        query_end: seed.query_end + after.query_len,
        haystack_begin: seed.haystack_begin - before.haystack_len,
        haystack_end: seed.haystack_end + after.haystack_len,
        edit_script,
    };
    (extended, core)
}

fn script_score(stats: &EditStats, scoring: &VerificationScoring) -> i32 {
    stats.matches as i32 * scoring.match_score + stats.errors() as i32 * scoring.mismatch_indel
}

/// Longest part of `alignment` that covers the columns in `core`, starts and
/// ends with a match and has an error rate of at most `error_rate`
pub(crate) fn longest_eps_match(
    alignment: &BandedAlignment,
    core: Range<usize>,
    error_rate: f64,
    min_length: usize,
    scoring: &VerificationScoring,
) -> Option<EpsMatch> {
    let ops = &alignment.edit_script;
    let n = ops.len();
    if core.end > n {
        return None;
    }

    // errors, haystack and query positions before each column
    let mut errors = vec![0usize; n + 1];
    let mut hay = vec![0usize; n + 1];
    let mut qry = vec![0usize; n + 1];
    for (t, &op) in ops.iter().enumerate() {
        errors[t + 1] = errors[t] + usize::from(op.is_error());
        hay[t + 1] = hay[t] + usize::from(op.advances_haystack());
        qry[t + 1] = qry[t] + usize::from(op.advances_query());
    }

    let mut best: Option<(usize, usize)> = None;
    let mut best_len = min_length.saturating_sub(1);
    for start in 0..=core.start.min(n.saturating_sub(1)) {
        if n - start <= best_len {
            break;
        }
        if ops[start] != EditOp::Match {
            continue;
        }
        let shortest = (start + best_len + 1).max(core.end);
        for end in (shortest..=n).rev() {
            if ops[end - 1] != EditOp::Match {
                continue;
            }
            let len = end - start;
            if (errors[end] - errors[start]) as f64 <= (error_rate * len as f64).floor() {
                best = Some((start, end));
                best_len = len;
                break;
            }
        }
    }

    let (start, end) = best?;
    let script = ops[start..end].to_vec();
    let stats = EditStats::from_script(&script);
    Some(
        EpsMatch::new(
            alignment.haystack_begin + hay[start],
            alignment.haystack_begin + hay[end],
            alignment.query_begin + qry[start],
            alignment.query_begin + qry[end],
        )
        .with_alignment(script_score(&stats, scoring), script),
    )
}
