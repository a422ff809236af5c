//! Gapped X-drop extension from the ends of a seed alignment
//!
//! The DP runs row by row over query positions moving away from the anchor,
//! keeping only the window of cells whose score is within `x_drop` of the
//! best score seen. The extension ends at the cell farthest from the anchor
//! that is still inside that window, so it runs through stretches that cost
//! more than they gain; trimming to an eps-match happens afterwards.

use super::result::EditOp;
use super::sw_banded::BandedSwConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendDirection {
    /// Towards the sequence starts, from just before the anchor
    Left,
    /// Towards the sequence ends, from the anchor on
    Right,
}

/// One-sided extension of an alignment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extension {
    pub score: i32,
    pub query_len: usize,
    pub haystack_len: usize,
    /// Edit script in sequence order
    pub edit_script: Vec<EditOp>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Start,
    Diag,
    /// Query only
    Up,
    /// Haystack only
    Left,
}

const DEAD: i32 = i32::MIN / 2;

/// Cells `lo .. lo + scores.len()` of one DP row
struct DpRow {
    lo: usize,
    scores: Vec<i32>,
    steps: Vec<Step>,
}

impl DpRow {
    #[inline]
    fn score(&self, j: usize) -> i32 {
        j.checked_sub(self.lo)
            .and_then(|k| self.scores.get(k))
            .copied()
            .unwrap_or(DEAD)
    }

    #[inline]
    fn step(&self, j: usize) -> Option<Step> {
        j.checked_sub(self.lo).and_then(|k| self.steps.get(k)).copied()
    }

    #[inline]
    fn end(&self) -> usize {
        self.lo + self.scores.len()
    }
}

/// Extend from `query[query_anchor]` / `haystack[haystack_anchor]` in
/// `direction`. For [`ExtendDirection::Left`] the anchors are exclusive ends.
pub fn xdrop_extend(
    query: &[u8],
    haystack: &[u8],
    query_anchor: usize,
    haystack_anchor: usize,
    direction: ExtendDirection,
    config: &BandedSwConfig,
) -> Extension {
    let (q_avail, h_avail) = match direction {
        ExtendDirection::Right => (
            query.len().saturating_sub(query_anchor),
            haystack.len().saturating_sub(haystack_anchor),
        ),
        ExtendDirection::Left => (query_anchor.min(query.len()), haystack_anchor.min(haystack.len())),
    };
    let q_at = |i: usize| match direction {
        ExtendDirection::Right => query[query_anchor + i],
        ExtendDirection::Left => query[query_anchor - 1 - i],
    };
    let h_at = |j: usize| match direction {
        ExtendDirection::Right => haystack[haystack_anchor + j],
        ExtendDirection::Left => haystack[haystack_anchor - 1 - j],
    };
    let gap = config.mismatch_indel;

    let mut best = 0i32;
    // farthest live cell: (row + column, score, row, column)
    let mut frontier = (0usize, 0i32, 0usize, 0usize);

    // row 0: haystack-only steps
    let mut first = DpRow {
        lo: 0,
        scores: vec![0],
        steps: vec![Step::Start],
    };
    for j in 1..=h_avail {
        let score = first.scores[j - 1] + gap;
        if score < best - config.x_drop {
            break;
        }
        first.scores.push(score);
        first.steps.push(Step::Left);
        frontier = frontier.max((j, score, 0, j));
    }
    let mut rows = vec![first];

    for i in 1..=q_avail {
        let prev = &rows[i - 1];
        let lo = prev.lo;
        let mut scores = Vec::with_capacity(prev.scores.len() + 1);
        let mut steps = Vec::with_capacity(prev.scores.len() + 1);
        let mut left = DEAD;

        let mut j = lo;
        while j <= h_avail {
            let diag = match j.checked_sub(1).map(|k| prev.score(k)) {
                Some(p) if p > DEAD => {
                    p + if q_at(i - 1) == h_at(j - 1) {
                        config.match_score
                    } else {
                        gap
                    }
                }
                _ => DEAD,
            };
            let up = match prev.score(j) {
                p if p > DEAD => p + gap,
                _ => DEAD,
            };
            let from_left = if left > DEAD { left + gap } else { DEAD };

            // on ties take the gap, pushing gaps out to the far end
            let (score, step) = if up >= diag && up >= from_left {
                (up, Step::Up)
            } else if from_left >= diag {
                (from_left, Step::Left)
            } else {
                (diag, Step::Diag)
            };

            let alive = score > DEAD && score >= best - config.x_drop;
            if !alive && j > prev.end() {
                break;
            }
            if alive {
                best = best.max(score);
                frontier = frontier.max((i + j, score, i, j));
                scores.push(score);
                left = score;
            } else {
                scores.push(DEAD);
                left = DEAD;
            }
            steps.push(step);
            j += 1;
        }

        let Some(head) = scores.iter().position(|&s| s > DEAD) else {
            break;
        };
        let tail = scores.iter().rposition(|&s| s > DEAD).unwrap_or(head);
        rows.push(DpRow {
            lo: lo + head,
            scores: scores[head..=tail].to_vec(),
            steps: steps[head..=tail].to_vec(),
        });
    }

    let (_, score, end_row, end_col) = frontier;
    let mut edit_script = Vec::with_capacity(end_row + end_col);
    let (mut i, mut j) = (end_row, end_col);
    while i > 0 || j > 0 {
        match rows.get(i).and_then(|row| row.step(j)) {
            Some(Step::Diag) => {
                edit_script.push(if q_at(i - 1) == h_at(j - 1) {
                    EditOp::Match
                } else {
                    EditOp::Mismatch
                });
                i -= 1;
                j -= 1;
            }
            Some(Step::Up) => {
                edit_script.push(EditOp::Ins);
                i -= 1;
            }
            Some(Step::Left) => {
                edit_script.push(EditOp::Del);
                j -= 1;
            }
            Some(Step::Start) | None => break,
        }
    }
    debug_assert!(i == 0 && j == 0, "extension traceback stopped at ({i}, {j})");

    // traceback runs from the far end towards the anchor
    if direction == ExtendDirection::Right {
        edit_script.reverse();
    }
    Extension {
        score,
        query_len: end_row,
        haystack_len: end_col,
        edit_script,
    }
}
