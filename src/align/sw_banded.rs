use std::ops::Range;

use super::result::EditOp;
use super::traceback::{traceback, TracebackDir, TracebackMatrix};

/// Configuration for banded Smith-Waterman alignment
#[derive(Debug, Clone, Copy)]
pub struct BandedSwConfig {
    pub match_score: i32,
    /// Score of a mismatch or of one gap column (negative)
    pub mismatch_indel: i32,
    /// Score drop that splits a local alignment or stops an extension
    pub x_drop: i32,
}

/// Best local alignment found inside a band
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandedAlignment {
    pub score: i32,
    /// Query start position (0-based)
    pub query_begin: usize,
    /// Query end position (0-based, exclusive)
    pub query_end: usize,
    /// Haystack start position (0-based)
    pub haystack_begin: usize,
    /// Haystack end position (0-based, exclusive)
    pub haystack_end: usize,
    pub edit_script: Vec<EditOp>,
}

/// Best local alignment of `query[query_range]` against
/// `haystack[haystack_range]`, restricted to the given diagonals
/// (haystack position minus query position).
///
/// Ties prefer the later cell, so an alignment extends through errors that
/// cost nothing overall.
pub fn banded_local_alignment(
    query: &[u8],
    haystack: &[u8],
    query_range: Range<usize>,
    haystack_range: Range<usize>,
    diagonals: Range<i64>,
    config: &BandedSwConfig,
) -> Option<BandedAlignment> {
    BandAligner::new(query, haystack, query_range, haystack_range, diagonals)?.next_alignment(config, 1)
}

/// Local alignments scoring at least `min_score` inside the band, best
/// first, at most `limit` of them.
///
/// Cells on the path of a reported alignment cannot be used by later ones
/// (Waterman-Eggert declumping), so the alignments are disjoint.
pub fn banded_local_alignments(
    query: &[u8],
    haystack: &[u8],
    query_range: Range<usize>,
    haystack_range: Range<usize>,
    diagonals: Range<i64>,
    config: &BandedSwConfig,
    min_score: i32,
    limit: usize,
) -> Vec<BandedAlignment> {
    let Some(mut aligner) = BandAligner::new(query, haystack, query_range, haystack_range, diagonals)
    else {
        return Vec::new();
    };
    let mut found = Vec::new();
    while found.len() < limit {
        match aligner.next_alignment(config, min_score.max(1)) {
            Some(alignment) => found.push(alignment),
            None => break,
        }
    }
    found
}

/// DP state shared by successive local alignments in one band
struct BandAligner<'a> {
    query: &'a [u8],
    haystack: &'a [u8],
    q0: usize,
    rows: usize,
    band: usize,
    d_lo: i64,
    h_lo: i64,
    h_hi: i64,
    /// Cells taken by earlier alignments, `(rows + 1) * band`
    blocked: Vec<bool>,
}

impl<'a> BandAligner<'a> {
    fn new(
        query: &'a [u8],
        haystack: &'a [u8],
        query_range: Range<usize>,
        haystack_range: Range<usize>,
        diagonals: Range<i64>,
    ) -> Option<Self> {
        debug_assert!(query_range.end <= query.len() && haystack_range.end <= haystack.len());
        let band = (diagonals.end - diagonals.start).max(0) as usize;
        let rows = query_range.len();
        if band == 0 || rows == 0 || haystack_range.is_empty() {
            return None;
        }
        Some(Self {
            query,
            haystack,
            q0: query_range.start,
            rows,
            band,
            d_lo: diagonals.start,
            h_lo: haystack_range.start as i64,
            h_hi: haystack_range.end as i64,
            blocked: vec![false; (rows + 1) * band],
        })
    }

    /// Haystack position of band column `col` in DP row `row`
    #[inline]
    fn hay_pos(&self, row: usize, col: usize) -> i64 {
        (self.q0 + row) as i64 - 1 + self.d_lo + col as i64
    }

    fn next_alignment(&mut self, config: &BandedSwConfig, min_score: i32) -> Option<BandedAlignment> {
        let band = self.band;
        let mut h_prev = vec![0i32; band];
        let mut h_curr = vec![0i32; band];
        let mut traceback_matrix = TracebackMatrix::new(self.rows + 1, band);

        let mut best_score = 0i32;
        let mut best_row = 0usize;
        let mut best_col = 0usize;

        for row in 1..=self.rows {
            let q_idx = self.q0 + row - 1;

            for col in 0..band {
                let s_pos = self.hay_pos(row, col);
                if s_pos < self.h_lo || s_pos >= self.h_hi || self.blocked[row * band + col] {
                    h_curr[col] = 0;
                    continue;
                }

                let match_score = if self.query[q_idx] == self.haystack[s_pos as usize] {
                    config.match_score
                } else {
                    config.mismatch_indel
                };

                let diag = h_prev[col] + match_score;
                let up = if col + 1 < band {
                    h_prev[col + 1] + config.mismatch_indel
                } else {
                    i32::MIN / 2
                };
                let left = if col > 0 {
                    h_curr[col - 1] + config.mismatch_indel
                } else {
                    i32::MIN / 2
                };

                let (score, dir) = if diag >= up && diag >= left {
                    (diag, TracebackDir::Diag)
                } else if up >= left {
                    (up, TracebackDir::Up)
                } else {
                    (left, TracebackDir::Left)
                };

                if score <= 0 {
                    h_curr[col] = 0;
                    continue;
                }
                h_curr[col] = score;
                traceback_matrix.set(row, col, dir);

                if score >= best_score {
                    best_score = score;
                    best_row = row;
                    best_col = col;
                }
            }
            std::mem::swap(&mut h_curr, &mut h_prev);
        }

        if best_score < min_score {
            return None;
        }

        let (edit_script, start_row, start_col) =
            traceback(&traceback_matrix, best_row, best_col, |row, col| {
                self.query[self.q0 + row - 1] == self.haystack[self.hay_pos(row, col) as usize]
            });
        self.block_path(start_row, start_col, &edit_script);

        Some(BandedAlignment {
            score: best_score,
            query_begin: self.q0 + start_row,
            query_end: self.q0 + best_row,
            haystack_begin: (self.hay_pos(start_row, start_col) + 1) as usize,
            haystack_end: (self.hay_pos(best_row, best_col) + 1) as usize,
            edit_script,
        })
    }

    /// Mark every cell the alignment passes through after its start cell
    fn block_path(&mut self, mut row: usize, mut col: usize, edit_script: &[EditOp]) {
        for &op in edit_script {
            match op {
                EditOp::Match | EditOp::Mismatch => row += 1,
                EditOp::Ins => {
                    row += 1;
                    col -= 1;
                }
                EditOp::Del => col += 1,
            }
            self.blocked[row * self.band + col] = true;
        }
    }
}
