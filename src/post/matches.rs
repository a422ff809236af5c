use crate::align::result::{EditOp, EditStats};

/// Soft-delete marker of a stored match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchStatus {
    #[default]
    Valid,
    Invalid,
}

/// Verified local alignment between the haystack (sequence 1) and a query
/// (sequence 2), with half-open coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpsMatch {
    pub begin1: usize,
    pub end1: usize,
    pub begin2: usize,
    pub end2: usize,
    pub score: i32,
    /// Alignment columns; may be empty when only coordinates are known
    pub edit_script: Vec<EditOp>,
    pub status: MatchStatus,
}

impl EpsMatch {
    pub fn new(begin1: usize, end1: usize, begin2: usize, end2: usize) -> Self {
        debug_assert!(begin1 <= end1 && begin2 <= end2);
        Self {
            begin1,
            end1,
            begin2,
            end2,
            score: 0,
            edit_script: Vec::new(),
            status: MatchStatus::Valid,
        }
    }

    pub fn with_alignment(mut self, score: i32, edit_script: Vec<EditOp>) -> Self {
        self.score = score;
        self.edit_script = edit_script;
        self
    }

    /// Number of alignment columns, or the longer of the two spans when no
    /// edit script is attached
    pub fn alignment_len(&self) -> usize {
        if self.edit_script.is_empty() {
            (self.end1 - self.begin1).max(self.end2 - self.begin2)
        } else {
            self.edit_script.len()
        }
    }

    /// Haystack position minus query position at the start of the match
    #[inline]
    pub fn diagonal(&self) -> i64 {
        self.begin1 as i64 - self.begin2 as i64
    }

    /// Diagonal of the last aligned column
    #[inline]
    pub fn end_diagonal(&self) -> i64 {
        self.end1 as i64 - self.end2 as i64
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.status == MatchStatus::Valid
    }

    #[inline]
    pub fn invalidate(&mut self) {
        self.status = MatchStatus::Invalid;
    }

    pub fn stats(&self) -> EditStats {
        EditStats::from_script(&self.edit_script)
    }

    /// Error rate of the alignment, 0 without an edit script
    pub fn error_rate(&self) -> f64 {
        let stats = self.stats();
        if stats.alignment_len == 0 {
            0.0
        } else {
            stats.errors() as f64 / stats.alignment_len as f64
        }
    }
}
