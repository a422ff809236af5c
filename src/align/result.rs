/// Edit operation for traceback
///
/// Rows of the alignment are query positions, columns haystack positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    /// Match (identical residues)
    Match,
    /// Mismatch (different residues)
    Mismatch,
    /// Insertion in query (gap in haystack)
    Ins,
    /// Deletion from query (gap in query)
    Del,
}

impl EditOp {
    #[inline]
    pub fn is_error(self) -> bool {
        self != EditOp::Match
    }

    /// Whether the operation consumes a haystack position
    #[inline]
    pub fn advances_haystack(self) -> bool {
        self != EditOp::Ins
    }

    /// Whether the operation consumes a query position
    #[inline]
    pub fn advances_query(self) -> bool {
        self != EditOp::Del
    }
}

/// Statistics computed from edit script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditStats {
    pub matches: usize,
    pub mismatches: usize,
    pub gaps: usize,
    pub gap_opens: usize,
    pub alignment_len: usize,
}

impl EditStats {
    pub fn from_script(edit_script: &[EditOp]) -> Self {
        let mut stats = EditStats {
            alignment_len: edit_script.len(),
            ..Default::default()
        };
        let mut prev_op: Option<EditOp> = None;

        for &op in edit_script {
            match op {
                EditOp::Match => stats.matches += 1,
                EditOp::Mismatch => stats.mismatches += 1,
                EditOp::Ins | EditOp::Del => {
                    stats.gaps += 1;
                    if prev_op != Some(op) {
                        stats.gap_opens += 1;
                    }
                }
            }
            prev_op = Some(op);
        }
        stats
    }

    /// Mismatches plus gap columns
    pub fn errors(&self) -> usize {
        self.mismatches + self.gaps
    }

    /// Percent identity
    pub fn identity(&self) -> f64 {
        if self.alignment_len == 0 {
            return 0.0;
        }
        100.0 * (self.matches as f64) / (self.alignment_len as f64)
    }
}
