//! Per-query storage of verified matches with bounded size
//!
//! Matches are appended as they are verified. When a query collects more
//! than `compact_threshold` matches, duplicates are masked and only the
//! longest `max_kept` survive; past `disable_threshold` the query is given up
//! for the rest of the run.

use tracing::{debug, warn};

use super::matches::EpsMatch;

/// Size limits applied to every query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    /// A query with more stored matches than this is disabled
    pub disable_threshold: usize,
    /// Stored match count that triggers masking and compaction
    pub compact_threshold: usize,
    /// Matches kept per query after compaction
    pub max_kept: usize,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            disable_threshold: usize::MAX,
            compact_threshold: 500,
            max_kept: 50,
        }
    }
}

/// Whether `a` and `b` are the same match seen twice.
///
/// Matches whose query intervals stick out of each other by at least
/// `min_length` on both sides are distinct; otherwise they are duplicates
/// exactly when they start or end on the same diagonal. Comparing both ends
/// catches a match contained in another past an indel.
pub fn check_overlap(a: &EpsMatch, b: &EpsMatch, min_length: usize) -> bool {
    let (a_begin, a_end) = (a.begin2 as i64, a.end2 as i64);
    let (b_begin, b_end) = (b.begin2 as i64, b.end2 as i64);
    let min = min_length as i64;

    let staggered = if a_begin >= b_begin {
        a_end >= b_end && a_begin - b_begin >= min && a_end - b_end >= min
    } else {
        b_end >= a_end && b_begin - a_begin >= min && b_end - a_end >= min
    };
    !staggered && (a.diagonal() == b.diagonal() || a.end_diagonal() == b.end_diagonal())
}

/// Invalidate the shorter of every pair of duplicate matches.
///
/// Sorts `matches` by haystack begin. Invalid entries stay in place.
pub fn mask_overlaps(matches: &mut [EpsMatch], min_length: usize) {
    matches.sort_by_key(|m| (m.begin1, m.end1, m.begin2, m.end2));

    // matches that may still overlap later ones, by end1 descending
    let mut open: Vec<usize> = Vec::new();
    for i in 0..matches.len() {
        if !matches[i].is_valid() {
            continue;
        }

        // open matches containing this one in the haystack
        let mut k = 0;
        while k < open.len() && matches[open[k]].end1 >= matches[i].end1 {
            let o = open[k];
            if matches[o].is_valid() && check_overlap(&matches[i], &matches[o], min_length) {
                matches[i].invalidate();
            }
            k += 1;
        }
        let insert_pos = k;

        // open matches ending inside this one
        while k < open.len() && matches[open[k]].end1 > matches[i].begin1 {
            let o = open[k];
            // an invalidated match still masks shorter duplicates
            if matches[o].is_valid() && check_overlap(&matches[i], &matches[o], min_length) {
                if matches[i].alignment_len() > matches[o].alignment_len() {
                    matches[o].invalidate();
                } else {
                    matches[i].invalidate();
                }
            }
            k += 1;
        }

        // the rest end before this match begins, and so before any later one
        open.truncate(k);
        if matches[i].is_valid() {
            open.insert(insert_pos, i);
        }
    }
}

/// Drop invalid matches and keep at most `max_kept` of the longest valid ones
pub fn compact_matches(matches: &mut Vec<EpsMatch>, max_kept: usize) {
    matches.sort_by(|a, b| {
        b.is_valid()
            .cmp(&a.is_valid())
            .then_with(|| b.alignment_len().cmp(&a.alignment_len()))
    });
    let valid = matches.iter().take_while(|m| m.is_valid()).count();
    matches.truncate(valid.min(max_kept));
}

/// Matches of one query
#[derive(Debug, Clone)]
pub struct QueryMatches {
    matches: Vec<EpsMatch>,
    disabled: bool,
    compact_threshold: usize,
}

impl QueryMatches {
    pub fn new(limits: &StoreLimits) -> Self {
        Self {
            matches: Vec::new(),
            disabled: false,
            compact_threshold: limits.compact_threshold,
        }
    }

    /// Store a match; returns false once the query is disabled
    pub fn insert(&mut self, m: EpsMatch, min_length: usize, limits: &StoreLimits) -> bool {
        if self.disabled {
            return false;
        }
        self.matches.push(m);

        if self.matches.len() > limits.disable_threshold {
            self.disabled = true;
            self.matches = Vec::new();
            return false;
        }

        if self.matches.len() > self.compact_threshold {
            mask_overlaps(&mut self.matches, min_length);
            compact_matches(&mut self.matches, limits.max_kept);
            // dense but legitimate results: compact less often
            if self.matches.len() * 2 > self.compact_threshold {
                self.compact_threshold += self.compact_threshold / 2;
                debug!(
                    compact_threshold = self.compact_threshold,
                    "raised compaction threshold"
                );
            }
        }
        true
    }

    /// Mask duplicates and compact, unless the query is disabled
    pub fn finalize(&mut self, min_length: usize, max_kept: usize) {
        if self.disabled || self.matches.is_empty() {
            return;
        }
        mask_overlaps(&mut self.matches, min_length);
        compact_matches(&mut self.matches, max_kept);
    }

    pub fn matches(&self) -> &[EpsMatch] {
        &self.matches
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn compact_threshold(&self) -> usize {
        self.compact_threshold
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Match storage for every query of a run
#[derive(Debug, Clone)]
pub struct BoundedMatchStore {
    queries: Vec<QueryMatches>,
    limits: StoreLimits,
    min_length: usize,
}

impl BoundedMatchStore {
    pub fn new(num_queries: usize, min_length: usize, limits: StoreLimits) -> Self {
        Self {
            queries: vec![QueryMatches::new(&limits); num_queries],
            limits,
            min_length,
        }
    }

    /// Store a match for `query_id`; returns false if the query is or just
    /// became disabled
    pub fn insert_match(&mut self, query_id: usize, m: EpsMatch) -> bool {
        let query = &mut self.queries[query_id];
        let was_disabled = query.is_disabled();
        let stored = query.insert(m, self.min_length, &self.limits);
        if !was_disabled && query.is_disabled() {
            warn!(query_id, "too many matches, query disabled");
        }
        stored
    }

    pub fn matches_for(&self, query_id: usize) -> &[EpsMatch] {
        self.queries[query_id].matches()
    }

    pub fn is_disabled(&self, query_id: usize) -> bool {
        self.queries[query_id].is_disabled()
    }

    pub fn query(&self, query_id: usize) -> &QueryMatches {
        &self.queries[query_id]
    }

    /// All queries, for callers that fill them independently
    pub fn queries_mut(&mut self) -> &mut [QueryMatches] {
        &mut self.queries
    }

    pub fn limits(&self) -> &StoreLimits {
        &self.limits
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn num_queries(&self) -> usize {
        self.queries.len()
    }

    pub fn total_matches(&self) -> usize {
        self.queries.iter().map(QueryMatches::len).sum()
    }

    pub fn disabled_queries(&self) -> usize {
        self.queries.iter().filter(|q| q.is_disabled()).count()
    }

    /// Final duplicate removal and compaction for every enabled query
    pub fn finalize(&mut self) {
        for query in &mut self.queries {
            query.finalize(self.min_length, self.limits.max_kept);
        }
    }

    /// Forget all matches and re-enable every query
    pub fn reset(&mut self) {
        for query in &mut self.queries {
            *query = QueryMatches::new(&self.limits);
        }
    }
}
