//! Low-complexity repeat detection
//!
//! The filter never counts q-grams inside a repeat, and never counts a q-gram
//! that straddles a repeat boundary.

use std::ops::Range;

/// Source of haystack intervals to exclude from filtering
pub trait RepeatFinder {
    /// Sorted, disjoint `[begin, end)` intervals
    fn find_repeats(&self, haystack: &[u8]) -> Vec<Range<usize>>;
}

/// Finds nothing; every position is scanned
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRepeats;

impl RepeatFinder for NoRepeats {
    fn find_repeats(&self, _haystack: &[u8]) -> Vec<Range<usize>> {
        Vec::new()
    }
}

/// Maximal runs with a period of at most `max_period` and a length of at
/// least `min_length`, e.g. poly-A tails or dinucleotide repeats.
#[derive(Debug, Clone, Copy)]
pub struct PeriodicRepeatFinder {
    pub min_length: usize,
    pub max_period: usize,
}

impl Default for PeriodicRepeatFinder {
    fn default() -> Self {
        Self {
            min_length: 1000,
            max_period: 1,
        }
    }
}

impl RepeatFinder for PeriodicRepeatFinder {
    fn find_repeats(&self, haystack: &[u8]) -> Vec<Range<usize>> {
        let len = haystack.len();
        let mut found = Vec::new();
        for period in 1..=self.max_period.min(len.saturating_sub(1)) {
            let mut run_start = None;
            for i in period..=len {
                let continues = i < len
                    && haystack[i].eq_ignore_ascii_case(&haystack[i - period]);
                match (continues, run_start) {
                    (true, None) => run_start = Some(i - period),
                    (false, Some(start)) => {
                        if i - start >= self.min_length.max(period + 1) {
                            found.push(start..i);
                        }
                        run_start = None;
                    }
                    _ => {}
                }
            }
        }
        merge_ranges(found)
    }
}

/// Sort and merge overlapping or touching intervals
pub fn merge_ranges(mut ranges: Vec<Range<usize>>) -> Vec<Range<usize>> {
    ranges.retain(|r| r.start < r.end);
    ranges.sort_by_key(|r| (r.start, r.end));
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for r in ranges {
        match merged.last_mut() {
            Some(last) if r.start <= last.end => last.end = last.end.max(r.end),
            _ => merged.push(r),
        }
    }
    merged
}

/// Complement of `repeats` within `0..len`, keeping only gaps of at least
/// `min_len` positions
pub fn non_repeat_ranges(len: usize, repeats: &[Range<usize>], min_len: usize) -> Vec<Range<usize>> {
    let clipped = repeats
        .iter()
        .map(|r| r.start.min(len)..r.end.min(len))
        .collect();
    let mut ranges = Vec::new();
    let mut begin = 0;
    for repeat in merge_ranges(clipped) {
        if repeat.start >= begin + min_len.max(1) {
            ranges.push(begin..repeat.start);
        }
        begin = repeat.end;
    }
    if len >= begin + min_len.max(1) {
        ranges.push(begin..len);
    }
    ranges
}
