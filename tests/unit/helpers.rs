//! Test utilities: deterministic sequences and filter setup

use stellar::config::{FilterMode, SwiftParameters};
use stellar::seed::{QGramIndex, Shape};
use stellar::swift::{Hit, SwiftFilter};

/// Pseudo-random DNA from a 64-bit LCG
pub fn random_dna(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed.wrapping_add(0x9E3779B97F4A7C15);
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            b"ACGT"[(state >> 62) as usize]
        })
        .collect()
}

/// Replace the base at each position with a different one
pub fn substitute(seq: &mut [u8], positions: &[usize]) {
    for &pos in positions {
        seq[pos] = if seq[pos] == b'A' { b'C' } else { b'A' };
    }
}

/// Edit applied to a sequence by [`apply_edits`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Substitute,
    /// Insert a base before the position
    Insert(u8),
    Delete,
}

/// Apply `edits` at positions of the original `seq`; at most one edit per
/// position is kept
pub fn apply_edits(seq: &[u8], edits: &[(usize, Edit)]) -> Vec<u8> {
    let mut edits = edits.to_vec();
    edits.sort_by(|a, b| b.0.cmp(&a.0));
    edits.dedup_by_key(|e| e.0);

    // highest position first keeps the lower positions in place
    let mut out = seq.to_vec();
    for (pos, edit) in edits {
        match edit {
            Edit::Substitute => substitute(&mut out, &[pos]),
            Edit::Insert(base) => out.insert(pos, base),
            Edit::Delete => {
                out.remove(pos);
            }
        }
    }
    out
}

/// `left` random bases, then `insert`, then `right` random bases
pub fn plant(insert: &[u8], left: usize, right: usize, seed: u64) -> Vec<u8> {
    let mut haystack = random_dna(left, seed);
    haystack.extend_from_slice(insert);
    haystack.extend(random_dna(right, seed ^ 0xABCD));
    haystack
}

pub fn filter_for<S: AsRef<[u8]>>(queries: &[S], q: usize, mode: FilterMode) -> SwiftFilter<QGramIndex> {
    filter_with(queries, q, mode, SwiftParameters::default())
}

pub fn filter_with<S: AsRef<[u8]>>(
    queries: &[S],
    q: usize,
    mode: FilterMode,
    params: SwiftParameters,
) -> SwiftFilter<QGramIndex> {
    let index = QGramIndex::new(queries, Shape::ungapped(q).unwrap());
    SwiftFilter::new(index, mode, params)
}

pub fn collect_hits(
    filter: &mut SwiftFilter<QGramIndex>,
    haystack: &[u8],
    error_rate: f64,
    min_length: usize,
) -> Vec<Hit> {
    filter
        .scan(haystack, &[], error_rate, min_length)
        .unwrap()
        .collect()
}
