//! Filter tests through the public API

use proptest::prelude::*;

use stellar::config::FilterMode;
use stellar::seed::{QGramIndex, Shape};
use stellar::swift::{Hit, SwiftFilter};
use stellar::SwiftParameters;

use super::helpers::{
    apply_edits, collect_hits, filter_for, filter_with, plant, random_dna, substitute, Edit,
};

#[test]
fn test_two_copies_of_query() {
    let mut filter = filter_for(&[b"AACCGGTT"], 4, FilterMode::local());
    let hits = collect_hits(&mut filter, b"AACCGGTTAACCGGTT", 0.0, 8);

    let mut begins: Vec<i64> = hits.iter().map(|h| h.haystack_begin).collect();
    begins.sort_unstable();
    assert_eq!(begins, vec![0, 8]);
}

#[test]
fn test_planted_match_with_substitutions() {
    let query = random_dna(80, 1);
    let mut planted = query.clone();
    substitute(&mut planted, &[20, 50]);
    let haystack = plant(&planted, 300, 200, 2);

    let mut filter = filter_for(&[&query], 8, FilterMode::local());
    let hits = collect_hits(&mut filter, &haystack, 0.05, 60);

    let hit = hits
        .iter()
        .find(|h| h.diagonals().contains(&300))
        .expect("planted match was not reported");
    let window = hit.haystack_window(haystack.len());
    assert!(window.start <= 300 && window.end >= 380 - 8);
}

#[test]
fn test_semiglobal_reports_whole_query() {
    let query = random_dna(60, 3);
    let mut planted = query.clone();
    substitute(&mut planted, &[10, 45]);
    let haystack = plant(&planted, 150, 150, 4);

    let mut filter = filter_for(&[&query], 8, FilterMode::semiglobal());
    let hits = collect_hits(&mut filter, &haystack, 0.05, 60);

    let hit = hits
        .iter()
        .find(|h| h.diagonals().contains(&150))
        .expect("planted match was not reported");
    assert_eq!(hit.query_begin, 0);
    assert_eq!(hit.height, 60);
    assert_eq!(hit.query_window(60), 0..60);
    assert_eq!(filter.counters().flushed_hits, 0);
}

#[test]
fn test_gapped_shape() {
    let query = random_dna(50, 5);
    let haystack = plant(&query, 100, 100, 6);
    let index = QGramIndex::new(&[&query], Shape::gapped("11011").unwrap());
    let mut filter = SwiftFilter::new(index, FilterMode::local(), SwiftParameters::default());

    let hits = collect_hits(&mut filter, &haystack, 0.05, 40);
    assert!(hits.iter().any(|h| h.diagonals().contains(&100)));
}

#[test]
fn test_reused_filter_matches_fresh_filter() {
    let query = random_dna(70, 7);
    let first = plant(&query, 500, 10, 8);
    let second = plant(&query, 40, 300, 9);

    let mut reused = filter_for(&[&query], 8, FilterMode::local());
    collect_hits(&mut reused, &first, 0.05, 50);
    let again = collect_hits(&mut reused, &second, 0.05, 50);

    let mut fresh = filter_for(&[&query], 8, FilterMode::local());
    let expected = collect_hits(&mut fresh, &second, 0.05, 50);
    assert_eq!(again, expected);
    assert!(!expected.is_empty());
}

#[test]
fn test_multiple_queries() {
    let a = random_dna(60, 10);
    let b = random_dna(60, 11);
    let mut haystack = plant(&a, 100, 100, 12);
    haystack.extend_from_slice(&b);

    let mut filter = filter_for(&[&a, &b], 8, FilterMode::local());
    let hits = collect_hits(&mut filter, &haystack, 0.05, 50);
    assert!(hits.iter().any(|h| h.query_id == 0 && h.diagonals().contains(&100)));
    assert!(hits.iter().any(|h| h.query_id == 1 && h.diagonals().contains(&260)));
}

/// Edits of at most `allowed` positions inside `region`
fn pick_edits(
    picks: &[(prop::sample::Index, u8, u8)],
    region: std::ops::Range<usize>,
    allowed: usize,
) -> Vec<(usize, Edit)> {
    picks
        .iter()
        .take(allowed)
        .map(|(at, kind, base)| {
            let pos = region.start + at.index(region.len());
            let edit = match kind % 3 {
                0 => Edit::Substitute,
                1 => Edit::Insert(b"ACGT"[*base as usize % 4]),
                _ => Edit::Delete,
            };
            (pos, edit)
        })
        .collect()
}

/// Some hit of query 0 is counted on a diagonal within `spread` of `diagonal`
fn covers_diagonal(hits: &[Hit], diagonal: i64, spread: usize) -> bool {
    let spread = spread as i64;
    hits.iter().any(|h| {
        let d = h.diagonals();
        h.query_id == 0 && d.start <= diagonal + spread && d.end > diagonal - spread
    })
}

fn edit_strategy() -> impl Strategy<Value = Vec<(prop::sample::Index, u8, u8)>> {
    prop::collection::vec((any::<prop::sample::Index>(), any::<u8>(), any::<u8>()), 0..8)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any match of at least min_length with at most floor(eps * min_length)
    /// edits is reported
    #[test]
    fn prop_local_filter_has_no_false_negatives(
        qlen in 50usize..120,
        min_share in 0.4f64..=1.0,
        start in any::<prop::sample::Index>(),
        error_rate in prop::sample::select(vec![0.0, 0.03, 0.05, 0.08]),
        q in 4usize..=8,
        left in 0usize..120,
        right in 0usize..120,
        seed in any::<u64>(),
        picks in edit_strategy(),
        stellar_params in any::<bool>(),
    ) {
        let min_length = ((qlen as f64 * min_share) as usize).clamp(30, qlen);
        let begin = start.index(qlen - min_length + 1);
        let allowed = (error_rate * min_length as f64).floor() as usize;

        let query = random_dna(qlen, seed);
        let edits = pick_edits(&picks, begin..begin + min_length, allowed);
        let planted = apply_edits(&query, &edits);
        let haystack = plant(&planted, left, right, seed.rotate_left(17));

        let params = if stellar_params { SwiftParameters::stellar() } else { SwiftParameters::default() };
        let mut filter = filter_with(&[&query], q, FilterMode::local(), params);
        let hits = collect_hits(&mut filter, &haystack, error_rate, min_length);
        prop_assert!(
            covers_diagonal(&hits, left as i64, edits.len()),
            "no hit near diagonal {} with edits {:?} among {:?}", left, edits, hits
        );
    }

    #[test]
    fn prop_semiglobal_filter_has_no_false_negatives(
        qlen in 40usize..80,
        error_rate in prop::sample::select(vec![0.0, 0.03, 0.05, 0.08]),
        q in 4usize..=8,
        left in 0usize..100,
        seed in any::<u64>(),
        picks in edit_strategy(),
        stellar_params in any::<bool>(),
    ) {
        let allowed = (error_rate * qlen as f64).floor() as usize;
        let query = random_dna(qlen, seed);
        let edits = pick_edits(&picks, 0..qlen, allowed);
        let planted = apply_edits(&query, &edits);
        let haystack = plant(&planted, left, 30, seed ^ 0x5555);

        let params = if stellar_params { SwiftParameters::stellar() } else { SwiftParameters::default() };
        let mut filter = filter_with(&[&query], q, FilterMode::semiglobal(), params);
        let hits = collect_hits(&mut filter, &haystack, error_rate, qlen);
        prop_assert!(covers_diagonal(&hits, left as i64, edits.len()));
    }
}
