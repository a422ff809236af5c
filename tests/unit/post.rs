//! Match store tests

use proptest::prelude::*;

use stellar::post::{
    compact_matches, mask_overlaps, BoundedMatchStore, EpsMatch, QueryMatches, StoreLimits,
};

fn arb_match() -> impl Strategy<Value = EpsMatch> {
    (0usize..400, 10usize..60, 0usize..80, 0usize..3)
        .prop_map(|(begin1, len, begin2, indel)| EpsMatch::new(begin1, begin1 + len, begin2, begin2 + len + indel))
}

#[test]
fn test_duplicates_from_overlapping_hits() {
    // the same match verified from two neighbouring buckets
    let mut store = BoundedMatchStore::new(1, 30, StoreLimits::default());
    for _ in 0..2 {
        assert!(store.insert_match(0, EpsMatch::new(50, 170, 0, 120)));
    }
    store.insert_match(0, EpsMatch::new(60, 170, 10, 120));
    store.insert_match(0, EpsMatch::new(1000, 1120, 0, 120));
    store.finalize();

    let matches = store.matches_for(0);
    assert_eq!(matches.len(), 2);
    assert!(matches.contains(&EpsMatch::new(50, 170, 0, 120)));
    assert!(matches.contains(&EpsMatch::new(1000, 1120, 0, 120)));
}

#[test]
fn test_suffix_after_indel_is_masked() {
    // the second match is the tail of the first, entered one diagonal
    // off because the first crosses a deletion before position 60
    let mut store = BoundedMatchStore::new(1, 30, StoreLimits::default());
    store.insert_match(0, EpsMatch::new(0, 101, 0, 100));
    store.insert_match(0, EpsMatch::new(60, 101, 59, 100));
    store.finalize();
    assert_eq!(store.matches_for(0), &[EpsMatch::new(0, 101, 0, 100)]);
}

#[test]
fn test_disabled_query_stays_empty() {
    let limits = StoreLimits {
        disable_threshold: 5,
        compact_threshold: 100,
        max_kept: 10,
    };
    let mut store = BoundedMatchStore::new(3, 10, limits);
    let mut accepted = 0;
    for i in 0..10 {
        if store.insert_match(2, EpsMatch::new(i * 100, i * 100 + 50, 0, 50)) {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 5);
    assert!(store.is_disabled(2));
    store.finalize();
    assert!(store.matches_for(2).is_empty());
    assert_eq!(store.disabled_queries(), 1);
    assert_eq!(store.total_matches(), 0);
}

#[test]
fn test_distinct_matches_on_one_diagonal() {
    // staggered by more than min_length on both ends: both kept
    let mut matches = vec![EpsMatch::new(0, 100, 0, 100), EpsMatch::new(60, 160, 60, 160)];
    mask_overlaps(&mut matches, 50);
    assert!(matches.iter().all(EpsMatch::is_valid));

    let mut matches = vec![EpsMatch::new(0, 100, 0, 100), EpsMatch::new(20, 160, 20, 160)];
    mask_overlaps(&mut matches, 50);
    assert_eq!(matches.iter().filter(|m| m.is_valid()).count(), 1);
    assert_eq!(matches.iter().find(|m| m.is_valid()).unwrap().end1, 160);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_mask_and_compact_is_idempotent(
        input in prop::collection::vec(arb_match(), 0..40),
        max_kept in 1usize..20,
    ) {
        let mut once = input;
        mask_overlaps(&mut once, 10);
        compact_matches(&mut once, max_kept);

        prop_assert!(once.len() <= max_kept);
        prop_assert!(once.iter().all(EpsMatch::is_valid));
        prop_assert!(once.windows(2).all(|w| w[0].alignment_len() >= w[1].alignment_len()));

        let mut twice = once.clone();
        mask_overlaps(&mut twice, 10);
        compact_matches(&mut twice, max_kept);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_enabled_query_stays_bounded(
        input in prop::collection::vec(arb_match(), 0..200),
        compact in 5usize..30,
    ) {
        let limits = StoreLimits {
            disable_threshold: 150,
            compact_threshold: compact,
            max_kept: 5,
        };
        let mut query = QueryMatches::new(&limits);
        for m in input {
            let stored = query.insert(m, 10, &limits);
            if query.is_disabled() {
                prop_assert!(!stored);
                prop_assert!(query.is_empty());
            } else {
                prop_assert!(stored);
                prop_assert!(query.len() <= query.compact_threshold());
            }
        }
    }
}
