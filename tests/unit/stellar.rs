//! End-to-end search tests

use bio::alphabets::dna;

use stellar::config::VerificationStrategy;
use stellar::stellar::forward_interval;
use stellar::{run_stellar, EpsMatch, StellarOptions, Strand};

use super::helpers::{plant, random_dna, substitute};

fn coordinates(m: &EpsMatch) -> (usize, usize, usize, usize) {
    (m.begin1, m.end1, m.begin2, m.end2)
}

#[test]
fn test_exact_copy_forward() {
    let query = random_dna(120, 21);
    let haystack = plant(&query, 50, 30, 22);

    let result = run_stellar(&haystack, &[&query], &StellarOptions::default()).unwrap();
    let forward = result.store(Strand::Forward).unwrap();
    assert!(result.store(Strand::Reverse).is_none());

    let matches = forward.matches_for(0);
    assert_eq!(matches.len(), 1);
    assert_eq!(coordinates(&matches[0]), (50, 170, 0, 120));
    assert_eq!(matches[0].score, 120);
    assert!(result.filter_counters.hits() >= 1);
}

#[test]
fn test_match_with_mismatches() {
    let query = random_dna(120, 23);
    let mut planted = query.clone();
    substitute(&mut planted, &[30, 60, 90]);
    let haystack = plant(&planted, 200, 200, 24);

    for verification in [VerificationStrategy::Exact, VerificationStrategy::BestLocal] {
        let options = StellarOptions {
            verification,
            ..Default::default()
        };
        let result = run_stellar(&haystack, &[&query], &options).unwrap();
        let matches = result.forward.as_ref().unwrap().matches_for(0);
        assert_eq!(matches.len(), 1, "{:?}", verification);
        assert_eq!(coordinates(&matches[0]), (200, 320, 0, 120));
        assert_eq!(matches[0].stats().mismatches, 3);
    }
}

#[test]
fn test_reverse_strand() {
    let query = random_dna(120, 25);
    let haystack = plant(&dna::revcomp(&query), 80, 100, 26);
    let options = StellarOptions {
        reverse: true,
        ..Default::default()
    };

    let result = run_stellar(&haystack, &[&query], &options).unwrap();
    assert!(result.forward.as_ref().unwrap().matches_for(0).is_empty());

    let reverse = result.reverse.as_ref().unwrap().matches_for(0);
    assert_eq!(reverse.len(), 1);
    assert_eq!(forward_interval(&reverse[0], haystack.len()), 80..200);
    assert_eq!(result.total_matches(), 1);
}

#[test]
fn test_parallel_matches_serial() {
    let a = random_dna(110, 27);
    let b = random_dna(130, 28);
    let mut haystack = plant(&a, 60, 60, 29);
    haystack.extend(plant(&b, 10, 40, 30));
    haystack.extend_from_slice(&a);

    let serial = run_stellar(&haystack, &[&a, &b], &StellarOptions::default()).unwrap();
    let parallel_options = StellarOptions {
        parallel: true,
        ..Default::default()
    };
    let parallel = run_stellar(&haystack, &[&a, &b], &parallel_options).unwrap();

    let (s, p) = (serial.forward.unwrap(), parallel.forward.unwrap());
    for query_id in 0..2 {
        assert_eq!(s.matches_for(query_id), p.matches_for(query_id));
    }
    assert_eq!(s.matches_for(0).len(), 2);
    assert_eq!(s.matches_for(1).len(), 1);
}

#[test]
fn test_repetitive_query_disabled() {
    let query = random_dna(120, 31);
    let mut haystack = random_dna(30, 32);
    for copy in 0..4 {
        haystack.extend_from_slice(&query);
        haystack.extend(random_dna(50, 33 + copy));
    }
    let options = StellarOptions {
        disable_thresh: Some(2),
        ..Default::default()
    };

    let result = run_stellar(&haystack, &[&query], &options).unwrap();
    let forward = result.forward.as_ref().unwrap();
    assert!(forward.is_disabled(0));
    assert!(forward.matches_for(0).is_empty());
    assert_eq!(
        result.verification_counters.disabled_queries.load(std::sync::atomic::Ordering::Relaxed),
        1
    );
}

#[test]
fn test_num_matches_limit() {
    let query = random_dna(120, 41);
    let mut haystack = random_dna(30, 42);
    for copy in 0..4 {
        haystack.extend_from_slice(&query);
        haystack.extend(random_dna(50, 43 + copy));
    }
    let options = StellarOptions {
        num_matches: 2,
        compact_thresh: 3,
        ..Default::default()
    };

    let result = run_stellar(&haystack, &[&query], &options).unwrap();
    let matches = result.forward.as_ref().unwrap().matches_for(0);
    assert_eq!(matches.len(), 2);
    assert!(matches.iter().all(|m| m.end1 - m.begin1 == 120));
}

#[test]
fn test_short_query_is_skipped() {
    let long = random_dna(120, 51);
    let haystack = plant(&long, 20, 20, 52);
    let result = run_stellar(&haystack, &[&long[..8], &long[..]], &StellarOptions::default()).unwrap();
    let forward = result.forward.as_ref().unwrap();
    assert!(forward.matches_for(0).is_empty());
    assert_eq!(forward.matches_for(1).len(), 1);
}

#[test]
fn test_errors_spread_at_full_rate() {
    // five mismatches in 100 bases, no two within 19 bases of each other
    let query = random_dna(100, 61);
    let mut planted = query.clone();
    substitute(&mut planted, &[10, 30, 50, 70, 90]);
    let haystack = plant(&planted, 200, 200, 62);

    for verification in [VerificationStrategy::Exact, VerificationStrategy::BestLocal] {
        let options = StellarOptions {
            verification,
            ..Default::default()
        };
        let result = run_stellar(&haystack, &[&query], &options).unwrap();
        let matches = result.forward.as_ref().unwrap().matches_for(0);
        assert_eq!(matches.len(), 1, "{:?}", verification);
        assert_eq!(coordinates(&matches[0]), (200, 300, 0, 100));
        assert_eq!(matches[0].stats().mismatches, 5);
    }
}

/// Base differing from both neighbours of an insertion point
fn inserted_base(left: u8, right: u8) -> u8 {
    b"ACGT"
        .iter()
        .copied()
        .find(|&b| b != left && b != right)
        .unwrap()
}

#[test]
fn test_mixed_edits_at_full_rate() {
    let query = random_dna(100, 63);
    let mut planted = Vec::with_capacity(101);
    for (pos, &base) in query.iter().enumerate() {
        match pos {
            35 => continue,
            55 | 88 => {
                planted.push(inserted_base(query[pos - 1], base));
                planted.push(base);
            }
            _ => planted.push(base),
        }
    }
    substitute(&mut planted, &[15, 75]);
    assert_eq!(planted.len(), 101);
    let haystack = plant(&planted, 150, 150, 64);

    let result = run_stellar(&haystack, &[&query], &StellarOptions::default()).unwrap();
    let matches = result.forward.as_ref().unwrap().matches_for(0);
    assert_eq!(matches.len(), 1);
    assert_eq!(coordinates(&matches[0]), (150, 251, 0, 100));
    let stats = matches[0].stats();
    assert_eq!((stats.mismatches, stats.gaps), (2, 3));
}

#[test]
fn test_match_across_indels_reported_once() {
    // neighbouring buckets see the parts before and after each indel on
    // different diagonals
    let query = random_dna(300, 65);
    let mut planted = query[..100].to_vec();
    planted.extend_from_slice(&query[101..200]);
    planted.push(inserted_base(query[199], query[200]));
    planted.extend_from_slice(&query[200..]);
    assert_eq!(planted.len(), 300);
    let haystack = plant(&planted, 100, 100, 66);

    let result = run_stellar(&haystack, &[&query], &StellarOptions::default()).unwrap();
    let matches = result.forward.as_ref().unwrap().matches_for(0);
    assert_eq!(matches.len(), 1);
    assert_eq!(coordinates(&matches[0]), (100, 400, 0, 300));
    assert_eq!(matches[0].stats().gaps, 2);
    assert_eq!(matches[0].stats().mismatches, 0);
}
