//! Diagnostic counters for the filter and verification stages
//!
//! Enabled via the STELLAR_DIAGNOSTICS environment variable. The filter keeps
//! plain counters (it is single-threaded); verification may run on several
//! threads and uses atomics.

use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

/// Check if diagnostics are enabled via environment variable
pub fn diagnostics_enabled() -> bool {
    std::env::var("STELLAR_DIAGNOSTICS")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false)
}

/// Counters collected while scanning one or more haystacks
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterCounters {
    pub qgrams: usize,
    pub occurrences: usize,
    pub bucket_resets: usize,
    pub taboo_skips: usize,
    /// Semiglobal hits reported when a bucket reached its threshold
    pub eager_hits: usize,
    /// Local hits reported when a bucket was recycled
    pub stale_hits: usize,
    /// Local hits reported at the end of a scan
    pub flushed_hits: usize,
}

impl FilterCounters {
    pub fn hits(&self) -> usize {
        self.eager_hits + self.stale_hits + self.flushed_hits
    }

    pub fn merge(&mut self, other: &FilterCounters) {
        self.qgrams += other.qgrams;
        self.occurrences += other.occurrences;
        self.bucket_resets += other.bucket_resets;
        self.taboo_skips += other.taboo_skips;
        self.eager_hits += other.eager_hits;
        self.stale_hits += other.stale_hits;
        self.flushed_hits += other.flushed_hits;
    }
}

/// Counters for verification and match storage
#[derive(Default)]
pub struct VerificationCounters {
    pub verified_hits: AtomicUsize,
    /// Hits dropped because their query was already disabled
    pub skipped_hits: AtomicUsize,
    pub eps_matches: AtomicUsize,
    pub inserted_matches: AtomicUsize,
    pub disabled_queries: AtomicUsize,
}

impl VerificationCounters {
    pub fn add(counter: &AtomicUsize, n: usize) {
        counter.fetch_add(n, AtomicOrdering::Relaxed);
    }

    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(AtomicOrdering::Relaxed)
    }
}

/// Print a summary of all counters to stderr
pub fn print_summary(filter: &FilterCounters, verification: &VerificationCounters) {
    eprintln!("\n=== STELLAR Diagnostics ===");
    eprintln!("Filter Stage:");
    eprintln!("  Q-grams scanned:            {}", filter.qgrams);
    eprintln!("  Q-gram occurrences:         {}", filter.occurrences);
    eprintln!("  Bucket resets:              {}", filter.bucket_resets);
    eprintln!("  Taboo skips:                {}", filter.taboo_skips);
    eprintln!("  Hits (threshold reached):   {}", filter.eager_hits);
    eprintln!("  Hits (bucket recycled):     {}", filter.stale_hits);
    eprintln!("  Hits (end of scan):         {}", filter.flushed_hits);
    eprintln!("Verification Stage:");
    eprintln!(
        "  Hits verified:              {}",
        VerificationCounters::get(&verification.verified_hits)
    );
    eprintln!(
        "  Hits skipped (disabled):    {}",
        VerificationCounters::get(&verification.skipped_hits)
    );
    eprintln!(
        "  Eps-matches found:          {}",
        VerificationCounters::get(&verification.eps_matches)
    );
    eprintln!(
        "  Matches stored:             {}",
        VerificationCounters::get(&verification.inserted_matches)
    );
    eprintln!(
        "  Queries disabled:           {}",
        VerificationCounters::get(&verification.disabled_queries)
    );
}
