//! STELLAR pipeline
//!
//! Scans the haystack with the SWIFT filter, verifies every hit and keeps the
//! best matches of each query in a [`BoundedMatchStore`], once per strand.
//! Hits of one query are always verified in order; with `parallel` set,
//! different queries are verified on the rayon thread pool.

use std::ops::Range;

use anyhow::{Context, Result};
use bio::alphabets::dna;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::align::{BandedLocalVerifier, VerificationWindow, Verifier};
use crate::config::{FilterMode, StellarOptions, VerificationScoring};
use crate::diagnostics::{diagnostics_enabled, print_summary, FilterCounters, VerificationCounters};
use crate::post::{BoundedMatchStore, EpsMatch, QueryMatches, StoreLimits};
use crate::seed::{OccurrenceSource, QGramIndex, Shape};
use crate::swift::{Hit, SwiftFilter};
use crate::utils::repeats::{PeriodicRepeatFinder, RepeatFinder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Forward,
    /// Reverse complement of the haystack
    Reverse,
}

/// Matches and counters of one run
pub struct StellarResult {
    /// Matches against the haystack as given
    pub forward: Option<BoundedMatchStore>,
    /// Matches against the reverse complement, in its coordinates
    pub reverse: Option<BoundedMatchStore>,
    pub filter_counters: FilterCounters,
    pub verification_counters: VerificationCounters,
}

impl StellarResult {
    pub fn store(&self, strand: Strand) -> Option<&BoundedMatchStore> {
        match strand {
            Strand::Forward => self.forward.as_ref(),
            Strand::Reverse => self.reverse.as_ref(),
        }
    }

    pub fn total_matches(&self) -> usize {
        self.forward
            .iter()
            .chain(self.reverse.iter())
            .map(BoundedMatchStore::total_matches)
            .sum()
    }
}

/// Forward-strand haystack interval of a match found on the reverse strand
pub fn forward_interval(m: &EpsMatch, haystack_len: usize) -> Range<usize> {
    haystack_len - m.end1..haystack_len - m.begin1
}

/// Search `queries` in `haystack` with an ungapped q-gram index, the banded
/// verifier and periodic repeat masking
pub fn run_stellar<S: AsRef<[u8]>>(
    haystack: &[u8],
    queries: &[S],
    options: &StellarOptions,
) -> Result<StellarResult> {
    options.validate().context("invalid STELLAR options")?;
    let shape = Shape::ungapped(options.kmer).context("invalid q-gram shape")?;
    let index = QGramIndex::new(queries, shape);
    let verifier = BandedLocalVerifier::new(options.verification);
    let repeat_finder = PeriodicRepeatFinder {
        min_length: options.repeat_length,
        max_period: options.repeat_period,
    };
    run_stellar_with(haystack, index, options, &verifier, &repeat_finder)
}

/// Search with a prebuilt index and custom verification and repeat masking
pub fn run_stellar_with<V, R>(
    haystack: &[u8],
    mut index: QGramIndex,
    options: &StellarOptions,
    verifier: &V,
    repeat_finder: &R,
) -> Result<StellarResult>
where
    V: Verifier + ?Sized,
    R: RepeatFinder + ?Sized,
{
    options.validate().context("invalid STELLAR options")?;
    if options.abundance_cut < 1.0 {
        index.apply_abundance_cut(options.abundance_cut);
    }
    info!(
        queries = index.num_queries(),
        qgrams = index.num_qgrams(),
        haystack_len = haystack.len(),
        "starting search"
    );

    let mut filter = SwiftFilter::new(index, FilterMode::local(), options.swift_parameters());
    filter
        .configure(options.epsilon, options.min_length)
        .context("failed to derive filter parameters")?;

    let counters = VerificationCounters::default();
    let run = StrandSearch {
        options,
        scoring: options.scoring(),
        limits: options.store_limits(),
        verifier,
        counters: &counters,
    };

    let forward = if options.forward {
        Some(run.search(&mut filter, haystack, repeat_finder, Strand::Forward)?)
    } else {
        None
    };
    let reverse = if options.reverse {
        let revcomp = dna::revcomp(haystack);
        Some(run.search(&mut filter, &revcomp, repeat_finder, Strand::Reverse)?)
    } else {
        None
    };

    let filter_counters = *filter.counters();
    if diagnostics_enabled() {
        print_summary(&filter_counters, &counters);
    }

    let result = StellarResult {
        forward,
        reverse,
        filter_counters,
        verification_counters: counters,
    };
    info!(
        matches = result.total_matches(),
        hits = filter_counters.hits(),
        "search finished"
    );
    Ok(result)
}

struct StrandSearch<'a, V: ?Sized> {
    options: &'a StellarOptions,
    scoring: VerificationScoring,
    limits: StoreLimits,
    verifier: &'a V,
    counters: &'a VerificationCounters,
}

impl<V: Verifier + ?Sized> StrandSearch<'_, V> {
    fn search<R: RepeatFinder + ?Sized>(
        &self,
        filter: &mut SwiftFilter<QGramIndex>,
        haystack: &[u8],
        repeat_finder: &R,
        strand: Strand,
    ) -> Result<BoundedMatchStore> {
        let repeats = repeat_finder.find_repeats(haystack);
        let num_queries = filter.index().num_queries();
        let mut store = BoundedMatchStore::new(num_queries, self.options.min_length, self.limits);

        let mut scan = filter
            .scan(haystack, &repeats, self.options.epsilon, self.options.min_length)
            .with_context(|| format!("failed to start scanning the {:?} strand", strand))?;

        if self.options.parallel {
            let mut hits: Vec<Vec<Hit>> = vec![Vec::new(); num_queries];
            for hit in scan.by_ref() {
                hits[hit.query_id].push(hit);
            }
            drop(scan);

            let index = filter.index();
            store
                .queries_mut()
                .par_iter_mut()
                .zip(hits.par_iter())
                .enumerate()
                .try_for_each(|(query_id, (matches, hits))| {
                    let query = index.query(query_id);
                    hits.iter()
                        .try_for_each(|hit| self.verify_hit(matches, hit, haystack, query))
                })?;
        } else {
            while let Some(hit) = scan.poll() {
                let query = scan.index().query(hit.query_id);
                self.verify_hit(&mut store.queries_mut()[hit.query_id], &hit, haystack, query)?;
            }
        }

        store.finalize();
        info!(
            strand = ?strand,
            matches = store.total_matches(),
            disabled = store.disabled_queries(),
            repeats = repeats.len(),
            "strand finished"
        );
        Ok(store)
    }

    fn verify_hit(
        &self,
        matches: &mut QueryMatches,
        hit: &Hit,
        haystack: &[u8],
        query: &[u8],
    ) -> Result<()> {
        if matches.is_disabled() {
            VerificationCounters::add(&self.counters.skipped_hits, 1);
            return Ok(());
        }

        let window = VerificationWindow::from_hit(hit, haystack.len(), query.len());
        let found = self
            .verifier
            .verify(
                haystack,
                query,
                &window,
                self.options.epsilon,
                self.options.min_length,
                &self.scoring,
            )
            .with_context(|| {
                format!(
                    "failed to verify hit of query {} at haystack position {}",
                    hit.query_id, hit.haystack_begin
                )
            })?;
        VerificationCounters::add(&self.counters.verified_hits, 1);
        VerificationCounters::add(&self.counters.eps_matches, found.len());

        for m in found {
            if matches.insert(m, self.options.min_length, &self.limits) {
                VerificationCounters::add(&self.counters.inserted_matches, 1);
            } else {
                VerificationCounters::add(&self.counters.disabled_queries, 1);
                warn!(query_id = hit.query_id, "too many matches, query disabled");
                break;
            }
        }
        Ok(())
    }
}
