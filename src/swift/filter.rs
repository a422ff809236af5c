//! Streaming SWIFT filter
//!
//! [`SwiftFilter`] owns the q-gram index and the bucket ring; each call to
//! [`SwiftFilter::scan`] starts a resumable scan over one haystack that yields
//! [`Hit`]s one at a time. Bucket state survives between scans and is
//! invalidated by advancing the epoch base instead of clearing the array.

use std::ops::Range;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use super::buckets::{cycle_origin, Bucket, BucketRing, BucketSlot};
use super::hit::Hit;
use super::params::{validate_error_rate, BucketParams};
use crate::config::{FilterMode, SwiftParameters};
use crate::diagnostics::FilterCounters;
use crate::error::{Result, SwiftError};
use crate::seed::{OccurrenceSource, QGramHasher, QGramOccurrence};
use crate::utils::repeats::non_repeat_ranges;

/// Haystack positions between progress bar updates
const PROGRESS_STEP: usize = 100_000;

pub struct SwiftFilter<I> {
    index: I,
    core: FilterCore,
}

/// Everything except the index, so the index can be read while buckets are
/// updated
struct FilterCore {
    mode: FilterMode,
    params: SwiftParameters,
    span: usize,
    query_lens: Vec<usize>,
    ring: BucketRing,
    /// (error rate, min length) the ring was built for
    configured: Option<(f64, usize)>,
    rejected: Vec<SwiftError>,
    max_delta: usize,
    counters: FilterCounters,
}

impl<I: OccurrenceSource> SwiftFilter<I> {
    pub fn new(index: I, mode: FilterMode, params: SwiftParameters) -> Self {
        let span = index.shape().span();
        let query_lens = (0..index.num_queries()).map(|q| index.query_len(q)).collect();
        Self {
            index,
            core: FilterCore {
                mode,
                params,
                span,
                query_lens,
                ring: BucketRing::default(),
                configured: None,
                rejected: Vec::new(),
                max_delta: 0,
                counters: FilterCounters::default(),
            },
        }
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn mode(&self) -> FilterMode {
        self.core.mode
    }

    pub fn parameters(&self) -> &SwiftParameters {
        &self.core.params
    }

    /// Parameters of `query` for the current configuration, None if the
    /// query was rejected or no scan has been set up yet
    pub fn bucket_params(&self, query: usize) -> Option<&BucketParams> {
        self.core.ring.params(query)
    }

    /// Per-query setup errors of the current configuration
    pub fn rejected_queries(&self) -> &[SwiftError] {
        &self.core.rejected
    }

    pub fn counters(&self) -> &FilterCounters {
        &self.core.counters
    }

    /// Reset all buckets and epoch offsets
    pub fn clear(&mut self) {
        self.core.ring.clear();
    }

    /// Raise the bucket threshold of one query
    pub fn set_min_threshold(&mut self, query: usize, threshold: usize) {
        self.core.ring.set_min_threshold(query, threshold);
    }

    /// Derive bucket parameters for `(error_rate, min_length)`.
    ///
    /// Nothing is recomputed if the configuration is unchanged. Queries
    /// shorter than the shape are excluded and listed in
    /// [`rejected_queries`](Self::rejected_queries).
    pub fn configure(&mut self, error_rate: f64, min_length: usize) -> Result<()> {
        let shape = self.index.shape();
        validate_error_rate(error_rate, shape)?;
        if !self.core.mode.diagonal && !self.core.mode.semiglobal {
            return Err(SwiftError::InvalidOption(
                "rectangular buckets require semiglobal filtering".into(),
            ));
        }
        if self.core.configured == Some((error_rate, min_length)) {
            return Ok(());
        }

        let core = &mut self.core;
        core.rejected.clear();
        let mut params = Vec::with_capacity(core.query_lens.len());
        for (query_id, &len) in core.query_lens.iter().enumerate() {
            if len < core.span {
                warn!(query_id, len, span = core.span, "query shorter than q-gram, skipped");
                core.rejected.push(SwiftError::QueryShorterThanShape {
                    query_id,
                    len,
                    span: core.span,
                });
                params.push(None);
            } else {
                params.push(Some(BucketParams::derive(
                    len,
                    shape,
                    error_rate,
                    min_length,
                    core.mode,
                    &core.params,
                )));
            }
        }
        core.max_delta = params.iter().flatten().map(|p| p.delta).max().unwrap_or(0);
        core.ring = BucketRing::new(params);
        core.configured = Some((error_rate, min_length));
        debug!(
            error_rate,
            min_length,
            queries = core.query_lens.len(),
            buckets = core.ring.len(),
            "derived bucket parameters"
        );
        Ok(())
    }

    /// Start scanning `haystack`, skipping the `repeats` intervals.
    ///
    /// Configuration errors are reported here, before any hit is produced.
    pub fn scan<'h>(
        &mut self,
        haystack: &'h [u8],
        repeats: &[Range<usize>],
        error_rate: f64,
        min_length: usize,
    ) -> Result<SwiftScan<'_, 'h, I>> {
        self.configure(error_rate, min_length)?;

        let core = &mut self.core;
        let max_query_len = core.query_lens.iter().copied().max().unwrap_or(0);
        // keeps every diagonal of this scan past every position of the last one
        let stride = haystack.len() + core.params.taboo_length + max_query_len + 2 * core.max_delta;
        let offset = core.ring.begin_epoch(stride);
        let ranges = non_repeat_ranges(haystack.len(), repeats, core.span);

        let progress = if core.params.progress {
            let bar = ProgressBar::new(haystack.len() as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
            {
                bar.set_style(style);
            }
            bar
        } else {
            ProgressBar::hidden()
        };

        let hasher = QGramHasher::new(self.index.shape());
        Ok(SwiftScan {
            filter: self,
            haystack,
            ranges,
            hasher,
            state: ScanState::Idle,
            range_idx: 0,
            pos: 0,
            reseed: true,
            offset,
            pending: Vec::new(),
            pending_next: 0,
            current: None,
            progress,
        })
    }
}

impl FilterCore {
    fn count_qgram(&mut self, occurrences: &[QGramOccurrence], pos: i64, offset: i64, hits: &mut Vec<Hit>) {
        self.counters.qgrams += 1;
        for occ in occurrences {
            self.counters.occurrences += 1;
            self.count_occurrence(occ.query_id as usize, occ.offset as i64, pos, offset, hits);
        }
    }

    /// Count one q-gram occurrence in its bucket and in the bucket below if
    /// the diagonal lies in their overlap
    fn count_occurrence(
        &mut self,
        query: usize,
        query_offset: i64,
        pos: i64,
        offset: i64,
        hits: &mut Vec<Hit>,
    ) {
        let Some(params) = self.ring.params(query).copied() else {
            return;
        };
        let diagonal = if self.mode.diagonal {
            pos - query_offset
        } else {
            pos
        };
        let mut slot = self.ring.slot(query, &params, diagonal);
        let mut offset_in_bucket = diagonal - slot.origin;
        loop {
            self.update_bucket(query, &params, slot, pos, offset, hits);
            if offset_in_bucket >= params.overlap as i64 {
                break;
            }
            slot = self.ring.prev_slot(query, &params, slot);
            offset_in_bucket += params.delta as i64;
        }
    }

    fn update_bucket(
        &mut self,
        query: usize,
        params: &BucketParams,
        slot: BucketSlot,
        pos: i64,
        offset: i64,
        hits: &mut Vec<Hit>,
    ) {
        let semiglobal = self.mode.semiglobal;
        let abs = pos + offset;
        let old = *self.ring.bucket(slot.index);
        let stale = self.ring.is_stale(&old, slot.origin)
            || (!semiglobal
                && old.last_increment + (params.distance_cut as i64) < abs + self.span as i64);

        let mut bucket = old;
        if stale {
            // buckets from an earlier scan were flushed or abandoned
            if !semiglobal && old.reached_threshold() && old.last_increment >= offset {
                let ring_slot = self.ring.ring_slot(query, slot.index);
                hits.push(self.local_hit(query, params, ring_slot, &old, offset));
                self.counters.stale_hits += 1;
            }
            bucket.counter = 1;
            bucket.first_increment = abs;
            self.counters.bucket_resets += 1;
        } else if abs - old.last_increment < params.taboo_length as i64 {
            self.counters.taboo_skips += 1;
            return;
        } else {
            if bucket.counter == 0 {
                bucket.first_increment = abs;
            }
            bucket.counter = bucket.counter.saturating_add(1);
        }
        bucket.last_increment = abs;
        *self.ring.bucket_mut(slot.index) = bucket;

        // a saturated counter stays at threshold; report the crossing only
        let crossed = stale || old.counter < bucket.threshold;
        if semiglobal && crossed && bucket.counter == bucket.threshold {
            hits.push(self.semiglobal_hit(query, params, slot.origin));
            self.counters.eager_hits += 1;
        }
    }

    /// Parallelogram covering every q-gram counted in `bucket`
    fn local_hit(
        &self,
        query: usize,
        params: &BucketParams,
        ring_slot: usize,
        bucket: &Bucket,
        offset: i64,
    ) -> Hit {
        let last = bucket.last_increment - offset;
        let first = bucket.first_increment - offset;
        assert!(
            first <= last,
            "bucket window ends at {last} before it starts at {first}"
        );
        let origin = cycle_origin(params, ring_slot, last);
        let band = params.delta + params.overlap;
        let width = (last - first) as usize + self.span;
        let height = width + band;
        Hit {
            haystack_begin: first,
            query_id: query,
            query_begin: last + self.span as i64 - origin - height as i64,
            width,
            height,
            diagonal: origin,
            band,
        }
    }

    /// Whole-query window for the bucket band starting at `origin`
    fn semiglobal_hit(&self, query: usize, params: &BucketParams, origin: i64) -> Hit {
        let query_len = self.query_lens[query];
        let band = params.delta + params.overlap;
        if self.mode.diagonal {
            Hit {
                haystack_begin: origin,
                query_id: query,
                query_begin: 0,
                width: query_len - 1 + band,
                height: query_len,
                diagonal: origin,
                band,
            }
        } else {
            Hit {
                haystack_begin: origin,
                query_id: query,
                query_begin: 0,
                width: band,
                height: query_len,
                diagonal: origin - query_len as i64,
                band: band + query_len,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Idle,
    Scanning,
    /// Next bucket to inspect when flushing
    Flushing { query: usize, index: usize },
    Done,
}

/// One pass of the filter over a haystack.
///
/// Hits come out in order of the haystack position at which they were
/// detected; hits found at the same position follow occurrence and ring
/// order. Dropping the scan early leaves the filter usable for a new scan.
pub struct SwiftScan<'f, 'h, I: OccurrenceSource> {
    filter: &'f mut SwiftFilter<I>,
    haystack: &'h [u8],
    ranges: Vec<Range<usize>>,
    hasher: QGramHasher,
    state: ScanState,
    range_idx: usize,
    /// Next haystack position to hash
    pos: usize,
    reseed: bool,
    /// Epoch base added to haystack positions
    offset: i64,
    pending: Vec<Hit>,
    pending_next: usize,
    current: Option<Hit>,
    progress: ProgressBar,
}

impl<'f, 'h, I: OccurrenceSource> SwiftScan<'f, 'h, I> {
    /// Advance to the next hit
    pub fn poll(&mut self) -> Option<Hit> {
        loop {
            if let Some(hit) = self.take_pending() {
                self.current = Some(hit);
                return Some(hit);
            }
            match self.state {
                ScanState::Idle => self.start(),
                ScanState::Scanning => self.step(),
                ScanState::Flushing { query, index } => self.flush_from(query, index),
                ScanState::Done => {
                    self.current = None;
                    return None;
                }
            }
        }
    }

    /// Hit returned by the last poll
    pub fn current_hit(&self) -> Option<&Hit> {
        self.current.as_ref()
    }

    /// Haystack interval of the current hit, clipped to the haystack
    pub fn current_hit_window(&self) -> Option<Range<usize>> {
        self.current.map(|hit| hit.haystack_window(self.haystack.len()))
    }

    /// Query interval of the current hit, clipped to the query
    pub fn current_query_window(&self) -> Option<Range<usize>> {
        self.current
            .map(|hit| hit.query_window(self.filter.core.query_lens[hit.query_id]))
    }

    /// Haystack position of the last hashed q-gram
    pub fn position(&self) -> usize {
        self.pos.saturating_sub(1)
    }

    pub fn is_done(&self) -> bool {
        self.state == ScanState::Done && self.pending_next >= self.pending.len()
    }

    pub fn haystack(&self) -> &'h [u8] {
        self.haystack
    }

    /// Index of the filter being scanned
    pub fn index(&self) -> &I {
        &self.filter.index
    }

    fn take_pending(&mut self) -> Option<Hit> {
        if self.pending_next < self.pending.len() {
            let hit = self.pending[self.pending_next];
            self.pending_next += 1;
            Some(hit)
        } else {
            self.pending.clear();
            self.pending_next = 0;
            None
        }
    }

    fn start(&mut self) {
        self.range_idx = 0;
        match self.ranges.first() {
            Some(range) => {
                self.pos = range.start;
                self.reseed = true;
                self.state = ScanState::Scanning;
            }
            None => self.finish_scanning(),
        }
    }

    /// Hash one position, or move on to the next non-repeat range
    fn step(&mut self) {
        let span = self.filter.core.span;
        let range_end = match self.ranges.get(self.range_idx) {
            Some(range) => range.end,
            None => return self.finish_scanning(),
        };
        if self.pos + span > range_end {
            self.range_idx += 1;
            match self.ranges.get(self.range_idx) {
                Some(next) => {
                    self.pos = next.start;
                    self.reseed = true;
                }
                None => self.finish_scanning(),
            }
            return;
        }

        let hash = if self.reseed {
            self.reseed = false;
            self.hasher.reset(self.haystack, self.pos)
        } else {
            self.hasher.roll(self.haystack, self.pos)
        };
        if let Some(hash) = hash {
            let filter = &mut *self.filter;
            let occurrences = filter.index.occurrences(hash);
            filter
                .core
                .count_qgram(occurrences, self.pos as i64, self.offset, &mut self.pending);
        }
        if self.pos % PROGRESS_STEP == 0 {
            self.progress.set_position(self.pos as u64);
        }
        self.pos += 1;
    }

    fn finish_scanning(&mut self) {
        self.progress.finish_and_clear();
        let counters = &self.filter.core.counters;
        debug!(
            haystack_len = self.haystack.len(),
            qgrams = counters.qgrams,
            hits = counters.hits(),
            "scan finished"
        );
        self.state = if self.filter.core.mode.semiglobal {
            ScanState::Done
        } else {
            ScanState::Flushing { query: 0, index: 0 }
        };
    }

    /// Report the next bucket at or after `(query, index)` that reached its
    /// threshold in this scan
    fn flush_from(&mut self, mut query: usize, mut index: usize) {
        let core = &mut self.filter.core;
        while query < core.ring.num_queries() {
            if let Some(params) = core.ring.params(query).copied() {
                let range = core.ring.query_range(query);
                index = index.max(range.start);
                while index < range.end {
                    let bucket = *core.ring.bucket(index);
                    if bucket.reached_threshold() && bucket.last_increment >= self.offset {
                        let ring_slot = core.ring.ring_slot(query, index);
                        let hit = core.local_hit(query, &params, ring_slot, &bucket, self.offset);
                        let flushed = core.ring.bucket_mut(index);
                        flushed.counter = 0;
                        flushed.last_increment = -(params.taboo_length as i64);
                        core.counters.flushed_hits += 1;
                        self.pending.push(hit);
                        self.state = ScanState::Flushing {
                            query,
                            index: index + 1,
                        };
                        return;
                    }
                    index += 1;
                }
            }
            query += 1;
            index = 0;
        }
        self.state = ScanState::Done;
    }
}

impl<'f, 'h, I: OccurrenceSource> Iterator for SwiftScan<'f, 'h, I> {
    type Item = Hit;

    fn next(&mut self) -> Option<Hit> {
        self.poll()
    }
}
