//! Diagonal bucket storage
//!
//! All buckets of all queries live in one flat vector. Query `i` owns the
//! slots `bases[i] .. bases[i] + reuse_mask + 1`, and a diagonal `d` maps to
//! slot `(d >> log_delta) & reuse_mask` of its query. Bucket positions are
//! absolute: the haystack position plus the epoch base of the scan that wrote
//! them, so a new scan can start without touching the array.

use std::ops::Range;

use super::params::BucketParams;

/// Counter for one band of `delta + overlap` diagonals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub counter: u16,
    /// Hits needed before this bucket reports; may be raised per query
    pub threshold: u16,
    /// Absolute haystack position of the last counted q-gram
    pub last_increment: i64,
    /// Absolute haystack position of the first counted q-gram
    pub first_increment: i64,
}

impl Bucket {
    #[inline]
    pub fn cleared(params: &BucketParams) -> Self {
        Self {
            counter: 0,
            threshold: clamp_u16(params.threshold),
            last_increment: -(params.taboo_length as i64),
            first_increment: 0,
        }
    }

    /// True if the content was written before the bucket's current cycle began
    #[inline]
    pub fn predates(&self, origin: i64) -> bool {
        self.last_increment < origin
    }

    #[inline]
    pub fn reached_threshold(&self) -> bool {
        self.counter >= self.threshold
    }
}

#[inline]
fn clamp_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

/// Location of a diagonal inside the ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketSlot {
    /// Index into the flat bucket array
    pub index: usize,
    /// First diagonal covered by the bucket in its current cycle
    pub origin: i64,
}

/// Flat array of buckets for every query plus the epoch offsets
#[derive(Debug, Default)]
pub struct BucketRing {
    buckets: Vec<Bucket>,
    bases: Vec<usize>,
    params: Vec<Option<BucketParams>>,
    epoch_base: i64,
    epoch_next: i64,
}

impl BucketRing {
    /// Allocate and clear buckets for a new parameter set.
    ///
    /// Queries with `None` parameters get no buckets.
    pub fn new(params: Vec<Option<BucketParams>>) -> Self {
        let mut bases = Vec::with_capacity(params.len());
        let mut total = 0usize;
        for p in &params {
            bases.push(total);
            total += p.map_or(0, |p| p.num_buckets());
        }
        let mut ring = Self {
            buckets: Vec::with_capacity(total),
            bases,
            params,
            epoch_base: 0,
            epoch_next: 0,
        };
        for p in ring.params.iter().flatten() {
            ring.buckets
                .extend(std::iter::repeat(Bucket::cleared(p)).take(p.num_buckets()));
        }
        ring
    }

    /// Reset every bucket and the epoch offsets
    pub fn clear(&mut self) {
        for (query, p) in self.params.iter().enumerate() {
            if let Some(p) = p {
                let range = self.bases[query]..self.bases[query] + p.num_buckets();
                self.buckets[range].fill(Bucket::cleared(p));
            }
        }
        self.epoch_base = 0;
        self.epoch_next = 0;
    }

    /// Start a new scan covering `stride` absolute positions.
    ///
    /// Returns the offset to add to haystack positions of this scan.
    pub fn begin_epoch(&mut self, stride: usize) -> i64 {
        match self.epoch_next.checked_add(stride as i64) {
            Some(next) => {
                self.epoch_base = self.epoch_next;
                self.epoch_next = next;
            }
            None => {
                self.clear();
                self.epoch_next = stride as i64;
            }
        }
        self.epoch_base
    }

    #[inline]
    pub fn epoch_base(&self) -> i64 {
        self.epoch_base
    }

    #[inline]
    pub fn num_queries(&self) -> usize {
        self.params.len()
    }

    #[inline]
    pub fn params(&self, query: usize) -> Option<&BucketParams> {
        self.params.get(query).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Slot and bucket origin of `diagonal` for a query with buckets
    #[inline]
    pub fn slot(&self, query: usize, params: &BucketParams, diagonal: i64) -> BucketSlot {
        let ring_slot = ((diagonal >> params.log_delta) as usize) & params.reuse_mask;
        BucketSlot {
            index: self.bases[query] + ring_slot,
            origin: diagonal & !(params.delta as i64 - 1),
        }
    }

    /// Bucket for `diagonal` and the diagonal its band starts at, or None
    /// if the query has no buckets
    pub fn get_mut(&mut self, query: usize, diagonal: i64) -> Option<(&mut Bucket, i64)> {
        let params = *self.params(query)?;
        let slot = self.slot(query, &params, diagonal);
        Some((&mut self.buckets[slot.index], slot.origin))
    }

    /// Slot holding the band `delta` diagonals below `slot`
    #[inline]
    pub fn prev_slot(&self, query: usize, params: &BucketParams, slot: BucketSlot) -> BucketSlot {
        let base = self.bases[query];
        let index = if slot.index == base {
            base + params.reuse_mask
        } else {
            slot.index - 1
        };
        BucketSlot {
            index,
            origin: slot.origin - params.delta as i64,
        }
    }

    /// Whether `bucket` was last written before the cycle starting at `origin`
    /// in the current epoch
    #[inline]
    pub fn is_stale(&self, bucket: &Bucket, origin: i64) -> bool {
        bucket.predates(origin + self.epoch_base)
    }

    #[inline]
    pub fn bucket(&self, index: usize) -> &Bucket {
        &self.buckets[index]
    }

    #[inline]
    pub fn bucket_mut(&mut self, index: usize) -> &mut Bucket {
        &mut self.buckets[index]
    }

    /// Indices of all buckets owned by `query`
    pub fn query_range(&self, query: usize) -> Range<usize> {
        let len = self.params(query).map_or(0, BucketParams::num_buckets);
        self.bases[query]..self.bases[query] + len
    }

    /// Ring slot number of a bucket index
    #[inline]
    pub fn ring_slot(&self, query: usize, index: usize) -> usize {
        index - self.bases[query]
    }

    /// Raise the threshold of every bucket of `query` to at least `threshold`
    pub fn set_min_threshold(&mut self, query: usize, threshold: usize) {
        let threshold = clamp_u16(threshold);
        let range = self.query_range(query);
        for bucket in &mut self.buckets[range] {
            bucket.threshold = bucket.threshold.max(threshold);
        }
    }
}

/// Origin of the band a ring slot covered when it was last written.
///
/// Slots repeat every `reuse_period` diagonals and a band is only written at
/// positions at or after its origin, so the band that wrote `last_increment`
/// (relative to the scan) is the last one starting at or before it.
#[inline]
pub fn cycle_origin(params: &BucketParams, ring_slot: usize, last_increment: i64) -> i64 {
    let period = params.reuse_period();
    let candidate = (last_increment & !(period - 1)) + ((ring_slot as i64) << params.log_delta);
    if candidate > last_increment {
        candidate - period
    } else {
        candidate
    }
}
