//! SWIFT q-gram filter
//!
//! Counts exact q-gram matches between a haystack and a set of queries in
//! bands of diagonals. A band that collects as many matches as the q-gram
//! lemma requires for an eps-match is reported as a [`Hit`].

pub mod buckets;
pub mod filter;
pub mod hit;
pub mod params;

pub use buckets::{Bucket, BucketRing, BucketSlot};
pub use filter::{SwiftFilter, SwiftScan};
pub use hit::Hit;
pub use params::{qgram_threshold, validate_error_rate, BucketParams};
