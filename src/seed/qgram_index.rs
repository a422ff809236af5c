use rustc_hash::FxHashMap;
use tracing::info;

use super::shape::Shape;

/// Smallest occurrence count the abundance cut ever removes.
pub const MIN_ABUNDANCE_CUTOFF: usize = 100;

/// One occurrence of a q-gram in the query set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QGramOccurrence {
    pub query_id: u32,
    /// Position of the q-gram's first character in the query (0-based)
    pub offset: u32,
}

/// Source of q-gram occurrences consumed by the filter.
///
/// Hash values must be produced with the same [`Shape`] the source reports.
pub trait OccurrenceSource {
    fn shape(&self) -> &Shape;

    fn num_queries(&self) -> usize;

    fn query(&self, query_id: usize) -> &[u8];

    fn query_len(&self, query_id: usize) -> usize {
        self.query(query_id).len()
    }

    /// All occurrences of `hash`, ordered by (query, offset)
    fn occurrences(&self, hash: u64) -> &[QGramOccurrence];
}

/// Hash-map q-gram index over a set of query sequences
pub struct QGramIndex {
    shape: Shape,
    queries: Vec<Vec<u8>>,
    lookup: FxHashMap<u64, Vec<QGramOccurrence>>,
}

impl QGramIndex {
    /// Index every unambiguous q-gram of every query
    pub fn new<S: AsRef<[u8]>>(queries: &[S], shape: Shape) -> Self {
        let queries: Vec<Vec<u8>> = queries.iter().map(|q| q.as_ref().to_vec()).collect();
        let mut lookup: FxHashMap<u64, Vec<QGramOccurrence>> = FxHashMap::default();
        let span = shape.span();

        for (query_id, seq) in queries.iter().enumerate() {
            if seq.len() < span {
                continue;
            }
            for pos in 0..=(seq.len() - span) {
                if let Some(code) = shape.hash(seq, pos) {
                    lookup.entry(code).or_default().push(QGramOccurrence {
                        query_id: query_id as u32,
                        offset: pos as u32,
                    });
                }
            }
        }

        Self {
            shape,
            queries,
            lookup,
        }
    }

    /// Build an index from FASTA records
    pub fn from_records(records: &[bio::io::fasta::Record], shape: Shape) -> Self {
        let seqs: Vec<&[u8]> = records.iter().map(|r| r.seq()).collect();
        Self::new(&seqs, shape)
    }

    /// Drop q-grams that occur more than `max(100, total_len * ratio)` times.
    ///
    /// Returns the number of distinct q-grams removed.
    pub fn apply_abundance_cut(&mut self, ratio: f64) -> usize {
        let total_len: usize = self.queries.iter().map(Vec::len).sum();
        let cutoff = MIN_ABUNDANCE_CUTOFF.max((total_len as f64 * ratio) as usize);
        let before = self.lookup.len();
        self.lookup.retain(|_, occ| occ.len() <= cutoff);
        let removed = before - self.lookup.len();
        if removed > 0 {
            info!(removed, cutoff, "removed over-abundant q-grams");
        }
        removed
    }

    /// Number of distinct q-grams in the index
    pub fn num_qgrams(&self) -> usize {
        self.lookup.len()
    }

    pub fn total_query_len(&self) -> usize {
        self.queries.iter().map(Vec::len).sum()
    }
}

impl OccurrenceSource for QGramIndex {
    fn shape(&self) -> &Shape {
        &self.shape
    }

    fn num_queries(&self) -> usize {
        self.queries.len()
    }

    fn query(&self, query_id: usize) -> &[u8] {
        &self.queries[query_id]
    }

    fn occurrences(&self, hash: u64) -> &[QGramOccurrence] {
        self.lookup.get(&hash).map(Vec::as_slice).unwrap_or(&[])
    }
}
