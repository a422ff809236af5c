use std::ops::Range;

/// Candidate region reported by the filter.
///
/// Local hits are parallelograms: `width` haystack positions starting at
/// `haystack_begin`, and `height` query positions starting at `query_begin`.
/// Semiglobal hits cover the whole query. Coordinates may extend past either
/// sequence; use the window accessors to clip them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hit {
    pub haystack_begin: i64,
    pub query_id: usize,
    pub query_begin: i64,
    pub width: usize,
    pub height: usize,
    /// First diagonal of the bucket that produced the hit
    pub diagonal: i64,
    /// Number of diagonals covered by that bucket
    pub band: usize,
}

impl Hit {
    #[inline]
    pub fn haystack_end(&self) -> i64 {
        self.haystack_begin + self.width as i64
    }

    #[inline]
    pub fn query_end(&self) -> i64 {
        self.query_begin + self.height as i64
    }

    /// Haystack interval clipped to `0..haystack_len`
    pub fn haystack_window(&self, haystack_len: usize) -> Range<usize> {
        clip(self.haystack_begin, self.haystack_end(), haystack_len)
    }

    /// Query interval clipped to `0..query_len`
    pub fn query_window(&self, query_len: usize) -> Range<usize> {
        clip(self.query_begin, self.query_end(), query_len)
    }

    /// Diagonals (haystack minus query position) the hit was counted on
    pub fn diagonals(&self) -> Range<i64> {
        self.diagonal..self.diagonal + self.band as i64
    }
}

fn clip(begin: i64, end: i64, len: usize) -> Range<usize> {
    let len = len as i64;
    let begin = begin.clamp(0, len);
    let end = end.clamp(begin, len);
    begin as usize..end as usize
}
