//! Q-gram shapes and rolling 2-bit hashing

use crate::error::{Result, SwiftError};

/// Longest span a shape may have; a 2-bit packed q-gram must fit in a u64.
pub const MAX_SHAPE_SPAN: usize = 32;

/// Encode a nucleotide to 2 bits
///
/// Encoding: A=0, C=1, G=2, T/U=3
/// Returns None for ambiguous bases
#[inline]
pub fn encode_base(base: u8) -> Option<u64> {
    match base {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' | b'U' | b'u' => Some(3),
        _ => None,
    }
}

/// A contiguous or gapped q-gram shape.
///
/// `span` is the number of haystack characters a q-gram covers; `weight`
/// is the number of care positions that contribute to the hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    care: Vec<usize>,
    span: usize,
}

impl Shape {
    /// Contiguous shape of length `q`
    pub fn ungapped(q: usize) -> Result<Self> {
        if q == 0 {
            return Err(SwiftError::InvalidShape(String::new()));
        }
        if q > MAX_SHAPE_SPAN {
            return Err(SwiftError::QGramTooLong { span: q });
        }
        Ok(Self {
            care: (0..q).collect(),
            span: q,
        })
    }

    /// Gapped shape from a pattern such as `"11011"`
    pub fn gapped(pattern: &str) -> Result<Self> {
        let bytes = pattern.as_bytes();
        let well_formed = !bytes.is_empty()
            && bytes.iter().all(|&b| b == b'0' || b == b'1')
            && bytes[0] == b'1'
            && bytes[bytes.len() - 1] == b'1';
        if !well_formed {
            return Err(SwiftError::InvalidShape(pattern.to_string()));
        }
        if bytes.len() > MAX_SHAPE_SPAN {
            return Err(SwiftError::QGramTooLong { span: bytes.len() });
        }
        let care = bytes
            .iter()
            .enumerate()
            .filter(|(_, &b)| b == b'1')
            .map(|(i, _)| i)
            .collect();
        Ok(Self {
            care,
            span: bytes.len(),
        })
    }

    #[inline]
    pub fn span(&self) -> usize {
        self.span
    }

    #[inline]
    pub fn weight(&self) -> usize {
        self.care.len()
    }

    #[inline]
    pub fn is_ungapped(&self) -> bool {
        self.care.len() == self.span
    }

    /// Hash the q-gram starting at `pos`, or None if it runs off the end or
    /// any care position is ambiguous.
    pub fn hash(&self, seq: &[u8], pos: usize) -> Option<u64> {
        if pos + self.span > seq.len() {
            return None;
        }
        let mut code = 0u64;
        for &offset in &self.care {
            code = (code << 2) | encode_base(seq[pos + offset])?;
        }
        Some(code)
    }

    fn value_mask(&self) -> u64 {
        if self.weight() >= 32 {
            u64::MAX
        } else {
            (1u64 << (2 * self.weight())) - 1
        }
    }
}

/// Incremental hasher over one sequence.
///
/// Ungapped shapes roll the previous value forward one base at a time and
/// remember where the last ambiguous base was; gapped shapes are rehashed.
#[derive(Debug, Clone)]
pub struct QGramHasher {
    shape: Shape,
    mask: u64,
    value: u64,
    valid_from: usize,
}

impl QGramHasher {
    pub fn new(shape: &Shape) -> Self {
        Self {
            shape: shape.clone(),
            mask: shape.value_mask(),
            value: 0,
            valid_from: 0,
        }
    }

    /// Hash the q-gram at `pos` from scratch.
    pub fn reset(&mut self, seq: &[u8], pos: usize) -> Option<u64> {
        if !self.shape.is_ungapped() {
            return self.shape.hash(seq, pos);
        }
        let span = self.shape.span();
        if pos + span > seq.len() {
            return None;
        }
        self.value = 0;
        self.valid_from = pos;
        for i in 0..span {
            self.push(seq[pos + i], pos + i);
        }
        self.current(pos)
    }

    /// Hash the q-gram at `pos`, given that the previous call was for `pos - 1`.
    pub fn roll(&mut self, seq: &[u8], pos: usize) -> Option<u64> {
        if !self.shape.is_ungapped() {
            return self.shape.hash(seq, pos);
        }
        let last = pos + self.shape.span() - 1;
        if last >= seq.len() {
            return None;
        }
        self.push(seq[last], last);
        self.current(pos)
    }

    #[inline]
    fn push(&mut self, base: u8, at: usize) {
        let bits = match encode_base(base) {
            Some(bits) => bits,
            None => {
                self.valid_from = at + 1;
                0
            }
        };
        self.value = ((self.value << 2) | bits) & self.mask;
    }

    #[inline]
    fn current(&self, pos: usize) -> Option<u64> {
        (self.valid_from <= pos).then_some(self.value)
    }
}
