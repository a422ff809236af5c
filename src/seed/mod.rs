pub mod qgram_index;
pub mod shape;

pub use qgram_index::{OccurrenceSource, QGramIndex, QGramOccurrence};
pub use shape::{encode_base, QGramHasher, Shape, MAX_SHAPE_SPAN};
