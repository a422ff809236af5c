//! Error types for filter setup and option validation

use thiserror::Error;

/// Errors raised while configuring the SWIFT filter or a STELLAR run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SwiftError {
    #[error("error rate {0} is outside [0, 0.25]")]
    InvalidErrorRate(f64),

    #[error("q-gram span {span} exceeds the maximum of 32")]
    QGramTooLong { span: usize },

    #[error("q-gram span {span} must be smaller than 1/error rate ({inverse:.2})")]
    QGramNotBelowInverseErrorRate { span: usize, inverse: f64 },

    #[error("query {query_id} has length {len}, shorter than the q-gram span {span}")]
    QueryShorterThanShape {
        query_id: usize,
        len: usize,
        span: usize,
    },

    #[error("invalid shape {0:?}: expected a pattern of '1' and '0' starting and ending with '1'")]
    InvalidShape(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),
}

pub type Result<T> = std::result::Result<T, SwiftError>;
