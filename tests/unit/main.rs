//! Integration tests for the stellar crate
//!
//! Tests are organized by module:
//! - `swift` - filter end-to-end behavior and the no-false-negatives property
//! - `post` - bounded match store and overlap masking
//! - `stellar` - the full search pipeline on both strands
//! - `config` - command-line options

mod config;
mod helpers;
mod post;
mod stellar;
mod swift;
