//! Command-line option parsing and derived settings

use clap::Parser;

use stellar::config::{StellarOptions, VerificationStrategy};
use stellar::SwiftError;

#[derive(Parser, Debug)]
struct Cli {
    #[command(flatten)]
    options: StellarOptions,
}

#[test]
fn test_parse_defaults() {
    let cli = Cli::try_parse_from(["stellar"]).unwrap();
    let defaults = StellarOptions::default();
    assert_eq!(cli.options.epsilon, defaults.epsilon);
    assert_eq!(cli.options.min_length, defaults.min_length);
    assert_eq!(cli.options.kmer, defaults.kmer);
    assert_eq!(cli.options.num_matches, defaults.num_matches);
    assert_eq!(cli.options.compact_thresh, defaults.compact_thresh);
    assert_eq!(cli.options.disable_thresh, None);
    assert_eq!(cli.options.verification, VerificationStrategy::Exact);
    assert!(cli.options.forward);
    assert!(!cli.options.reverse);
}

#[test]
fn test_parse_overrides() {
    let cli = Cli::try_parse_from([
        "stellar",
        "-e",
        "0.1",
        "-k",
        "8",
        "--reverse",
        "-v",
        "best-local",
        "--disable-thresh",
        "10",
    ])
    .unwrap();
    let options = cli.options;
    assert_eq!(options.epsilon, 0.1);
    assert_eq!(options.kmer, 8);
    assert!(options.reverse);
    assert_eq!(options.verification, VerificationStrategy::BestLocal);
    assert_eq!(options.disable_thresh, Some(10));
    assert!(options.validate().is_ok());
    assert_eq!(options.store_limits().disable_threshold, 10);
}

#[test]
fn test_unknown_verification_rejected() {
    assert!(Cli::try_parse_from(["stellar", "-v", "banded"]).is_err());
}

#[test]
fn test_validation_errors() {
    let options = StellarOptions {
        kmer: 40,
        epsilon: 0.0,
        min_length: 100,
        ..Default::default()
    };
    assert_eq!(options.validate(), Err(SwiftError::QGramTooLong { span: 40 }));

    let options = StellarOptions {
        min_length: 5,
        ..Default::default()
    };
    assert!(matches!(options.validate(), Err(SwiftError::InvalidOption(_))));

    let options = StellarOptions {
        abundance_cut: 1.5,
        ..Default::default()
    };
    assert!(matches!(options.validate(), Err(SwiftError::InvalidOption(_))));
}

#[test]
fn test_swift_parameters_from_options() {
    let options = StellarOptions {
        taboo_length: 3,
        min_log2_delta: 2,
        ..Default::default()
    };
    let params = options.swift_parameters();
    assert_eq!(params.taboo_length, 3);
    assert_eq!(params.min_log2_delta, 2);
    assert_eq!(params.min_threshold, 1);
}
