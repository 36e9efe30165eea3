//! Error types for roidecode

use thiserror::Error;

/// Errors that can occur during alignment or decoding
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid scan protocol: {0}")]
    InvalidProtocol(String),

    #[error("Failed to parse timing payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(
        "Event onset out of range: run {run}, onset {onset_seconds}s maps to scan \
         {scan} but runs have only {trs_per_run} TRs"
    )]
    OnsetOutOfRange {
        run: usize,
        onset_seconds: f64,
        scan: usize,
        trs_per_run: usize,
    },

    #[error("Mismatched lengths: {0}")]
    MismatchedLengths(String),

    #[error("Zero variance in feature column {feature} of run {run}")]
    ZeroVariance { run: u32, feature: usize },

    #[error("Empty fold partition: {0}")]
    EmptyFold(String),

    #[error("Classifier failure: {0}")]
    ClassifierError(String),
}
