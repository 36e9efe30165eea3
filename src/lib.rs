//! roidecode - Run-wise MVPA decoding core for event-related fMRI sessions
//!
//! roidecode turns stimulus timing files and ROI feature matrices into
//! cross-validated decoding accuracies through a deterministic pipeline:
//! TR-grid alignment → hemodynamic lag shift → rest removal → per-run
//! z-scoring → leave-one-run-out decoding → report encoding.
//!
//! ## Modules
//!
//! - **Timing**: Align stimulus onsets to the scanner's TR grid
//! - **Decoding**: Train and score a linear decoder per held-out run
//! - **Reporting**: Emit versioned JSON reports for downstream tooling

pub mod classifier;
pub mod decoder;
pub mod error;
pub mod folds;
pub mod normalize;
pub mod pipeline;
pub mod protocol;
pub mod report;
pub mod schema;
pub mod timing;
pub mod types;

pub use error::DecodeError;
pub use pipeline::{decode_session, RoiDecode, RoiDecoder};
pub use protocol::ScanProtocol;

// Decoding exports
pub use classifier::{Classifier, LinearDecoder};
pub use decoder::{cross_validate, DecodeOutcome};
pub use folds::{leave_one_run_out, Fold};
pub use normalize::{zscore_per_run, ZscorePolicy};

// Schema exports
pub use report::{ReportEncoder, REPORT_VERSION};
pub use schema::{RoiMatrix, TimingAdapter, TimingDocument, SCHEMA_VERSION};
pub use types::{LabeledSamples, StimulusEvent, REST_LABEL};

/// Crate version embedded in all report payloads
pub const ROIDECODE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report payloads
pub const PRODUCER_NAME: &str = "roidecode";
