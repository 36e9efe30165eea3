//! Core types for the roidecode pipeline
//!
//! This module defines the data that flows through each stage: stimulus
//! events, the per-TR label vector, labeled samples ready for decoding, and
//! the report payload emitted to downstream tooling.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Sentinel label for a TR with no stimulus ("rest")
pub const REST_LABEL: u32 = 0;

/// One stimulus presentation within a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StimulusEvent {
    /// Condition label code (positive; 0 is reserved for rest)
    pub condition: u32,
    /// Onset time in seconds, relative to the start of the event's run
    pub onset_seconds: f64,
    /// Presentation duration, if the timing file records it. The aligner
    /// labels only the onset TR, so this is carried for provenance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

impl StimulusEvent {
    pub fn new(condition: u32, onset_seconds: f64) -> Self {
        Self {
            condition,
            onset_seconds,
            duration_seconds: None,
        }
    }
}

/// Feature matrix rows reduced to labeled scans, with parallel label and
/// run-identifier vectors. Produced by the pipeline's selection stage and
/// consumed by the decoder.
#[derive(Debug, Clone)]
pub struct LabeledSamples {
    /// Voxel activity, rows = retained scan samples, columns = voxels
    pub features: Array2<f64>,
    /// Condition label per retained row (never `REST_LABEL`)
    pub labels: Vec<u32>,
    /// Run identifier per retained row; fold key for cross-validation
    pub run_ids: Vec<u32>,
}

impl LabeledSamples {
    /// Number of retained scan samples
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Per-fold accuracy for one ROI, ordered by ascending fold id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldScore {
    /// Run identifier held out as the test set
    pub fold_id: u32,
    /// Classification accuracy on the held-out run, in [0, 1]
    pub accuracy: f64,
}

/// Decoding summary for a single ROI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoiSummary {
    /// ROI name (e.g. "FFA", "PPA")
    pub roi: String,
    /// Number of labeled samples that entered cross-validation
    pub n_samples: usize,
    /// Number of voxels/features
    pub n_features: usize,
    /// Per-fold scores, ascending fold id
    pub folds: Vec<FoldScore>,
    /// Mean accuracy across folds
    pub mean_accuracy: f64,
}

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Report provenance information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProvenance {
    /// Session or subject identifier supplied by the caller
    pub session_id: String,
    pub computed_at_utc: String,
}

/// Scan protocol echo embedded in the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProtocol {
    pub tr_seconds: f64,
    pub trs_per_run: usize,
    pub num_runs: usize,
    pub hemodynamic_lag_trs: usize,
}

/// Complete decoding report payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub provenance: ReportProvenance,
    pub protocol: ReportProtocol,
    pub rois: Vec<RoiSummary>,
}
