//! Pipeline orchestration
//!
//! This module provides the public API for roidecode. It wires the full
//! pipeline from timing events and an ROI feature matrix to per-fold
//! accuracies: align to the TR grid, shift for hemodynamic lag, drop rest
//! scans, z-score per run, then leave-one-run-out cross-validation.

use crate::classifier::LinearDecoder;
use crate::decoder::{cross_validate, DecodeOutcome};
use crate::error::DecodeError;
use crate::normalize::{zscore_per_run, ZscorePolicy};
use crate::protocol::ScanProtocol;
use crate::report::ReportEncoder;
use crate::schema::RoiMatrix;
use crate::timing::{align, run_identifiers, shift_labels};
use crate::types::{LabeledSamples, RoiSummary, StimulusEvent, REST_LABEL};
use ndarray::{Array2, Axis};

/// Result of decoding a single ROI
#[derive(Debug, Clone)]
pub struct RoiDecode {
    /// Report-ready summary for this ROI
    pub summary: RoiSummary,
    /// The per-fold fitted models, for callers that inspect weights
    pub outcome: DecodeOutcome<LinearDecoder>,
}

/// Stateless session decoder configured with a scan protocol.
///
/// One instance serves every ROI of a session; nothing learned from one ROI
/// leaks into another.
pub struct RoiDecoder {
    protocol: ScanProtocol,
    zscore_policy: ZscorePolicy,
    epochs: usize,
    learning_rate: f64,
}

impl RoiDecoder {
    /// Create a decoder with strict zero-variance handling and default
    /// training hyperparameters
    pub fn new(protocol: ScanProtocol) -> Self {
        Self {
            protocol,
            zscore_policy: ZscorePolicy::Strict,
            epochs: 300,
            learning_rate: 0.5,
        }
    }

    /// Override the zero-variance policy used during normalization
    pub fn with_zscore_policy(mut self, policy: ZscorePolicy) -> Self {
        self.zscore_policy = policy;
        self
    }

    /// Override the classifier training hyperparameters
    pub fn with_training(mut self, epochs: usize, learning_rate: f64) -> Self {
        self.epochs = epochs;
        self.learning_rate = learning_rate;
        self
    }

    pub fn protocol(&self) -> &ScanProtocol {
        &self.protocol
    }

    /// Per-TR condition labels after alignment and hemodynamic shift
    pub fn labeled_timeline(
        &self,
        runs: &[Vec<StimulusEvent>],
    ) -> Result<Vec<u32>, DecodeError> {
        let labels = align(&self.protocol, runs)?;
        Ok(shift_labels(&labels, self.protocol.lag_trs()))
    }

    /// Reduce a full-session feature matrix to normalized labeled samples.
    ///
    /// `features` must have exactly `num_runs * trs_per_run` rows, in scan
    /// order. Rest scans are dropped; the surviving rows are z-scored one run
    /// at a time.
    pub fn prepare(
        &self,
        features: &Array2<f64>,
        runs: &[Vec<StimulusEvent>],
    ) -> Result<LabeledSamples, DecodeError> {
        let timeline = self.labeled_timeline(runs)?;
        if features.nrows() != timeline.len() {
            return Err(DecodeError::MismatchedLengths(format!(
                "feature matrix has {} rows but the protocol defines {} scans",
                features.nrows(),
                timeline.len()
            )));
        }

        let scan_runs = run_identifiers(&self.protocol);
        let rows: Vec<usize> = timeline
            .iter()
            .enumerate()
            .filter(|(_, &label)| label != REST_LABEL)
            .map(|(i, _)| i)
            .collect();

        let mut selected = features.select(Axis(0), &rows);
        let labels: Vec<u32> = rows.iter().map(|&r| timeline[r]).collect();
        let run_ids: Vec<u32> = rows.iter().map(|&r| scan_runs[r]).collect();

        zscore_per_run(&mut selected, &run_ids, self.zscore_policy)?;

        Ok(LabeledSamples {
            features: selected,
            labels,
            run_ids,
        })
    }

    /// Decode one ROI end to end
    pub fn decode_roi(
        &self,
        roi: &str,
        features: &Array2<f64>,
        runs: &[Vec<StimulusEvent>],
    ) -> Result<RoiDecode, DecodeError> {
        let samples = self.prepare(features, runs)?;

        let epochs = self.epochs;
        let learning_rate = self.learning_rate;
        let outcome = cross_validate(
            samples.features.view(),
            &samples.labels,
            &samples.run_ids,
            || LinearDecoder::new(epochs, learning_rate),
        )?;

        let summary = RoiSummary {
            roi: roi.to_string(),
            n_samples: samples.len(),
            n_features: samples.features.ncols(),
            folds: outcome.scores.clone(),
            mean_accuracy: outcome.mean_accuracy(),
        };

        Ok(RoiDecode { summary, outcome })
    }
}

/// Decode every ROI of a session and encode the result as a report JSON.
///
/// # Arguments
/// * `protocol` - Scan protocol shared by all runs
/// * `session_id` - Session or subject identifier for report provenance
/// * `runs` - Per-run stimulus event lists
/// * `rois` - One feature matrix per ROI
///
/// # Returns
/// A decode.report.v1 JSON string with one summary per ROI, in input order
pub fn decode_session(
    protocol: ScanProtocol,
    session_id: &str,
    runs: &[Vec<StimulusEvent>],
    rois: &[RoiMatrix],
) -> Result<String, DecodeError> {
    let decoder = RoiDecoder::new(protocol);
    let encoder = ReportEncoder::new();

    let mut summaries = Vec::with_capacity(rois.len());
    for roi in rois {
        let features = roi.to_array()?;
        let decoded = decoder.decode_roi(&roi.roi, &features, runs)?;
        summaries.push(decoded.summary);
    }

    encoder.encode_to_json(session_id, decoder.protocol(), summaries)
}
