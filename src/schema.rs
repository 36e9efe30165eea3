//! fmri.stim_event.v1 schema definition
//!
//! The timing-file schema consumed from the external data loader: per-run
//! stimulus event lists with condition labels and onsets. Two encodings are
//! accepted: a single JSON document with nested run arrays, and NDJSON with
//! one run-tagged event per line.

use crate::error::DecodeError;
use crate::types::StimulusEvent;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Current timing schema version
pub const SCHEMA_VERSION: &str = "fmri.stim_event.v1";

/// A timing document: all runs of one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingDocument {
    /// Schema version identifier
    pub schema_version: String,
    /// Optional session/subject identifier carried into report provenance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Event lists, outer index = run
    pub runs: Vec<Vec<StimulusEvent>>,
}

impl TimingDocument {
    /// Create a document from per-run event lists
    pub fn new(runs: Vec<Vec<StimulusEvent>>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            session_id: None,
            runs,
        }
    }

    /// Attach a session identifier
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Validate the document schema
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ValidationError::InvalidSchemaVersion {
                expected: SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }
        for (run, events) in self.runs.iter().enumerate() {
            for (index, event) in events.iter().enumerate() {
                if event.condition == 0 {
                    return Err(ValidationError::ReservedCondition { run, index });
                }
                if !event.onset_seconds.is_finite() || event.onset_seconds < 0.0 {
                    return Err(ValidationError::InvalidOnset {
                        run,
                        index,
                        onset_seconds: event.onset_seconds,
                    });
                }
            }
        }
        Ok(())
    }

    /// Collect every schema issue instead of stopping at the first
    pub fn issues(&self) -> Vec<ValidationError> {
        let mut found = Vec::new();
        if self.schema_version != SCHEMA_VERSION {
            found.push(ValidationError::InvalidSchemaVersion {
                expected: SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }
        for (run, events) in self.runs.iter().enumerate() {
            for (index, event) in events.iter().enumerate() {
                if event.condition == 0 {
                    found.push(ValidationError::ReservedCondition { run, index });
                }
                if !event.onset_seconds.is_finite() || event.onset_seconds < 0.0 {
                    found.push(ValidationError::InvalidOnset {
                        run,
                        index,
                        onset_seconds: event.onset_seconds,
                    });
                }
            }
        }
        found
    }
}

/// One NDJSON timing record: an event tagged with its run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedEvent {
    /// 0-based run index
    pub run: usize,
    #[serde(flatten)]
    pub event: StimulusEvent,
}

/// Parser for timing payloads
pub struct TimingAdapter;

impl TimingAdapter {
    /// Parse a full timing document from a JSON string
    pub fn parse_document(raw_json: &str) -> Result<TimingDocument, DecodeError> {
        let document: TimingDocument = serde_json::from_str(raw_json)?;
        document
            .validate()
            .map_err(|e| DecodeError::ParseError(e.to_string()))?;
        Ok(document)
    }

    /// Parse NDJSON (one run-tagged event per line) into per-run event lists.
    ///
    /// `num_runs` fixes the output length; lines naming a run outside
    /// `[0, num_runs)` are an error. Blank lines are skipped.
    pub fn parse_ndjson(
        raw_ndjson: &str,
        num_runs: usize,
    ) -> Result<Vec<Vec<StimulusEvent>>, DecodeError> {
        let mut runs: Vec<Vec<StimulusEvent>> = vec![Vec::new(); num_runs];

        for (line_no, line) in raw_ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let record: TimedEvent = serde_json::from_str(trimmed).map_err(|e| {
                DecodeError::ParseError(format!("line {}: {e}", line_no + 1))
            })?;
            if record.run >= num_runs {
                return Err(DecodeError::ParseError(format!(
                    "line {}: run {} out of range (session has {num_runs} runs)",
                    line_no + 1,
                    record.run
                )));
            }
            runs[record.run].push(record.event);
        }

        Ok(runs)
    }
}

/// Validation errors for timing documents
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("Run {run}, event {index}: condition label 0 is reserved for rest")]
    ReservedCondition { run: usize, index: usize },

    #[error("Run {run}, event {index}: invalid onset {onset_seconds}s")]
    InvalidOnset {
        run: usize,
        index: usize,
        onset_seconds: f64,
    },
}

/// A per-ROI feature matrix as exchanged with the external loader
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoiMatrix {
    /// ROI name (e.g. "FFA")
    pub roi: String,
    /// Row-major samples: outer index = scan sample, inner = voxel
    pub data: Vec<Vec<f64>>,
}

impl RoiMatrix {
    /// Convert to an `Array2`, rejecting ragged rows
    pub fn to_array(&self) -> Result<Array2<f64>, DecodeError> {
        let n_rows = self.data.len();
        let n_cols = self.data.first().map_or(0, Vec::len);
        for (row, values) in self.data.iter().enumerate() {
            if values.len() != n_cols {
                return Err(DecodeError::MismatchedLengths(format!(
                    "ROI {}: row {row} has {} values, expected {n_cols}",
                    self.roi,
                    values.len()
                )));
            }
        }
        let flat: Vec<f64> = self.data.iter().flatten().copied().collect();
        Array2::from_shape_vec((n_rows, n_cols), flat).map_err(|e| {
            DecodeError::MismatchedLengths(format!("ROI {}: {e}", self.roi))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn document_round_trips_through_json() {
        let document = TimingDocument::new(vec![
            vec![StimulusEvent::new(1, 0.0), StimulusEvent::new(2, 4.5)],
            vec![StimulusEvent::new(1, 3.0)],
        ])
        .with_session_id("sub-01");

        let json = serde_json::to_string(&document).unwrap();
        let parsed = TimingAdapter::parse_document(&json).unwrap();
        assert_eq!(parsed.session_id.as_deref(), Some("sub-01"));
        assert_eq!(parsed.runs.len(), 2);
        assert_eq!(parsed.runs[0][1].condition, 2);
    }

    #[test]
    fn wrong_schema_version_is_rejected() {
        let json = r#"{"schema_version": "fmri.stim_event.v0", "runs": [[]]}"#;
        assert!(TimingAdapter::parse_document(json).is_err());
    }

    #[test]
    fn reserved_condition_fails_validation() {
        let document = TimingDocument::new(vec![vec![StimulusEvent::new(0, 1.0)]]);
        assert!(matches!(
            document.validate(),
            Err(ValidationError::ReservedCondition { run: 0, index: 0 })
        ));
    }

    #[test]
    fn negative_onset_fails_validation() {
        let document = TimingDocument::new(vec![vec![StimulusEvent::new(1, -2.0)]]);
        assert!(matches!(
            document.validate(),
            Err(ValidationError::InvalidOnset { .. })
        ));
    }

    #[test]
    fn issues_reports_every_problem() {
        let document = TimingDocument::new(vec![
            vec![StimulusEvent::new(0, 1.0)],
            vec![StimulusEvent::new(2, f64::NAN)],
        ]);
        assert_eq!(document.issues().len(), 2);
        assert!(TimingDocument::new(vec![vec![]]).issues().is_empty());
    }

    #[test]
    fn ndjson_groups_events_by_run() {
        let ndjson = r#"
{"run": 0, "condition": 1, "onset_seconds": 0.0}
{"run": 1, "condition": 2, "onset_seconds": 3.0}
{"run": 0, "condition": 2, "onset_seconds": 4.5}
"#;
        let runs = TimingAdapter::parse_ndjson(ndjson, 2).unwrap();
        assert_eq!(runs[0].len(), 2);
        assert_eq!(runs[1].len(), 1);
        assert_eq!(runs[0][1].onset_seconds, 4.5);
    }

    #[test]
    fn ndjson_rejects_out_of_range_run() {
        let ndjson = r#"{"run": 5, "condition": 1, "onset_seconds": 0.0}"#;
        assert!(TimingAdapter::parse_ndjson(ndjson, 2).is_err());
    }

    #[test]
    fn roi_matrix_converts_to_array() {
        let matrix = RoiMatrix {
            roi: "FFA".to_string(),
            data: vec![vec![1.0, 2.0], vec![3.0, 4.0]],
        };
        let array = matrix.to_array().unwrap();
        assert_eq!(array.dim(), (2, 2));
        assert_eq!(array[[1, 0]], 3.0);
    }

    #[test]
    fn ragged_roi_matrix_is_rejected() {
        let matrix = RoiMatrix {
            roi: "PPA".to_string(),
            data: vec![vec![1.0, 2.0], vec![3.0]],
        };
        assert!(matrix.to_array().is_err());
    }
}
