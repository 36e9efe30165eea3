//! Report encoding
//!
//! This module encodes decoding results into versioned JSON report payloads.
//! Ensures all required fields are present and properly formatted.

use crate::error::DecodeError;
use crate::protocol::ScanProtocol;
use crate::types::{DecodeReport, ReportProducer, ReportProtocol, ReportProvenance, RoiSummary};
use crate::{PRODUCER_NAME, ROIDECODE_VERSION};
use chrono::Utc;
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "decode.report.v1";

/// Report encoder for producing decode report payloads
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Assemble a report from per-ROI summaries
    pub fn encode(
        &self,
        session_id: &str,
        protocol: &ScanProtocol,
        rois: Vec<RoiSummary>,
    ) -> DecodeReport {
        let producer = ReportProducer {
            name: PRODUCER_NAME.to_string(),
            version: ROIDECODE_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        let provenance = ReportProvenance {
            session_id: session_id.to_string(),
            computed_at_utc: Utc::now().to_rfc3339(),
        };

        let protocol = ReportProtocol {
            tr_seconds: protocol.tr_seconds,
            trs_per_run: protocol.trs_per_run,
            num_runs: protocol.num_runs,
            hemodynamic_lag_trs: protocol.lag_trs(),
        };

        DecodeReport {
            report_version: REPORT_VERSION.to_string(),
            producer,
            provenance,
            protocol,
            rois,
        }
    }

    /// Encode to JSON string
    pub fn encode_to_json(
        &self,
        session_id: &str,
        protocol: &ScanProtocol,
        rois: Vec<RoiSummary>,
    ) -> Result<String, DecodeError> {
        let report = self.encode(session_id, protocol, rois);
        serde_json::to_string_pretty(&report).map_err(DecodeError::JsonError)
    }
}
