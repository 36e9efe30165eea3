//! Scan protocol configuration
//!
//! The scan protocol describes the acquisition grid shared by every run of a
//! session: TR length, TRs per run, run count, and the constant hemodynamic
//! lag applied before decoding. It is an immutable value passed into both the
//! timing aligner and the decoder, never a set of module-level globals.

use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Immutable description of the scanning session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProtocol {
    /// Repetition time: seconds between successive whole-brain samples
    pub tr_seconds: f64,
    /// Number of TRs acquired in each run (uniform across runs)
    pub trs_per_run: usize,
    /// Number of runs in the session
    pub num_runs: usize,
    /// Hemodynamic lag in seconds, converted to whole TRs before shifting
    pub hemodynamic_lag_seconds: f64,
    /// Condition label dictionary (label code -> human-readable name)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub condition_names: HashMap<u32, String>,
}

impl ScanProtocol {
    /// Create a protocol with no hemodynamic lag and an empty label dictionary
    pub fn new(tr_seconds: f64, trs_per_run: usize, num_runs: usize) -> Self {
        Self {
            tr_seconds,
            trs_per_run,
            num_runs,
            hemodynamic_lag_seconds: 0.0,
            condition_names: HashMap::new(),
        }
    }

    /// Set the hemodynamic lag in seconds
    pub fn with_lag_seconds(mut self, lag_seconds: f64) -> Self {
        self.hemodynamic_lag_seconds = lag_seconds;
        self
    }

    /// Name a condition label
    pub fn with_condition(mut self, label: u32, name: impl Into<String>) -> Self {
        self.condition_names.insert(label, name.into());
        self
    }

    /// Validate the protocol parameters
    pub fn validate(&self) -> Result<(), DecodeError> {
        if !(self.tr_seconds > 0.0) {
            return Err(DecodeError::InvalidProtocol(format!(
                "tr_seconds must be positive, got {}",
                self.tr_seconds
            )));
        }
        if self.trs_per_run < 1 {
            return Err(DecodeError::InvalidProtocol(
                "trs_per_run must be at least 1".to_string(),
            ));
        }
        if self.num_runs < 1 {
            return Err(DecodeError::InvalidProtocol(
                "num_runs must be at least 1".to_string(),
            ));
        }
        if !self.hemodynamic_lag_seconds.is_finite() || self.hemodynamic_lag_seconds < 0.0 {
            return Err(DecodeError::InvalidProtocol(format!(
                "hemodynamic_lag_seconds must be non-negative, got {}",
                self.hemodynamic_lag_seconds
            )));
        }
        Ok(())
    }

    /// Total number of TRs across all runs
    pub fn total_trs(&self) -> usize {
        self.num_runs * self.trs_per_run
    }

    /// Hemodynamic lag expressed in whole TR slots (rounded to nearest)
    pub fn lag_trs(&self) -> usize {
        (self.hemodynamic_lag_seconds / self.tr_seconds).round() as usize
    }

    /// Look up the human-readable name for a condition label
    pub fn condition_name(&self, label: u32) -> Option<&str> {
        self.condition_names.get(&label).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn valid_protocol_passes() {
        let protocol = ScanProtocol::new(1.5, 120, 8).with_lag_seconds(4.5);
        assert!(protocol.validate().is_ok());
        assert_eq!(protocol.total_trs(), 960);
        assert_eq!(protocol.lag_trs(), 3);
    }

    #[test]
    fn rejects_non_positive_tr() {
        let protocol = ScanProtocol::new(0.0, 120, 8);
        assert!(matches!(
            protocol.validate(),
            Err(DecodeError::InvalidProtocol(_))
        ));

        let protocol = ScanProtocol::new(-2.0, 120, 8);
        assert!(protocol.validate().is_err());
    }

    #[test]
    fn rejects_zero_trs_per_run() {
        let protocol = ScanProtocol::new(2.0, 0, 8);
        assert!(protocol.validate().is_err());
    }

    #[test]
    fn lag_rounds_to_nearest_tr() {
        // 6 s lag at TR=2.5 s -> 2.4 TRs -> 2 slots
        let protocol = ScanProtocol::new(2.5, 100, 4).with_lag_seconds(6.0);
        assert_eq!(protocol.lag_trs(), 2);

        // 4 s lag at TR=1.5 s -> 2.67 TRs -> 3 slots
        let protocol = ScanProtocol::new(1.5, 100, 4).with_lag_seconds(4.0);
        assert_eq!(protocol.lag_trs(), 3);
    }

    #[test]
    fn condition_dictionary_lookup() {
        let protocol = ScanProtocol::new(2.0, 100, 4)
            .with_condition(1, "face")
            .with_condition(2, "place");
        assert_eq!(protocol.condition_name(1), Some("face"));
        assert_eq!(protocol.condition_name(2), Some("place"));
        assert_eq!(protocol.condition_name(3), None);
    }

    #[test]
    fn protocol_serde_round_trip() {
        let protocol = ScanProtocol::new(1.5, 120, 8)
            .with_lag_seconds(4.5)
            .with_condition(1, "face");
        let json = serde_json::to_string(&protocol).unwrap();
        let back: ScanProtocol = serde_json::from_str(&json).unwrap();
        assert_eq!(back.trs_per_run, 120);
        assert_eq!(back.condition_name(1), Some("face"));
    }
}
