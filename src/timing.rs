//! Stimulus-timing-to-scan alignment
//!
//! Maps stimulus-onset events onto the scanner's TR grid, producing one
//! condition label per scan sample across all runs, and applies the constant
//! hemodynamic lag as a whole-TR shift.
//!
//! The absolute index of an event is `run * trs_per_run + floor(onset / TR)`.
//! When two events land on the same TR, the later event in input order wins;
//! that is the documented collision policy, not a domain necessity.

use crate::error::DecodeError;
use crate::protocol::ScanProtocol;
use crate::types::{StimulusEvent, REST_LABEL};

/// Align per-run event lists to the TR grid.
///
/// Returns a label vector of length `num_runs * trs_per_run`, initialized to
/// [`REST_LABEL`], with each event's condition written at its computed scan
/// index. Events need not be sorted within a run.
///
/// # Errors
///
/// Fails with a configuration error if the protocol is invalid, the number
/// of run lists does not match `num_runs`, an onset is negative or
/// non-finite, or a computed index falls outside the event's own run.
pub fn align(
    protocol: &ScanProtocol,
    runs: &[Vec<StimulusEvent>],
) -> Result<Vec<u32>, DecodeError> {
    protocol.validate()?;

    if runs.len() != protocol.num_runs {
        return Err(DecodeError::InvalidProtocol(format!(
            "protocol declares {} runs but {} event lists were supplied",
            protocol.num_runs,
            runs.len()
        )));
    }

    let mut labels = vec![REST_LABEL; protocol.total_trs()];

    for (run, events) in runs.iter().enumerate() {
        for event in events {
            if event.condition == REST_LABEL {
                return Err(DecodeError::ParseError(format!(
                    "run {run}: condition label 0 is reserved for rest"
                )));
            }
            if !event.onset_seconds.is_finite() || event.onset_seconds < 0.0 {
                return Err(DecodeError::OnsetOutOfRange {
                    run,
                    onset_seconds: event.onset_seconds,
                    scan: 0,
                    trs_per_run: protocol.trs_per_run,
                });
            }

            let scan = (event.onset_seconds / protocol.tr_seconds).floor() as usize;
            if scan >= protocol.trs_per_run {
                return Err(DecodeError::OnsetOutOfRange {
                    run,
                    onset_seconds: event.onset_seconds,
                    scan,
                    trs_per_run: protocol.trs_per_run,
                });
            }

            labels[run * protocol.trs_per_run + scan] = event.condition;
        }
    }

    Ok(labels)
}

/// Shift a label vector later in time by `shift` TR slots.
///
/// `out[i] = labels[i - shift]` for `i >= shift`; the first `shift` entries
/// become [`REST_LABEL`]. Labels shifted past the end are dropped, never
/// wrapped. Shifting by 0 is the identity.
pub fn shift_labels(labels: &[u32], shift: usize) -> Vec<u32> {
    let mut shifted = vec![REST_LABEL; labels.len()];
    if shift < labels.len() {
        shifted[shift..].copy_from_slice(&labels[..labels.len() - shift]);
    }
    shifted
}

/// Per-TR run identifiers parallel to the aligned label vector: entry `i` is
/// the run that scan `i` belongs to.
pub fn run_identifiers(protocol: &ScanProtocol) -> Vec<u32> {
    (0..protocol.total_trs())
        .map(|i| (i / protocol.trs_per_run) as u32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn protocol_3x4() -> ScanProtocol {
        ScanProtocol::new(1.5, 4, 3)
    }

    #[test]
    fn aligns_onsets_within_run_zero() {
        // Run 0: label 1 at 0.0 s -> scan 0, label 2 at 4.5 s -> scan 3.
        let runs = vec![
            vec![StimulusEvent::new(1, 0.0), StimulusEvent::new(2, 4.5)],
            vec![],
            vec![],
        ];
        let labels = align(&protocol_3x4(), &runs).unwrap();
        assert_eq!(labels, vec![1, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn run_offset_uses_direct_multiplication() {
        // Onset 0 in run r maps to r * trs_per_run; the last valid onset
        // (N-1)*T maps to r * trs_per_run + (N - 1).
        let runs = vec![
            vec![],
            vec![StimulusEvent::new(3, 0.0)],
            vec![StimulusEvent::new(4, 4.5)],
        ];
        let labels = align(&protocol_3x4(), &runs).unwrap();
        assert_eq!(labels[4], 3);
        assert_eq!(labels[11], 4);
    }

    #[test]
    fn output_length_is_total_trs_even_with_no_events() {
        let runs = vec![vec![], vec![], vec![]];
        let labels = align(&protocol_3x4(), &runs).unwrap();
        assert_eq!(labels.len(), 12);
        assert!(labels.iter().all(|&l| l == REST_LABEL));
    }

    #[test]
    fn later_event_wins_on_collision() {
        // Both onsets fall in scan 0 of run 0; input order decides.
        let runs = vec![
            vec![StimulusEvent::new(1, 0.2), StimulusEvent::new(2, 0.9)],
            vec![],
            vec![],
        ];
        let labels = align(&protocol_3x4(), &runs).unwrap();
        assert_eq!(labels[0], 2);
    }

    #[test]
    fn out_of_range_onset_is_an_error_not_a_clip() {
        // 6.0 s / 1.5 s = scan 4, past the 4-TR run.
        let runs = vec![vec![StimulusEvent::new(1, 6.0)], vec![], vec![]];
        let err = align(&protocol_3x4(), &runs).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::OnsetOutOfRange {
                run: 0,
                scan: 4,
                trs_per_run: 4,
                ..
            }
        ));
    }

    #[test]
    fn negative_onset_is_rejected() {
        let runs = vec![vec![StimulusEvent::new(1, -0.1)], vec![], vec![]];
        assert!(align(&protocol_3x4(), &runs).is_err());
    }

    #[test]
    fn run_count_mismatch_is_rejected() {
        let runs = vec![vec![], vec![]];
        assert!(matches!(
            align(&protocol_3x4(), &runs),
            Err(DecodeError::InvalidProtocol(_))
        ));
    }

    #[test]
    fn rest_label_in_input_is_rejected() {
        let runs = vec![vec![StimulusEvent::new(0, 1.0)], vec![], vec![]];
        assert!(align(&protocol_3x4(), &runs).is_err());
    }

    #[test]
    fn shift_moves_labels_later_and_zero_fills() {
        let labels = vec![1, 2, 3, 4, 5, 6];
        assert_eq!(shift_labels(&labels, 2), vec![0, 0, 1, 2, 3, 4]);
    }

    #[test]
    fn shift_by_zero_is_identity() {
        let labels = vec![1, 0, 2, 0];
        assert_eq!(shift_labels(&labels, 0), labels);
    }

    #[test]
    fn shift_past_end_yields_all_rest() {
        let labels = vec![1, 2, 3];
        assert_eq!(shift_labels(&labels, 3), vec![0, 0, 0]);
        assert_eq!(shift_labels(&labels, 10), vec![0, 0, 0]);
    }

    #[test]
    fn run_identifiers_repeat_per_run() {
        let ids = run_identifiers(&protocol_3x4());
        assert_eq!(ids, vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2]);
    }
}
