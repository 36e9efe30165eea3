//! Run-wise signal normalization
//!
//! Z-scores each run's feature rows independently: per-run per-column mean 0
//! and unit variance, leaving rows in their original order. Per-run (rather
//! than global) statistics isolate scanner drift between runs.

use crate::error::DecodeError;
use ndarray::Array2;

/// What to do when a feature column has zero variance within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZscorePolicy {
    /// Surface a data-quality error
    Strict,
    /// Substitute std = 1, so the column becomes all zeros after centering
    UnitStd,
}

/// Z-score `features` in place, one run at a time.
///
/// `run_ids[i]` names the run that row `i` belongs to; rows of the same run
/// need not be contiguous. Population standard deviation (ddof = 0) is used.
///
/// # Errors
///
/// Fails if `run_ids` and the row count disagree, if a run has no rows
/// (cannot happen for ids drawn from the data itself), or — under
/// [`ZscorePolicy::Strict`] — if any column of any run has zero variance.
pub fn zscore_per_run(
    features: &mut Array2<f64>,
    run_ids: &[u32],
    policy: ZscorePolicy,
) -> Result<(), DecodeError> {
    let (n_rows, n_cols) = features.dim();
    if run_ids.len() != n_rows {
        return Err(DecodeError::MismatchedLengths(format!(
            "feature matrix has {n_rows} rows but {} run identifiers",
            run_ids.len()
        )));
    }

    let mut runs: Vec<u32> = run_ids.to_vec();
    runs.sort_unstable();
    runs.dedup();

    for &run in &runs {
        let rows: Vec<usize> = run_ids
            .iter()
            .enumerate()
            .filter(|(_, &id)| id == run)
            .map(|(i, _)| i)
            .collect();
        let n = rows.len() as f64;

        for col in 0..n_cols {
            let mean = rows.iter().map(|&r| features[[r, col]]).sum::<f64>() / n;
            let var = rows
                .iter()
                .map(|&r| {
                    let d = features[[r, col]] - mean;
                    d * d
                })
                .sum::<f64>()
                / n;
            let std = var.sqrt();

            let std = if std == 0.0 {
                match policy {
                    ZscorePolicy::Strict => {
                        return Err(DecodeError::ZeroVariance { run, feature: col });
                    }
                    ZscorePolicy::UnitStd => 1.0,
                }
            } else {
                std
            };

            for &r in &rows {
                features[[r, col]] = (features[[r, col]] - mean) / std;
            }
        }
    }

    Ok(())
}
