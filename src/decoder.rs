//! Run-wise decoding with leave-one-run-out cross-validation
//!
//! Trains a fresh classifier per fold on every run but one and scores it on
//! the held-out run. Folds are evaluated sequentially, in ascending fold-id
//! order; nothing fitted in one fold carries into the next.

use crate::classifier::Classifier;
use crate::error::DecodeError;
use crate::folds::leave_one_run_out;
use crate::types::FoldScore;
use ndarray::{ArrayView2, Axis};

/// Per-fold fitted classifiers and accuracies, ordered by ascending fold id
#[derive(Debug, Clone)]
pub struct DecodeOutcome<C> {
    /// One fitted classifier per fold, parallel to `scores`
    pub classifiers: Vec<C>,
    /// One accuracy per fold, in [0, 1]
    pub scores: Vec<FoldScore>,
}

impl<C> DecodeOutcome<C> {
    /// Mean accuracy across folds
    pub fn mean_accuracy(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        self.scores.iter().map(|s| s.accuracy).sum::<f64>() / self.scores.len() as f64
    }
}

/// Leave-one-run-out cross-validation over `(x, y)` keyed by `cv_ids`.
///
/// `cv_ids` is purely the fold key; it usually equals the run identifiers
/// used for normalization but is not required to. The factory supplies a
/// fresh, unfitted classifier for each fold.
///
/// # Errors
///
/// Fails if the row counts of `x`, `y`, and `cv_ids` disagree, if any fold
/// would have an empty train or test set, or if the classifier itself fails
/// to fit or score (propagated unchanged).
pub fn cross_validate<C, F>(
    x: ArrayView2<'_, f64>,
    y: &[u32],
    cv_ids: &[u32],
    factory: F,
) -> Result<DecodeOutcome<C>, DecodeError>
where
    C: Classifier,
    F: Fn() -> C,
{
    let n_rows = x.nrows();
    if y.len() != n_rows || cv_ids.len() != n_rows {
        return Err(DecodeError::MismatchedLengths(format!(
            "feature rows = {n_rows}, labels = {}, cv ids = {}",
            y.len(),
            cv_ids.len()
        )));
    }

    let folds = leave_one_run_out(cv_ids)?;

    let mut classifiers = Vec::with_capacity(folds.len());
    let mut scores = Vec::with_capacity(folds.len());

    for fold in &folds {
        if fold.train_rows.is_empty() {
            return Err(DecodeError::EmptyFold(format!(
                "fold {} has an empty training set",
                fold.id
            )));
        }
        if fold.test_rows.is_empty() {
            return Err(DecodeError::EmptyFold(format!(
                "fold {} has an empty test set",
                fold.id
            )));
        }

        let x_train = x.select(Axis(0), &fold.train_rows);
        let y_train: Vec<u32> = fold.train_rows.iter().map(|&r| y[r]).collect();
        let x_test = x.select(Axis(0), &fold.test_rows);
        let y_test: Vec<u32> = fold.test_rows.iter().map(|&r| y[r]).collect();

        let mut model = factory();
        model.fit(x_train.view(), &y_train)?;
        let accuracy = model.score(x_test.view(), &y_test)?;

        classifiers.push(model);
        scores.push(FoldScore {
            fold_id: fold.id,
            accuracy,
        });
    }

    Ok(DecodeOutcome {
        classifiers,
        scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::LinearDecoder;
    use ndarray::{array, Array2};
    use pretty_assertions::assert_eq;

    /// Three runs of two perfectly separable classes: class 1 sits near
    /// (+1, +1), class 2 near (-1, -1), in every run.
    fn separable_three_runs() -> (Array2<f64>, Vec<u32>, Vec<u32>) {
        let mut rows = Vec::new();
        let mut y = Vec::new();
        let mut cv = Vec::new();
        for run in 0..3u32 {
            let jitter = 0.05 * f64::from(run);
            for sample in 0..4 {
                let offset = 0.02 * f64::from(sample);
                rows.push([1.0 + jitter + offset, 1.0 - offset]);
                y.push(1);
                cv.push(run);
                rows.push([-1.0 - jitter - offset, -1.0 + offset]);
                y.push(2);
                cv.push(run);
            }
        }
        let x = Array2::from_shape_vec(
            (rows.len(), 2),
            rows.into_iter().flatten().collect(),
        )
        .unwrap();
        (x, y, cv)
    }

    #[test]
    fn separable_runs_decode_perfectly() {
        let (x, y, cv) = separable_three_runs();
        let outcome = cross_validate(x.view(), &y, &cv, LinearDecoder::default).unwrap();

        assert_eq!(outcome.scores.len(), 3);
        assert_eq!(outcome.classifiers.len(), 3);
        for score in &outcome.scores {
            assert_eq!(score.accuracy, 1.0);
        }
        assert_eq!(outcome.mean_accuracy(), 1.0);
    }

    #[test]
    fn scores_come_back_in_ascending_fold_order() {
        let (x, y, mut cv) = separable_three_runs();
        // Relabel runs out of order; output must still ascend.
        for id in &mut cv {
            *id = match *id {
                0 => 7,
                1 => 3,
                _ => 5,
            };
        }
        let outcome = cross_validate(x.view(), &y, &cv, LinearDecoder::default).unwrap();
        let ids: Vec<u32> = outcome.scores.iter().map(|s| s.fold_id).collect();
        assert_eq!(ids, vec![3, 5, 7]);
    }

    #[test]
    fn accuracies_stay_in_unit_interval() {
        // Labels uncorrelated with features; accuracy may be poor but must
        // remain a valid proportion.
        let x = array![
            [0.1, -0.2],
            [-0.1, 0.3],
            [0.2, 0.1],
            [-0.3, -0.1],
            [0.15, 0.25],
            [-0.25, 0.05],
        ];
        let y = [1, 2, 2, 1, 1, 2];
        let cv = [0, 0, 1, 1, 2, 2];
        let outcome = cross_validate(x.view(), &y, &cv, LinearDecoder::default).unwrap();
        for score in &outcome.scores {
            assert!((0.0..=1.0).contains(&score.accuracy));
        }
    }

    #[test]
    fn mismatched_inputs_error() {
        let x = array![[1.0], [2.0]];
        assert!(matches!(
            cross_validate(x.view(), &[1], &[0, 1], LinearDecoder::default),
            Err(DecodeError::MismatchedLengths(_))
        ));
        assert!(matches!(
            cross_validate(x.view(), &[1, 2], &[0], LinearDecoder::default),
            Err(DecodeError::MismatchedLengths(_))
        ));
    }

    #[test]
    fn single_run_cannot_cross_validate() {
        let x = array![[1.0], [2.0]];
        assert!(matches!(
            cross_validate(x.view(), &[1, 2], &[0, 0], LinearDecoder::default),
            Err(DecodeError::EmptyFold(_))
        ));
    }
}
