//! Leave-one-run-out fold enumeration
//!
//! Cross-validation splits are materialized as an explicit fold sequence
//! rather than duck-typing a fold-key array through a library split utility.
//! One fold per distinct cv id, ascending; the test sets partition the rows.

use crate::error::DecodeError;

/// One train/test split: the rows of a single run held out for testing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    /// The cv id held out in this fold
    pub id: u32,
    /// Row indices used for training (all rows with a different cv id)
    pub train_rows: Vec<usize>,
    /// Row indices used for testing (all rows with this cv id)
    pub test_rows: Vec<usize>,
}

/// Enumerate leave-one-run-out folds from a cv-id vector.
///
/// Folds are ordered by ascending id. Every row appears in exactly one
/// fold's test set, and in the train set of every other fold.
///
/// # Errors
///
/// Fails if `cv_ids` is empty, or if only one distinct id is present (every
/// fold's training set would be empty).
pub fn leave_one_run_out(cv_ids: &[u32]) -> Result<Vec<Fold>, DecodeError> {
    if cv_ids.is_empty() {
        return Err(DecodeError::EmptyFold(
            "no samples to partition".to_string(),
        ));
    }

    let mut ids: Vec<u32> = cv_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    if ids.len() < 2 {
        return Err(DecodeError::EmptyFold(format!(
            "only one distinct run id ({}) present; leave-one-run-out needs at least two",
            ids[0]
        )));
    }

    let folds = ids
        .into_iter()
        .map(|id| {
            let mut train_rows = Vec::new();
            let mut test_rows = Vec::new();
            for (row, &cv) in cv_ids.iter().enumerate() {
                if cv == id {
                    test_rows.push(row);
                } else {
                    train_rows.push(row);
                }
            }
            Fold {
                id,
                train_rows,
                test_rows,
            }
        })
        .collect();

    Ok(folds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn folds_are_ordered_by_ascending_id() {
        let folds = leave_one_run_out(&[2, 2, 0, 0, 1, 1]).unwrap();
        let ids: Vec<u32> = folds.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_sets_partition_the_rows() {
        let cv_ids = [0, 1, 2, 0, 1, 2, 0, 1, 2];
        let folds = leave_one_run_out(&cv_ids).unwrap();

        let mut seen = vec![0usize; cv_ids.len()];
        for fold in &folds {
            for &row in &fold.test_rows {
                seen[row] += 1;
            }
            // No row in both sides of the same fold.
            for &row in &fold.test_rows {
                assert!(!fold.train_rows.contains(&row));
            }
            assert_eq!(fold.train_rows.len() + fold.test_rows.len(), cv_ids.len());
        }
        // Every row held out exactly once across folds.
        assert!(seen.iter().all(|&count| count == 1));
    }

    #[test]
    fn fold_rows_match_their_id() {
        let cv_ids = [0, 0, 1, 1, 1];
        let folds = leave_one_run_out(&cv_ids).unwrap();
        assert_eq!(folds[0].test_rows, vec![0, 1]);
        assert_eq!(folds[0].train_rows, vec![2, 3, 4]);
        assert_eq!(folds[1].test_rows, vec![2, 3, 4]);
        assert_eq!(folds[1].train_rows, vec![0, 1]);
    }

    #[test]
    fn empty_input_errors() {
        assert!(matches!(
            leave_one_run_out(&[]),
            Err(DecodeError::EmptyFold(_))
        ));
    }

    #[test]
    fn single_run_errors() {
        assert!(matches!(
            leave_one_run_out(&[3, 3, 3]),
            Err(DecodeError::EmptyFold(_))
        ));
    }
}
