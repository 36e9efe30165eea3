//! Linear classification capability
//!
//! The decoder depends only on the [`Classifier`] trait; any linear model
//! with fit/predict/score can be substituted. The built-in [`LinearDecoder`]
//! is a one-vs-rest logistic model trained by batch gradient descent:
//! deterministic (zero-initialized, fixed epoch count) and adequate for the
//! handful-of-voxels, handful-of-trials regime this crate targets.

use crate::error::DecodeError;
use ndarray::{Array2, ArrayView2};

/// Fit/predict/score contract the decoder trains and evaluates against
pub trait Classifier {
    /// Fit the model on rows of `x` with parallel labels `y`
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[u32]) -> Result<(), DecodeError>;

    /// Predict one label per row of `x`
    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<u32>, DecodeError>;

    /// Classification accuracy on `(x, y)`, in [0, 1]
    fn score(&self, x: ArrayView2<'_, f64>, y: &[u32]) -> Result<f64, DecodeError> {
        if y.len() != x.nrows() {
            return Err(DecodeError::MismatchedLengths(format!(
                "scoring {} rows against {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if y.is_empty() {
            return Err(DecodeError::ClassifierError(
                "cannot score an empty sample set".to_string(),
            ));
        }
        let predicted = self.predict(x)?;
        let correct = predicted.iter().zip(y).filter(|(p, t)| p == t).count();
        Ok(correct as f64 / y.len() as f64)
    }
}

/// One-vs-rest logistic model with a linear decision rule per class
#[derive(Debug, Clone)]
pub struct LinearDecoder {
    epochs: usize,
    learning_rate: f64,
    classes: Vec<u32>,
    /// One weight row per class, columns = features
    weights: Array2<f64>,
    intercepts: Vec<f64>,
}

impl Default for LinearDecoder {
    fn default() -> Self {
        Self::new(300, 0.5)
    }
}

impl LinearDecoder {
    /// Create an unfitted decoder with explicit training hyperparameters
    pub fn new(epochs: usize, learning_rate: f64) -> Self {
        Self {
            epochs,
            learning_rate,
            classes: Vec::new(),
            weights: Array2::zeros((0, 0)),
            intercepts: Vec::new(),
        }
    }

    /// Distinct class labels seen during fitting, ascending
    pub fn classes(&self) -> &[u32] {
        &self.classes
    }

    fn decision_values(&self, x: ArrayView2<'_, f64>, row: usize) -> Vec<f64> {
        self.classes
            .iter()
            .enumerate()
            .map(|(c, _)| {
                let mut z = self.intercepts[c];
                for col in 0..x.ncols() {
                    z += self.weights[[c, col]] * x[[row, col]];
                }
                z
            })
            .collect()
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Classifier for LinearDecoder {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[u32]) -> Result<(), DecodeError> {
        let (n_rows, n_cols) = x.dim();
        if y.len() != n_rows {
            return Err(DecodeError::MismatchedLengths(format!(
                "fitting {n_rows} rows against {} labels",
                y.len()
            )));
        }
        if n_rows == 0 {
            return Err(DecodeError::ClassifierError(
                "cannot fit on an empty training set".to_string(),
            ));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(DecodeError::ClassifierError(
                "training features contain NaN or Inf".to_string(),
            ));
        }

        let mut classes: Vec<u32> = y.to_vec();
        classes.sort_unstable();
        classes.dedup();

        let n_classes = classes.len();
        let mut weights = Array2::<f64>::zeros((n_classes, n_cols));
        let mut intercepts = vec![0.0; n_classes];

        // Batch gradient descent on the logistic loss, one binary problem
        // per class. A single class degenerates to a constant predictor.
        if n_classes > 1 {
            let inv_n = 1.0 / n_rows as f64;
            for _ in 0..self.epochs {
                for (c, &class) in classes.iter().enumerate() {
                    let mut grad_w = vec![0.0; n_cols];
                    let mut grad_b = 0.0;

                    for row in 0..n_rows {
                        let mut z = intercepts[c];
                        for col in 0..n_cols {
                            z += weights[[c, col]] * x[[row, col]];
                        }
                        let target = if y[row] == class { 1.0 } else { 0.0 };
                        let residual = sigmoid(z) - target;
                        for col in 0..n_cols {
                            grad_w[col] += residual * x[[row, col]];
                        }
                        grad_b += residual;
                    }

                    for col in 0..n_cols {
                        weights[[c, col]] -= self.learning_rate * grad_w[col] * inv_n;
                    }
                    intercepts[c] -= self.learning_rate * grad_b * inv_n;
                }
            }
        }

        self.classes = classes;
        self.weights = weights;
        self.intercepts = intercepts;
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<u32>, DecodeError> {
        if self.classes.is_empty() {
            return Err(DecodeError::ClassifierError(
                "predict called before fit".to_string(),
            ));
        }
        if x.ncols() != self.weights.ncols() {
            return Err(DecodeError::MismatchedLengths(format!(
                "model was fitted on {} features but given {}",
                self.weights.ncols(),
                x.ncols()
            )));
        }

        let mut predicted = Vec::with_capacity(x.nrows());
        for row in 0..x.nrows() {
            let values = self.decision_values(x, row);
            let best = values
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(idx, _)| idx)
                .unwrap_or(0);
            predicted.push(self.classes[best]);
        }
        Ok(predicted)
    }
}
