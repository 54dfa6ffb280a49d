//! Common interface for loaded classifiers

use crate::error::InferenceError;

/// Output of one classifier on one feature vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassPrediction {
    /// Predicted class label
    pub label: i64,
    /// Probability of the positive (churn) class
    pub churn_probability: f64,
}

/// A fitted binary classifier. Implementations hold only read-only learned state.
pub trait Classifier: Send + Sync {
    /// Feature vector width the model was fitted on
    fn n_features(&self) -> usize;

    /// Run the decision procedure on a single vector of the right width
    fn predict(&self, features: &[f64]) -> Result<ClassPrediction, InferenceError>;
}

/// Index of the largest value; the first one wins ties.
pub(crate) fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, value) in values.iter().enumerate() {
        match best {
            Some(b) if values[b] >= *value => {}
            _ => best = Some(i),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_first_on_ties() {
        assert_eq!(argmax(&[0.5, 0.5]), Some(0));
        assert_eq!(argmax(&[0.2, 0.8]), Some(1));
        assert_eq!(argmax(&[]), None);
    }
}
