//! Logistic regression classifier

use crate::error::InferenceError;
use crate::models::classifier::{ClassPrediction, Classifier};
use crate::models::loader::Artifact;
use serde::{Deserialize, Serialize};

fn default_classes() -> Vec<i64> {
    vec![0, 1]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    coefficients: Vec<f64>,
    intercept: f64,
    #[serde(default = "default_classes")]
    classes: Vec<i64>,
}

impl LogisticRegression {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
            classes: default_classes(),
        }
    }

    fn decision(&self, features: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept
    }
}

impl Classifier for LogisticRegression {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, features: &[f64]) -> Result<ClassPrediction, InferenceError> {
        let z = self.decision(features);
        let p = 1.0 / (1.0 + (-z).exp());
        let label = if z > 0.0 {
            self.classes[1]
        } else {
            self.classes[0]
        };

        // probability is reported for the class labelled 1
        let churn_probability = if self.classes[1] == 1 {
            p
        } else if self.classes[0] == 1 {
            1.0 - p
        } else {
            0.0
        };

        Ok(ClassPrediction {
            label,
            churn_probability,
        })
    }
}

impl Artifact for LogisticRegression {
    const KIND: &'static str = "logistic_regression";

    fn validate(&self) -> Result<(), String> {
        if self.coefficients.is_empty() {
            return Err("model has no coefficients".to_string());
        }
        if self.classes.len() != 2 {
            return Err(format!("expected 2 classes, found {}", self.classes.len()));
        }
        if let Some(i) = self.coefficients.iter().position(|w| !w.is_finite()) {
            return Err(format!("non-finite coefficient at index {}", i));
        }
        if !self.intercept.is_finite() {
            return Err("non-finite intercept".to_string());
        }
        Ok(())
    }
}
