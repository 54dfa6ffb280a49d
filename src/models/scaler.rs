//! Fitted standard scaler

use crate::models::loader::Artifact;
use serde::{Deserialize, Serialize};

/// Standardizes each column as `(x - mean) / scale`.
///
/// `feature_names` is the column order seen at fit time, when the exporter
/// recorded it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
    #[serde(default)]
    feature_names: Vec<String>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self {
            mean,
            scale,
            feature_names: Vec::new(),
        }
    }

    pub fn with_feature_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.feature_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        if self.feature_names.is_empty() {
            None
        } else {
            Some(&self.feature_names)
        }
    }

    /// Scale a vector in place. The caller guarantees the width.
    pub fn transform(&self, values: &mut [f64]) {
        for ((value, mean), scale) in values.iter_mut().zip(&self.mean).zip(&self.scale) {
            // constant columns are fitted with zero variance
            let scale = if *scale == 0.0 { 1.0 } else { *scale };
            *value = (*value - mean) / scale;
        }
    }
}

impl Artifact for StandardScaler {
    const KIND: &'static str = "standard_scaler";

    fn validate(&self) -> Result<(), String> {
        if self.mean.is_empty() {
            return Err("scaler has no columns".to_string());
        }
        if self.mean.len() != self.scale.len() {
            return Err(format!(
                "mean has {} columns but scale has {}",
                self.mean.len(),
                self.scale.len()
            ));
        }
        if !self.feature_names.is_empty() && self.feature_names.len() != self.mean.len() {
            return Err(format!(
                "{} feature names for {} columns",
                self.feature_names.len(),
                self.mean.len()
            ));
        }
        if let Some(i) = self
            .mean
            .iter()
            .chain(&self.scale)
            .position(|v| !v.is_finite())
        {
            return Err(format!("non-finite parameter at position {}", i));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform() {
        let scaler = StandardScaler::new(vec![10.0, 0.0, 5.0], vec![2.0, 1.0, 0.0]);
        let mut values = [14.0, -3.0, 7.0];

        scaler.transform(&mut values);

        assert_eq!(values, [2.0, -3.0, 2.0]);
    }

    #[test]
    fn test_validate() {
        assert!(StandardScaler::new(vec![0.0], vec![1.0, 1.0]).validate().is_err());
        assert!(StandardScaler::new(vec![f64::NAN], vec![1.0]).validate().is_err());
        assert!(StandardScaler::new(vec![0.0, 1.0], vec![1.0, 1.0])
            .with_feature_names(["a"])
            .validate()
            .is_err());
        assert!(StandardScaler::new(vec![0.0], vec![1.0]).validate().is_ok());
    }

    #[test]
    fn test_deserialize_without_names() {
        let scaler: StandardScaler =
            serde_json::from_str(r#"{"mean": [1.0], "scale": [2.0]}"#).unwrap();
        assert_eq!(scaler.n_features(), 1);
        assert!(scaler.feature_names().is_none());
    }
}
