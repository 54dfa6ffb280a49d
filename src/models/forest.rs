//! Random forest classifier evaluated natively from an exported tree dump

use crate::error::InferenceError;
use crate::models::classifier::{argmax, ClassPrediction, Classifier};
use crate::models::loader::Artifact;
use serde::{Deserialize, Serialize};

/// A tree node. Node 0 is the root and children always follow their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Go left when `x[feature] <= threshold`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Per-class sample weights that reached this leaf
    Leaf { value: Vec<f64> },
}

/// A single decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Class distribution of the leaf reached by `features`
    fn leaf(&self, features: &[f64]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    // trees are fitted on f32 inputs
                    let x = features[*feature] as f32 as f64;
                    idx = if x <= *threshold { *left } else { *right };
                }
                Node::Leaf { value } => return value,
            }
        }
    }

    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("empty tree".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!("node {} splits on feature {}", i, feature));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {} has a non-finite threshold", i));
                    }
                    for child in [left, right] {
                        if *child <= i || *child >= self.nodes.len() {
                            return Err(format!("node {} has invalid child {}", i, child));
                        }
                    }
                }
                Node::Leaf { value } => {
                    if value.len() != n_classes {
                        return Err(format!(
                            "leaf {} has {} class weights, expected {}",
                            i,
                            value.len(),
                            n_classes
                        ));
                    }
                    if value.iter().any(|v| !v.is_finite() || *v < 0.0)
                        || value.iter().sum::<f64>() <= 0.0
                    {
                        return Err(format!("leaf {} has invalid class weights", i));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Ensemble of decision trees; predicts the class with the highest mean probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    n_features: usize,
    classes: Vec<i64>,
    trees: Vec<Tree>,
}

impl RandomForest {
    pub fn new(n_features: usize, classes: Vec<i64>, trees: Vec<Tree>) -> Self {
        Self {
            n_features,
            classes,
            trees,
        }
    }

    /// Mean of the normalized leaf distributions across all trees
    pub fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let mut proba = vec![0.0; self.classes.len()];

        for tree in &self.trees {
            let leaf = tree.leaf(features);
            let total: f64 = leaf.iter().sum();
            for (p, weight) in proba.iter_mut().zip(leaf) {
                *p += weight / total;
            }
        }

        let n_trees = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n_trees);
        proba
    }
}

impl Classifier for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> Result<ClassPrediction, InferenceError> {
        let proba = self.predict_proba(features);
        let best = argmax(&proba).ok_or_else(|| InferenceError::Backend {
            model: "random_forest".to_string(),
            reason: "no classes".to_string(),
        })?;

        let churn_probability = self
            .classes
            .iter()
            .position(|&c| c == 1)
            .map(|i| proba[i])
            .unwrap_or(0.0);

        Ok(ClassPrediction {
            label: self.classes[best],
            churn_probability,
        })
    }
}

impl Artifact for RandomForest {
    const KIND: &'static str = "random_forest";

    fn validate(&self) -> Result<(), String> {
        if self.n_features == 0 {
            return Err("forest has no features".to_string());
        }
        if self.classes.is_empty() {
            return Err("forest has no classes".to_string());
        }
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.classes.len())
                .map_err(|e| format!("tree {}: {}", i, e))?;
        }
        Ok(())
    }
}
