//! Verdict and reply data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Binary churn classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Churn,
    NoChurn,
}

impl Verdict {
    /// Interpret a classifier label: the positive class (1) is churn
    pub fn from_label(label: i64) -> Self {
        if label == 1 {
            Verdict::Churn
        } else {
            Verdict::NoChurn
        }
    }

    /// Text shown to the user
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Churn => "Churn",
            Verdict::NoChurn => "No Churn",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Reply sent back to the presentation layer for one prediction request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionReply {
    /// Unique reply identifier
    pub request_id: String,

    /// Verdict, absent when the request was rejected
    pub verdict: Option<Verdict>,

    /// Display text for the verdict
    pub label: Option<String>,

    /// Churn probability behind the verdict (0.0 - 1.0)
    pub churn_probability: Option<f64>,

    /// Model (or "ensemble") that produced the verdict
    pub model: Option<String>,

    /// Per-model churn probabilities
    #[serde(default)]
    pub model_probabilities: HashMap<String, f64>,

    /// Rejection reason
    pub error: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl PredictionReply {
    /// Reply carrying a verdict
    pub fn verdict(
        verdict: Verdict,
        churn_probability: f64,
        model: String,
        model_probabilities: HashMap<String, f64>,
    ) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            verdict: Some(verdict),
            label: Some(verdict.label().to_string()),
            churn_probability: Some(churn_probability),
            model: Some(model),
            model_probabilities,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Reply for a rejected request
    pub fn rejected(reason: impl fmt::Display) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            verdict: None,
            label: None,
            churn_probability: None,
            model: None,
            model_probabilities: HashMap::new(),
            error: Some(reason.to_string()),
            timestamp: Utc::now(),
        }
    }
}
