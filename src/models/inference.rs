//! Multi-model inference engine for churn prediction

use crate::config::{AppConfig, InferenceConfig, InferenceStrategy};
use crate::error::PredictError;
use crate::feature_encoder::{FeatureEncoder, FeatureVector};
use crate::models::aggregator::ScoreAggregator;
use crate::models::loader::{ArtifactStore, Artifacts, LoadedModel};
use crate::types::record::RawRecord;
use crate::types::verdict::{PredictionReply, Verdict};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Result of model inference
#[derive(Debug, Clone)]
pub struct PredictionResult {
    pub verdict: Verdict,
    /// Churn probability behind the verdict (0.0 - 1.0)
    pub churn_probability: f64,
    /// Model that decided, or "ensemble"
    pub model: String,
    /// Individual model probabilities
    pub model_probabilities: HashMap<String, f64>,
}

impl PredictionResult {
    /// Convert to the reply sent to the presentation layer
    pub fn to_reply(&self) -> PredictionReply {
        PredictionReply::verdict(
            self.verdict,
            self.churn_probability,
            self.model.clone(),
            self.model_probabilities.clone(),
        )
    }
}

/// Encodes records and runs the loaded classifiers over them.
///
/// Holds the artifacts read-only; safe to share behind an `Arc`.
pub struct InferenceEngine {
    artifacts: Arc<Artifacts>,
    encoder: FeatureEncoder,
    aggregator: ScoreAggregator,
    strategy: InferenceStrategy,
    primary_model: String,
}

impl InferenceEngine {
    /// Load artifacts per configuration and build the engine.
    ///
    /// Load problems are logged and leave the engine degraded rather than failing.
    pub fn new(config: &AppConfig) -> Self {
        let artifacts = ArtifactStore::new(config.artifacts.clone()).load_all();
        artifacts.report.log();
        Self::from_artifacts(Arc::new(artifacts), &config.inference)
    }

    /// Build an engine over already loaded artifacts
    pub fn from_artifacts(artifacts: Arc<Artifacts>, config: &InferenceConfig) -> Self {
        let encoder = FeatureEncoder::new();
        info!(
            strategy = ?config.strategy,
            primary_model = %config.primary_model,
            models = ?artifacts.model_names(),
            "Inference engine initialized"
        );
        debug!(features = ?encoder.feature_names(), "Feature column order");

        Self {
            artifacts,
            encoder,
            aggregator: ScoreAggregator::new(config.weights.clone()),
            strategy: config.strategy.clone(),
            primary_model: config.primary_model.clone(),
        }
    }

    /// Get the number of loaded models
    pub fn model_count(&self) -> usize {
        self.artifacts.models.len()
    }

    /// Get loaded model names
    pub fn model_names(&self) -> Vec<String> {
        self.artifacts.model_names()
    }

    /// Reason predictions cannot be served, if any
    pub fn unavailable_reason(&self) -> Option<String> {
        if self.artifacts.scaler.is_none() {
            Some("scaler not loaded".to_string())
        } else if let Some(mismatch) = &self.artifacts.report.schema_mismatch {
            Some(format!("scaler does not match the record schema: {mismatch}"))
        } else if self.artifacts.models.is_empty() {
            Some("no classifier loaded".to_string())
        } else {
            None
        }
    }

    /// Full pipeline: encode, scale, classify
    pub fn predict_record(&self, record: &RawRecord) -> Result<PredictionResult, PredictError> {
        if let Some(reason) = self.unavailable_reason() {
            return Err(PredictError::Unavailable(reason));
        }
        let scaler = self
            .artifacts
            .scaler
            .as_ref()
            .ok_or_else(|| PredictError::Unavailable("scaler not loaded".to_string()))?;

        let vector = self
            .encoder
            .encode(record, &self.artifacts.encoders, scaler)?;

        self.predict(&vector)
    }

    /// Run inference on a feature vector using the configured strategy
    pub fn predict(&self, vector: &FeatureVector) -> Result<PredictionResult, PredictError> {
        if self.artifacts.models.is_empty() {
            return Err(PredictError::Unavailable("no classifier loaded".to_string()));
        }

        match self.strategy {
            InferenceStrategy::Primary => self.predict_primary(vector),
            InferenceStrategy::Ensemble => self.predict_ensemble(vector),
        }
    }

    /// Run inference using only the primary model
    fn predict_primary(&self, vector: &FeatureVector) -> Result<PredictionResult, PredictError> {
        let Some(model) = self.artifacts.model(&self.primary_model) else {
            warn!(
                primary_model = %self.primary_model,
                "Primary model not loaded, falling back to ensemble"
            );
            return self.predict_ensemble(vector);
        };

        let prediction = model.predict(vector).inspect_err(|e| {
            error!(model = %model.name, error = %e, "Primary model inference failed");
        })?;

        let mut model_probabilities = HashMap::new();
        model_probabilities.insert(model.name.clone(), prediction.churn_probability);

        let verdict = Verdict::from_label(prediction.label);

        debug!(
            strategy = "primary",
            model = %model.name,
            churn_probability = prediction.churn_probability,
            verdict = %verdict,
            "Primary model inference complete"
        );

        Ok(PredictionResult {
            verdict,
            churn_probability: prediction.churn_probability,
            model: model.name.clone(),
            model_probabilities,
        })
    }

    /// Run inference using all models
    fn predict_ensemble(&self, vector: &FeatureVector) -> Result<PredictionResult, PredictError> {
        let mut model_probabilities = HashMap::new();

        for model in &self.artifacts.models {
            let prediction = Self::run_model(model, vector)?;
            model_probabilities.insert(model.name.clone(), prediction);
        }

        let churn_probability = self.aggregator.aggregate(&model_probabilities);
        let verdict = if churn_probability > 0.5 {
            Verdict::Churn
        } else {
            Verdict::NoChurn
        };

        debug!(
            strategy = "ensemble",
            churn_probability = churn_probability,
            model_probabilities = ?model_probabilities,
            agreement = ScoreAggregator::agreement(&model_probabilities),
            "Ensemble inference complete"
        );

        Ok(PredictionResult {
            verdict,
            churn_probability,
            model: "ensemble".to_string(),
            model_probabilities,
        })
    }

    fn run_model(model: &LoadedModel, vector: &FeatureVector) -> Result<f64, PredictError> {
        model
            .predict(vector)
            .map(|prediction| prediction.churn_probability)
            .map_err(|e| {
                error!(model = %model.name, error = %e, "Model inference failed");
                e.into()
            })
    }
}
