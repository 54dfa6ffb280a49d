//! Configuration management for the churn prediction service

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "CHURN_CONFIG";

/// Inference strategy for churn prediction
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InferenceStrategy {
    /// Use the primary model only (random forest by default)
    #[default]
    Primary,
    /// Weighted average of every loaded model
    Ensemble,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    pub contact: ContactConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming prediction requests
    pub predict_subject: String,
    /// Subject verdicts are published on when a request has no reply inbox
    pub verdict_subject: String,
    /// Subject for incoming contact messages
    pub contact_subject: String,
}

/// Artifact locations
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    /// Directory holding classifier and scaler files
    pub models_dir: String,
    /// Directory holding one encoder file per categorical field
    pub encoders_dir: String,
    /// Scaler file name inside `models_dir`
    #[serde(default = "default_scaler_file")]
    pub scaler_file: String,
    /// Classifier name -> file name inside `models_dir`
    #[serde(default = "default_classifiers")]
    pub classifiers: BTreeMap<String, String>,
    /// Intra-op threads for ONNX sessions
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_scaler_file() -> String {
    "scaler.json".to_string()
}

fn default_classifiers() -> BTreeMap<String, String> {
    let mut classifiers = BTreeMap::new();
    classifiers.insert("random_forest".to_string(), "randomforest.json".to_string());
    classifiers.insert("logistic".to_string(), "logistic.json".to_string());
    classifiers
}

fn default_onnx_threads() -> usize {
    1
}

/// Inference configuration
#[derive(Debug, Clone, Deserialize)]
pub struct InferenceConfig {
    /// "primary" (single model) or "ensemble" (all models)
    #[serde(default)]
    pub strategy: InferenceStrategy,
    /// Model used by the primary strategy
    #[serde(default = "default_primary_model")]
    pub primary_model: String,
    /// Model weights for ensemble scoring
    #[serde(default = "default_weights")]
    pub weights: HashMap<String, f64>,
}

fn default_primary_model() -> String {
    "random_forest".to_string()
}

fn default_weights() -> HashMap<String, f64> {
    let mut weights = HashMap::new();
    weights.insert("random_forest".to_string(), 0.7);
    weights.insert("logistic".to_string(), 0.3);
    weights
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            strategy: InferenceStrategy::Primary,
            primary_model: default_primary_model(),
            weights: default_weights(),
        }
    }
}

/// Contact message store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ContactConfig {
    /// SQLite database file
    pub database_path: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from `$CHURN_CONFIG`, falling back to `config/config.toml`
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config/config.toml".to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path, with `CHURN__SECTION__KEY` overrides
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("CHURN").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                predict_subject: "churn.predict".to_string(),
                verdict_subject: "churn.verdicts".to_string(),
                contact_subject: "churn.contact".to_string(),
            },
            artifacts: ArtifactsConfig {
                models_dir: "models".to_string(),
                encoders_dir: "encoders".to_string(),
                scaler_file: default_scaler_file(),
                classifiers: default_classifiers(),
                onnx_threads: default_onnx_threads(),
            },
            inference: InferenceConfig::default(),
            contact: ContactConfig {
                database_path: "contact.db".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}
