//! Artifact loader: classifiers, scaler and categorical encoders

use crate::config::ArtifactsConfig;
use crate::error::{EncodingError, InferenceError, LoadCause, LoadFailure};
use crate::feature_encoder::{FeatureEncoder, FeatureVector};
use crate::models::classifier::{ClassPrediction, Classifier};
use crate::models::encoder::{EncoderTable, LabelEncoder};
use crate::models::forest::RandomForest;
use crate::models::logistic::LogisticRegression;
use crate::models::scaler::StandardScaler;
use crate::types::record::Field;
use crate::types::verdict::Verdict;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// A serialized learned object that can be checked after deserialization
pub trait Artifact: DeserializeOwned {
    /// Kind name used in logs
    const KIND: &'static str;

    /// Structural checks serde cannot express
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Load and validate a single JSON artifact
pub fn load_artifact<T: Artifact>(path: impl AsRef<Path>) -> Result<T, LoadFailure> {
    let path = path.as_ref();

    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => LoadFailure::new(path, LoadCause::NotFound),
        _ => LoadFailure::new(path, e),
    })?;

    let artifact: T = serde_json::from_slice(&bytes).map_err(|e| LoadFailure::new(path, e))?;
    artifact
        .validate()
        .map_err(|reason| LoadFailure::new(path, LoadCause::Invalid(reason)))?;

    debug!(kind = T::KIND, path = %path.display(), "Artifact loaded");
    Ok(artifact)
}

/// Outcome of scanning an encoder directory
#[derive(Debug, Default)]
pub struct EncoderSetLoad {
    /// Encoders keyed by file stem
    pub encoders: BTreeMap<String, LabelEncoder>,
    /// Files that failed to load
    pub failures: Vec<LoadFailure>,
    /// The directory itself does not exist
    pub directory_missing: bool,
}

/// Load every `*.json` encoder in `dir`, keyed by file stem.
///
/// A missing directory yields an empty set with `directory_missing` raised;
/// individual file failures are collected and do not stop the scan.
pub fn load_encoder_set(dir: impl AsRef<Path>) -> EncoderSetLoad {
    let dir = dir.as_ref();
    let mut result = EncoderSetLoad::default();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            result.directory_missing = true;
            return result;
        }
        Err(e) => {
            result.failures.push(LoadFailure::new(dir, e));
            return result;
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    for path in paths {
        let Some(key) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };
        match load_artifact::<LabelEncoder>(&path) {
            Ok(encoder) => {
                result.encoders.insert(key, encoder);
            }
            Err(failure) => result.failures.push(failure),
        }
    }

    result
}

/// Classifier formats that can be read from JSON
#[derive(Debug)]
enum ClassifierArtifact {
    Forest(RandomForest),
    Logistic(LogisticRegression),
}

impl<'de> Deserialize<'de> for ClassifierArtifact {
    /// Pick the format by its marker key so the format's own error is kept
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let parsed = if value.get("trees").is_some() {
            RandomForest::deserialize(value).map(ClassifierArtifact::Forest)
        } else if value.get("coefficients").is_some() {
            LogisticRegression::deserialize(value).map(ClassifierArtifact::Logistic)
        } else {
            return Err(D::Error::custom(
                "unknown classifier: expected \"trees\" (random forest) or \"coefficients\" (logistic regression)",
            ));
        };
        parsed.map_err(D::Error::custom)
    }
}

impl Artifact for ClassifierArtifact {
    const KIND: &'static str = "classifier";

    fn validate(&self) -> Result<(), String> {
        match self {
            ClassifierArtifact::Forest(forest) => forest.validate(),
            ClassifierArtifact::Logistic(model) => model.validate(),
        }
    }
}

impl ClassifierArtifact {
    fn into_classifier(self) -> Box<dyn Classifier> {
        match self {
            ClassifierArtifact::Forest(forest) => Box::new(forest),
            ClassifierArtifact::Logistic(model) => Box::new(model),
        }
    }
}

/// Loaded classifier with its configured name
pub struct LoadedModel {
    pub name: String,
    pub classifier: Box<dyn Classifier>,
}

impl LoadedModel {
    pub fn new(name: impl Into<String>, classifier: Box<dyn Classifier>) -> Self {
        Self {
            name: name.into(),
            classifier,
        }
    }

    /// Run the classifier after checking the vector width
    pub fn predict(&self, vector: &FeatureVector) -> Result<ClassPrediction, InferenceError> {
        let expected = self.classifier.n_features();
        if vector.len() != expected {
            return Err(InferenceError::ShapeMismatch {
                model: self.name.clone(),
                expected,
                actual: vector.len(),
            });
        }
        self.classifier.predict(vector.as_slice())
    }
}

/// Run one classifier on one vector and interpret its label
pub fn predict(vector: &FeatureVector, model: &LoadedModel) -> Result<Verdict, InferenceError> {
    model
        .predict(vector)
        .map(|prediction| Verdict::from_label(prediction.label))
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("name", &self.name)
            .field("n_features", &self.classifier.n_features())
            .finish()
    }
}

/// Everything that went wrong while loading, kept for the process lifetime
#[derive(Debug, Default)]
pub struct LoadReport {
    pub failures: Vec<LoadFailure>,
    pub encoder_dir_missing: bool,
    /// Categorical fields with no encoder
    pub missing_encoders: Vec<Field>,
    /// Encoder files that name no schema field
    pub ignored_encoders: Vec<String>,
    /// The scaler loaded but was fitted on other columns
    pub schema_mismatch: Option<EncodingError>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
            && !self.encoder_dir_missing
            && self.missing_encoders.is_empty()
            && self.schema_mismatch.is_none()
    }

    /// Surface every startup problem once
    pub fn log(&self) {
        for failure in &self.failures {
            warn!(
                path = %failure.path.display(),
                cause = %failure.cause,
                "Artifact failed to load, continuing without it"
            );
        }
        if let Some(mismatch) = &self.schema_mismatch {
            error!(error = %mismatch, "Scaler does not match the record schema, predictions disabled");
        }
        if self.encoder_dir_missing {
            error!("Encoder directory missing, categorical fields cannot be encoded");
        }
        if !self.missing_encoders.is_empty() {
            warn!(fields = ?self.missing_encoders, "No encoder loaded for categorical fields");
        }
        if !self.ignored_encoders.is_empty() {
            debug!(files = ?self.ignored_encoders, "Ignoring encoders outside the record schema");
        }
    }
}

/// Read-only artifacts shared by every request
#[derive(Debug, Default)]
pub struct Artifacts {
    pub models: Vec<LoadedModel>,
    pub scaler: Option<StandardScaler>,
    pub encoders: EncoderTable,
    pub report: LoadReport,
}

impl Artifacts {
    pub fn model(&self, name: &str) -> Option<&LoadedModel> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn model_names(&self) -> Vec<String> {
        self.models.iter().map(|m| m.name.clone()).collect()
    }
}

/// Loads artifacts from the configured directories
pub struct ArtifactStore {
    config: ArtifactsConfig,
}

impl ArtifactStore {
    pub fn new(config: ArtifactsConfig) -> Self {
        Self { config }
    }

    /// Load a single classifier; the file extension selects the format
    pub fn load_classifier(&self, path: &Path, name: &str) -> Result<LoadedModel, LoadFailure> {
        info!(model = %name, path = %path.display(), "Loading classifier");

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => {
                let artifact = load_artifact::<ClassifierArtifact>(path)?;
                Ok(LoadedModel::new(name, artifact.into_classifier()))
            }
            Some("onnx") => self.load_onnx(path, name),
            other => Err(LoadFailure::new(
                path,
                LoadCause::Unsupported(other.unwrap_or("no extension").to_string()),
            )),
        }
    }

    #[cfg(feature = "onnx")]
    fn load_onnx(&self, path: &Path, name: &str) -> Result<LoadedModel, LoadFailure> {
        if !path.exists() {
            return Err(LoadFailure::new(path, LoadCause::NotFound));
        }
        let model = crate::models::onnx::OnnxClassifier::load(
            path,
            name,
            Field::ALL.len(),
            self.config.onnx_threads,
        )?;
        Ok(LoadedModel::new(name, Box::new(model)))
    }

    #[cfg(not(feature = "onnx"))]
    fn load_onnx(&self, path: &Path, _name: &str) -> Result<LoadedModel, LoadFailure> {
        Err(LoadFailure::new(
            path,
            LoadCause::Unsupported("built without the onnx feature".to_string()),
        ))
    }

    /// Load everything. Never fails: problems are recorded in the report.
    pub fn load_all(&self) -> Artifacts {
        let models_dir = Path::new(&self.config.models_dir);
        let mut artifacts = Artifacts::default();

        for (name, file) in &self.config.classifiers {
            match self.load_classifier(&models_dir.join(file), name) {
                Ok(model) => artifacts.models.push(model),
                Err(failure) => artifacts.report.failures.push(failure),
            }
        }

        match load_artifact::<StandardScaler>(models_dir.join(&self.config.scaler_file)) {
            Ok(scaler) => {
                artifacts.report.schema_mismatch = FeatureEncoder::new().check_schema(&scaler).err();
                artifacts.scaler = Some(scaler);
            }
            Err(failure) => artifacts.report.failures.push(failure),
        }

        let loaded = load_encoder_set(&self.config.encoders_dir);
        let (encoders, ignored) = EncoderTable::from_named(loaded.encoders);
        artifacts.report.failures.extend(loaded.failures);
        artifacts.report.encoder_dir_missing = loaded.directory_missing;
        artifacts.report.missing_encoders = encoders.missing();
        artifacts.report.ignored_encoders = ignored;
        artifacts.encoders = encoders;

        info!(
            models = ?artifacts.model_names(),
            scaler = artifacts.scaler.is_some(),
            encoders = artifacts.encoders.len(),
            failures = artifacts.report.failures.len(),
            "Artifacts loaded from {}",
            models_dir.display()
        );

        artifacts
    }
}
