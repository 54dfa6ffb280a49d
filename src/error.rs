//! Error taxonomy for artifact loading, encoding and inference

use crate::types::record::Field;
use std::path::PathBuf;
use thiserror::Error;

/// Why a single artifact could not be loaded
#[derive(Debug, Error)]
pub enum LoadCause {
    #[error("file not found")]
    NotFound,
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt artifact: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("invalid artifact: {0}")]
    Invalid(String),
    #[error("unsupported artifact format: {0}")]
    Unsupported(String),
    #[error("onnx runtime error: {0}")]
    Runtime(String),
}

/// A failed artifact load, carrying the path and the underlying cause
#[derive(Debug, Error)]
#[error("failed to load {}: {cause}", .path.display())]
pub struct LoadFailure {
    pub path: PathBuf,
    pub cause: LoadCause,
}

impl LoadFailure {
    pub fn new(path: impl Into<PathBuf>, cause: impl Into<LoadCause>) -> Self {
        Self {
            path: path.into(),
            cause: cause.into(),
        }
    }
}

/// A record that cannot be turned into a feature vector
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodingError {
    #[error("unseen category {value:?} for field {field}")]
    UnseenCategory { field: Field, value: String },
    #[error("missing field {0}")]
    MissingField(Field),
    #[error("unknown field {0:?}")]
    UnknownField(String),
    #[error("field {field} expects a number, got {value:?}")]
    NotNumeric { field: Field, value: String },
    #[error("field {field} value {value} is outside its accepted range")]
    OutOfRange { field: Field, value: f64 },
    #[error("no encoder loaded for categorical field {0}")]
    MissingEncoder(Field),
    #[error("scaler was fitted on {expected} features, record has {actual}")]
    ScalerShape { expected: usize, actual: usize },
    #[error("scaler column {position} is {found:?}, record schema expects {expected}")]
    SchemaMismatch {
        position: usize,
        expected: Field,
        found: String,
    },
}

impl EncodingError {
    /// Artifacts disagree with the record schema; no record can pass
    pub fn is_schema_defect(&self) -> bool {
        matches!(self, Self::ScalerShape { .. } | Self::SchemaMismatch { .. })
    }

    /// The field the error refers to, when there is one
    pub fn field(&self) -> Option<Field> {
        match self {
            Self::UnseenCategory { field, .. }
            | Self::NotNumeric { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::SchemaMismatch {
                expected: field, ..
            } => Some(*field),
            Self::MissingField(field) | Self::MissingEncoder(field) => Some(*field),
            Self::UnknownField(_) | Self::ScalerShape { .. } => None,
        }
    }
}

/// Classifier invocation failures
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("model {model} expects {expected} features, got {actual}")]
    ShapeMismatch {
        model: String,
        expected: usize,
        actual: usize,
    },
    #[error("model {model} failed: {reason}")]
    Backend { model: String, reason: String },
}

/// Any reason a prediction request is rejected
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("prediction unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl PredictError {
    /// Short label used for metrics and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "unavailable",
            Self::Encoding(e) if e.is_schema_defect() => "schema",
            Self::Encoding(_) => "encoding",
            Self::Inference(InferenceError::ShapeMismatch { .. }) => "shape",
            Self::Inference(InferenceError::Backend { .. }) => "backend",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_failure_display() {
        let failure = LoadFailure::new("models/scaler.json", LoadCause::NotFound);
        assert_eq!(
            failure.to_string(),
            "failed to load models/scaler.json: file not found"
        );
    }

    #[test]
    fn test_encoding_error_names_field() {
        let err = EncodingError::UnseenCategory {
            field: Field::InternetService,
            value: "No value".to_string(),
        };
        assert_eq!(err.field(), Some(Field::InternetService));
        assert!(err.to_string().contains("InternetService"));
        assert!(err.to_string().contains("No value"));
    }

    #[test]
    fn test_predict_error_kind() {
        let err = PredictError::from(InferenceError::ShapeMismatch {
            model: "random_forest".to_string(),
            expected: 19,
            actual: 18,
        });
        assert_eq!(err.kind(), "shape");
        assert_eq!(PredictError::Unavailable("scaler".into()).kind(), "unavailable");

        let schema = PredictError::from(EncodingError::ScalerShape {
            expected: 18,
            actual: 19,
        });
        assert_eq!(schema.kind(), "schema");
        assert_eq!(PredictError::from(EncodingError::MissingField(Field::Tenure)).kind(), "encoding");
    }
}
