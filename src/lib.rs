//! Churn Guard Library
//!
//! Encodes telecom customer records with pre-fitted label encoders and a
//! standard scaler, then scores them with pre-trained classifiers to
//! predict whether the customer will churn.

pub mod config;
pub mod consumer;
pub mod contact;
pub mod error;
pub mod feature_encoder;
pub mod handler;
pub mod metrics;
pub mod models;
pub mod producer;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::AppConfig;
pub use consumer::{RequestConsumer, RequestKind};
pub use contact::{ContactMessage, ContactStore, SqliteContactStore};
pub use error::{EncodingError, InferenceError, LoadFailure, PredictError};
pub use feature_encoder::{FeatureEncoder, FeatureVector};
pub use handler::RequestHandler;
pub use models::inference::InferenceEngine;
pub use producer::ReplyProducer;
pub use types::{Field, FieldValue, PredictionReply, RawRecord, Verdict};
