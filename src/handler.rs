//! Per-message request handling, independent of the transport

use crate::contact::{ContactError, ContactMessage, ContactReply, ContactStore};
use crate::error::{InferenceError, PredictError};
use crate::metrics::ServiceMetrics;
use crate::models::inference::InferenceEngine;
use crate::types::record::RawRecord;
use crate::types::verdict::PredictionReply;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Turns request payloads into replies
pub struct RequestHandler {
    engine: Arc<InferenceEngine>,
    contacts: Arc<dyn ContactStore>,
    metrics: Arc<ServiceMetrics>,
}

impl RequestHandler {
    pub fn new(
        engine: Arc<InferenceEngine>,
        contacts: Arc<dyn ContactStore>,
        metrics: Arc<ServiceMetrics>,
    ) -> Self {
        Self {
            engine,
            contacts,
            metrics,
        }
    }

    pub fn metrics(&self) -> &ServiceMetrics {
        &self.metrics
    }

    /// Predict churn for a RawRecord JSON payload
    pub fn handle_prediction(&self, payload: &[u8]) -> PredictionReply {
        let start_time = Instant::now();

        let record: RawRecord = match serde_json::from_slice(payload) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Failed to deserialize prediction request");
                self.metrics.record_rejection(start_time.elapsed(), "malformed");
                return PredictionReply::rejected(format!("malformed request: {e}"));
            }
        };

        match self.engine.predict_record(&record) {
            Ok(result) => {
                let processing_time = start_time.elapsed();
                self.metrics
                    .record_prediction(processing_time, result.verdict, result.churn_probability);

                info!(
                    verdict = %result.verdict,
                    churn_probability = result.churn_probability,
                    model = %result.model,
                    processing_time_us = processing_time.as_micros(),
                    "Prediction served"
                );

                result.to_reply()
            }
            Err(e) => {
                match &e {
                    PredictError::Encoding(encoding) if encoding.is_schema_defect() => {
                        error!(error = %e, "Scaler does not match the record schema")
                    }
                    PredictError::Encoding(_) => warn!(error = %e, "Record rejected"),
                    PredictError::Inference(InferenceError::ShapeMismatch { .. }) => {
                        error!(error = %e, "Model and encoder disagree on feature width")
                    }
                    _ => error!(error = %e, "Prediction failed"),
                }
                self.metrics.record_rejection(start_time.elapsed(), e.kind());
                PredictionReply::rejected(&e)
            }
        }
    }

    /// Store a contact message payload
    pub fn handle_contact(&self, payload: &[u8]) -> ContactReply {
        let result = match serde_json::from_slice::<ContactMessage>(payload) {
            Ok(message) => self.contacts.submit(&message),
            Err(e) => {
                warn!(error = %e, "Failed to deserialize contact message");
                Err(ContactError::SendFailed)
            }
        };

        self.metrics.record_contact(result.is_ok());
        ContactReply::from(result)
    }
}
