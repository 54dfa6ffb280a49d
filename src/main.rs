//! Churn Guard - Main Entry Point
//!
//! Loads the trained artifacts, consumes prediction and contact requests from
//! NATS and replies with churn verdicts. Requests are handled one at a time.

use anyhow::{Context, Result};
use churn_guard::{
    config::{AppConfig, LoggingConfig},
    consumer::{RequestConsumer, RequestKind},
    contact::{ContactStore, SqliteContactStore, UnavailableContactStore},
    handler::RequestHandler,
    metrics::ServiceMetrics,
    models::inference::InferenceEngine,
    producer::ReplyProducer,
};
use futures::StreamExt;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Log a metrics summary after this many predictions
const SUMMARY_EVERY: u64 = 100;

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    // RUST_LOG wins over the configured level
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("warn").add_directive(
            format!("churn_guard={}", logging.level)
                .parse()
                .context("Invalid logging.level")?,
        ),
    };

    if logging.format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

fn open_contact_store(path: &str) -> Arc<dyn ContactStore> {
    match SqliteContactStore::open(path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open contact store; contact messages will be refused");
            Arc::new(UnavailableContactStore)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting Churn Guard");
    info!(
        strategy = ?config.inference.strategy,
        primary_model = %config.inference.primary_model,
        models_dir = %config.artifacts.models_dir,
        encoders_dir = %config.artifacts.encoders_dir,
        "Configuration loaded"
    );

    let metrics = Arc::new(ServiceMetrics::new());

    let engine = Arc::new(InferenceEngine::new(&config));
    info!(
        "Inference engine initialized with {} models: {:?}",
        engine.model_count(),
        engine.model_names()
    );
    if let Some(reason) = engine.unavailable_reason() {
        warn!(reason = %reason, "Predictions unavailable; every request will be rejected until restart");
    }

    let contacts = open_contact_store(&config.contact.database_path);
    let handler = RequestHandler::new(engine, contacts, metrics.clone());

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url)
        .await
        .with_context(|| format!("Failed to connect to NATS at {}", config.nats.url))?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = RequestConsumer::new(
        client.clone(),
        &config.nats.predict_subject,
        &config.nats.contact_subject,
    );
    let producer = ReplyProducer::new(client.clone(), &config.nats.verdict_subject);

    let mut requests = consumer.subscribe().await?;
    info!(
        predict = %consumer.predict_subject(),
        contact = %consumer.contact_subject(),
        verdicts = %producer.fallback_subject(),
        "Listening for requests"
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
            next = requests.next() => {
                let Some((kind, message)) = next else {
                    warn!("Subscriptions closed");
                    break;
                };

                match kind {
                    RequestKind::Predict => {
                        let reply = handler.handle_prediction(&message.payload);
                        if let Err(e) = producer.publish(message.reply, &reply).await {
                            error!(request_id = %reply.request_id, error = %e, "Failed to publish verdict");
                        }

                        let handled = metrics.predictions_served.load(Ordering::Relaxed)
                            + metrics.total_rejections();
                        if handled % SUMMARY_EVERY == 0 {
                            metrics.print_summary();
                        }
                    }
                    RequestKind::Contact => {
                        let reply = handler.handle_contact(&message.payload);
                        match message.reply {
                            Some(inbox) => {
                                if let Err(e) = producer.publish(Some(inbox), &reply).await {
                                    error!(error = %e, "Failed to publish contact reply");
                                }
                            }
                            None => info!(reply = ?reply, "Contact message handled without reply inbox"),
                        }
                    }
                }
            }
        }
    }

    info!("Churn Guard shutting down...");
    metrics.print_summary();

    Ok(())
}
