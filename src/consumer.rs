//! NATS subscriptions for incoming requests

use anyhow::{Context, Result};
use async_nats::{Client, Message, Subscriber};
use futures::stream::{self, Stream};
use futures::StreamExt;
use tracing::info;

/// Which handler an inbound message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Predict,
    Contact,
}

/// Subscribes to the predict and contact subjects
pub struct RequestConsumer {
    client: Client,
    predict_subject: String,
    contact_subject: String,
}

impl RequestConsumer {
    pub fn new(client: Client, predict_subject: &str, contact_subject: &str) -> Self {
        Self {
            client,
            predict_subject: predict_subject.to_string(),
            contact_subject: contact_subject.to_string(),
        }
    }

    async fn subscribe_to(&self, subject: &str) -> Result<Subscriber> {
        let subscriber = self
            .client
            .subscribe(subject.to_string())
            .await
            .with_context(|| format!("Failed to subscribe to {subject}"))?;
        info!(subject = %subject, "Subscribed");
        Ok(subscriber)
    }

    /// Single stream of both subjects, each message tagged with its kind
    pub async fn subscribe(&self) -> Result<impl Stream<Item = (RequestKind, Message)> + Unpin> {
        let predict = self.subscribe_to(&self.predict_subject).await?;
        let contact = self.subscribe_to(&self.contact_subject).await?;

        Ok(stream::select(
            predict.map(|m| (RequestKind::Predict, m)),
            contact.map(|m| (RequestKind::Contact, m)),
        ))
    }

    pub fn predict_subject(&self) -> &str {
        &self.predict_subject
    }

    pub fn contact_subject(&self) -> &str {
        &self.contact_subject
    }
}

