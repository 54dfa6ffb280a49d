//! NATS publisher for replies

use anyhow::Result;
use async_nats::{Client, Subject};
use serde::Serialize;
use tracing::debug;

/// Publishes JSON replies to the requester's inbox or a fallback subject
#[derive(Clone)]
pub struct ReplyProducer {
    client: Client,
    fallback_subject: String,
}

impl ReplyProducer {
    /// Replies without an inbox go to `fallback_subject`
    pub fn new(client: Client, fallback_subject: &str) -> Self {
        Self {
            client,
            fallback_subject: fallback_subject.to_string(),
        }
    }

    /// Publish a reply
    pub async fn publish<T: Serialize>(&self, reply_to: Option<Subject>, reply: &T) -> Result<()> {
        let payload = serde_json::to_vec(reply)?;
        let subject = reply_to.unwrap_or_else(|| Subject::from(self.fallback_subject.as_str()));

        debug!(subject = %subject, bytes = payload.len(), "Publishing reply");
        self.client.publish(subject, payload.into()).await?;

        Ok(())
    }

    /// Get the fallback subject name
    pub fn fallback_subject(&self) -> &str {
        &self.fallback_subject
    }
}

#[cfg(test)]
mod tests {
    // Integration tests would require a running NATS server
}
