//! Automation webhook: receives `{email, transcript}` for each relayed submission.

use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("automation webhook request failed")]
    Request(#[from] reqwest::Error),
    #[error("automation webhook returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Destination for formatted transcripts.
#[async_trait]
pub trait TranscriptSink: Send + Sync {
    async fn forward(&self, email: &str, transcript: &str) -> Result<(), ForwardError>;
}

#[derive(Debug, Serialize)]
struct ForwardBody<'a> {
    email: &'a str,
    transcript: &'a str,
}

/// POSTs JSON to a fixed webhook URL.
#[derive(Clone)]
pub struct AutomationForwarder {
    webhook_url: String,
    client: reqwest::Client,
}

impl AutomationForwarder {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TranscriptSink for AutomationForwarder {
    async fn forward(&self, email: &str, transcript: &str) -> Result<(), ForwardError> {
        let res = self
            .client
            .post(&self.webhook_url)
            .json(&ForwardBody { email, transcript })
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ForwardError::Status { status, body });
        }
        Ok(())
    }
}
