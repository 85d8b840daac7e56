//! Webhook ingest pipeline: validate → extract → store → fetch → format → forward.
//!
//! Every stage failure is caught here and logged; callers only see an
//! [`IngestOutcome`] and always answer the webhook source with success.

use crate::automation::TranscriptSink;
use crate::chat::MessageSource;
use crate::error::RelayError;
use crate::state::LatestState;
use crate::transcript;
use serde_json::Value;
use std::sync::Arc;

/// Event categories the relay acts on. Everything else is a no-op.
pub const ACCEPTED_CATEGORIES: &[&str] = &["form:submit"];

/// Form field name carrying the submitter email.
pub const EMAIL_FIELD: &str = "Email";

/// Fields pulled out of one inbound event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedSubmission {
    pub email: Option<String>,
    pub channel_url: Option<String>,
    pub app_id: Option<String>,
    pub message_id: Option<i64>,
}

impl ExtractedSubmission {
    /// Extract from an untrusted event. Missing or mistyped fields become `None`;
    /// when several `Email` entries exist the last one in array order wins.
    pub fn from_event(event: &Value) -> Self {
        let mut email = None;
        let forms = event.get("forms").and_then(Value::as_array);
        for form in forms.into_iter().flatten() {
            let data = form.get("data").and_then(Value::as_array);
            for entry in data.into_iter().flatten() {
                if entry.get("name").and_then(Value::as_str) != Some(EMAIL_FIELD) {
                    continue;
                }
                if let Some(value) = entry.get("value").and_then(Value::as_str) {
                    email = Some(value.to_string());
                }
            }
        }
        let form_message = event.get("form_message");
        Self {
            email,
            channel_url: form_message
                .and_then(|m| m.get("channel_url"))
                .and_then(Value::as_str)
                .map(str::to_string),
            app_id: event
                .get("app_id")
                .and_then(Value::as_str)
                .map(str::to_string),
            message_id: form_message
                .and_then(|m| m.get("message_id"))
                .and_then(message_id_value),
        }
    }

    /// `(app_id, channel_url, email)` when all three are present and non-empty.
    pub fn relay_target(&self) -> Option<(&str, &str, &str)> {
        Some((
            non_blank(&self.app_id)?,
            non_blank(&self.channel_url)?,
            non_blank(&self.email)?,
        ))
    }

    /// Names of the relay fields that are missing, for the skip log line.
    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if non_blank(&self.channel_url).is_none() {
            missing.push("channel_url");
        }
        if non_blank(&self.app_id).is_none() {
            missing.push("app_id");
        }
        if non_blank(&self.email).is_none() {
            missing.push("email");
        }
        missing
    }

    /// Anchor for the message window. `message_id` is used as milliseconds as-is;
    /// without it the current wall-clock time is used.
    pub fn anchor_ms(&self) -> i64 {
        self.message_id
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis())
    }
}

fn non_blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.trim().is_empty())
}

/// Accept integer ids, and numeric strings from senders that quote them.
fn message_id_value(v: &Value) -> Option<i64> {
    v.as_i64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

/// True if the event's `category` is one the relay acts on.
pub fn is_accepted(event: &Value) -> bool {
    event
        .get("category")
        .and_then(Value::as_str)
        .map_or(false, |c| ACCEPTED_CATEGORIES.contains(&c))
}

/// What happened to one inbound delivery.
#[derive(Debug)]
pub enum IngestOutcome {
    /// Category not accepted; nothing stored, nothing called.
    Ignored,
    /// State updated; channel, app or email missing so nothing was forwarded.
    Stored,
    /// Transcript of `messages` lines delivered to the automation webhook.
    Forwarded { messages: usize },
    /// A stage failed after any state updates were committed.
    Failed {
        stage: &'static str,
        error: anyhow::Error,
    },
}

/// Runs the relay for each inbound delivery. Cheap to share behind `Arc`.
pub struct IngestPipeline {
    state: Arc<LatestState>,
    source: Arc<dyn MessageSource>,
    sink: Arc<dyn TranscriptSink>,
}

impl IngestPipeline {
    pub fn new(
        state: Arc<LatestState>,
        source: Arc<dyn MessageSource>,
        sink: Arc<dyn TranscriptSink>,
    ) -> Self {
        Self {
            state,
            source,
            sink,
        }
    }

    /// Parse a raw body and process it. A malformed body is logged and reported as `Failed`.
    pub async fn handle_body(&self, body: &[u8]) -> IngestOutcome {
        match serde_json::from_slice::<Value>(body) {
            Ok(event) => self.handle_event(event).await,
            Err(e) => {
                let e = RelayError::from(e);
                let stage = e.stage();
                let error = anyhow::Error::new(e);
                log::warn!(
                    "webhook: stage={} failed ({} bytes): {:#}",
                    stage,
                    body.len(),
                    error
                );
                IngestOutcome::Failed { stage, error }
            }
        }
    }

    pub async fn handle_event(&self, event: Value) -> IngestOutcome {
        if !is_accepted(&event) {
            log::debug!(
                "webhook: ignoring category {:?}",
                event.get("category").and_then(Value::as_str)
            );
            return IngestOutcome::Ignored;
        }
        log::info!("webhook: received form:submit");
        if log::log_enabled!(log::Level::Debug) {
            if let Ok(pretty) = serde_json::to_string_pretty(&event) {
                log::debug!("webhook payload:\n{}", pretty);
            }
        }

        let submission = ExtractedSubmission::from_event(&event);
        self.state.set_payload(event).await;
        if let Some(ref email) = submission.email {
            self.state.set_email(email.clone()).await;
        }

        let Some((app_id, channel_url, email)) = submission.relay_target() else {
            log::info!(
                "webhook: forward skipped, missing {}",
                submission.missing_fields().join(", ")
            );
            return IngestOutcome::Stored;
        };
        let anchor_ms = submission.anchor_ms();
        match self.relay(app_id, channel_url, email, anchor_ms).await {
            Ok(messages) => {
                log::info!(
                    "webhook: forwarded transcript ({} messages) for app {} channel {}",
                    messages,
                    app_id,
                    channel_url
                );
                IngestOutcome::Forwarded { messages }
            }
            Err(e) => {
                let stage = e.stage();
                let error = anyhow::Error::new(e);
                log::warn!(
                    "webhook: stage={} failed for app {} channel {} anchor {}: {:#}",
                    stage,
                    app_id,
                    channel_url,
                    anchor_ms,
                    error
                );
                IngestOutcome::Failed { stage, error }
            }
        }
    }

    async fn relay(
        &self,
        app_id: &str,
        channel_url: &str,
        email: &str,
        anchor_ms: i64,
    ) -> Result<usize, RelayError> {
        let messages = self
            .source
            .fetch_messages(app_id, channel_url, anchor_ms)
            .await?;
        let transcript = transcript::format(&messages)?;
        self.sink.forward(email, &transcript).await?;
        Ok(messages.len())
    }
}
