//! Latest-state store: the most recent qualifying webhook payload and submitter email.
//!
//! Held in memory for the life of the process. Each field is replaced independently;
//! concurrent writers race and the last write wins.

use serde_json::Value;
use tokio::sync::RwLock;

/// Point-in-time copy of both fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatestSnapshot {
    pub payload: Option<Value>,
    pub email: Option<String>,
}

/// In-memory store shared (behind `Arc`) by the ingest pipeline and the read endpoints.
pub struct LatestState {
    payload: RwLock<Option<Value>>,
    email: RwLock<Option<String>>,
}

impl Default for LatestState {
    fn default() -> Self {
        Self::new()
    }
}

impl LatestState {
    pub fn new() -> Self {
        Self {
            payload: RwLock::new(None),
            email: RwLock::new(None),
        }
    }

    pub async fn set_payload(&self, payload: Value) {
        *self.payload.write().await = Some(payload);
    }

    pub async fn set_email(&self, email: impl Into<String>) {
        *self.email.write().await = Some(email.into());
    }

    pub async fn payload(&self) -> Option<Value> {
        self.payload.read().await.clone()
    }

    pub async fn email(&self) -> Option<String> {
        self.email.read().await.clone()
    }

    /// Both fields. Not a transaction: a concurrent event may land between the two reads.
    pub async fn snapshot(&self) -> LatestSnapshot {
        LatestSnapshot {
            payload: self.payload().await,
            email: self.email().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn starts_empty() {
        let state = LatestState::new();
        assert_eq!(state.snapshot().await, LatestSnapshot::default());
    }

    #[tokio::test]
    async fn setters_overwrite_independently() {
        let state = LatestState::new();
        state.set_email("a@example.com").await;
        state.set_payload(json!({"n": 1})).await;
        state.set_payload(json!({"n": 2})).await;
        let snap = state.snapshot().await;
        assert_eq!(snap.payload, Some(json!({"n": 2})));
        assert_eq!(snap.email.as_deref(), Some("a@example.com"));
    }

    #[tokio::test]
    async fn concurrent_writers_leave_one_whole_value() {
        let state = Arc::new(LatestState::new());
        let emails: Vec<String> = (0..16).map(|i| format!("user{}@example.com", i)).collect();
        let mut handles = Vec::new();
        for e in emails.clone() {
            let s = state.clone();
            handles.push(tokio::spawn(async move { s.set_email(e).await }));
        }
        for h in handles {
            h.await.unwrap();
        }
        let last = state.email().await.unwrap();
        assert!(emails.contains(&last));
    }
}
