//! Sendbird Platform API client: list messages around a timestamp in a group channel.

use crate::chat::{Message, MessageSource};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

/// Messages requested before the anchor.
pub const PREV_LIMIT: u32 = 30;
/// Messages requested after the anchor.
pub const NEXT_LIMIT: u32 = 30;

/// Stand-in used to learn which host the base template yields for a given app id.
const APP_ID_PLACEHOLDER: &str = "appidplaceholder";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid chat API url {url}: {reason}")]
    Url { url: String, reason: String },
    #[error("chat API request failed")]
    Request(#[from] reqwest::Error),
    #[error("chat API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("chat API response did not match schema: {0}")]
    Schema(String),
}

#[derive(Debug, Deserialize)]
struct ListMessagesResponse {
    messages: Vec<WireMessage>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    user: Option<WireUser>,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    #[serde(default)]
    nickname: Option<String>,
}

impl From<WireMessage> for Message {
    fn from(m: WireMessage) -> Self {
        Message {
            nickname: m.user.and_then(|u| u.nickname),
            body: m.message,
        }
    }
}

/// Client for the Sendbird Platform API, authenticated with a static `Api-Token`.
#[derive(Clone)]
pub struct SendbirdClient {
    /// Base URL template; `{app_id}` is replaced per call.
    api_base: String,
    api_token: String,
    client: reqwest::Client,
}

impl SendbirdClient {
    pub fn new(api_base: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            api_token: api_token.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Build `{base}/v3/group_channels/{channel_url}/messages` with the fixed window query.
    /// `app_id` comes from the inbound webhook: only ASCII letters, digits and `-` are
    /// accepted, and the resulting host must be the one the template produces.
    pub fn messages_url(
        &self,
        app_id: &str,
        channel_url: &str,
        anchor_ms: i64,
    ) -> Result<Url, FetchError> {
        if app_id.is_empty() || !app_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(FetchError::Url {
                url: self.api_base.clone(),
                reason: format!("app_id {:?} has characters outside [A-Za-z0-9-]", app_id),
            });
        }
        let base = self.api_base.replace("{app_id}", app_id);
        let mut url = Url::parse(&base).map_err(|e| FetchError::Url {
            url: base.clone(),
            reason: e.to_string(),
        })?;
        let expected_host = Url::parse(&self.api_base.replace("{app_id}", APP_ID_PLACEHOLDER))
            .ok()
            .and_then(|u| u.host_str().map(|h| h.replace(APP_ID_PLACEHOLDER, &app_id.to_ascii_lowercase())));
        if expected_host.is_none() || url.host_str() != expected_host.as_deref() {
            return Err(FetchError::Url {
                url: base,
                reason: format!("host does not match template for app_id {:?}", app_id),
            });
        }
        {
            let mut segments = url.path_segments_mut().map_err(|_| FetchError::Url {
                url: base.clone(),
                reason: "cannot be a base".to_string(),
            })?;
            segments
                .pop_if_empty()
                .extend(["v3", "group_channels", channel_url, "messages"]);
        }
        url.query_pairs_mut()
            .append_pair("prev_limit", &PREV_LIMIT.to_string())
            .append_pair("next_limit", &NEXT_LIMIT.to_string())
            .append_pair("include", "true")
            .append_pair("message_ts", &anchor_ms.to_string());
        Ok(url)
    }
}

#[async_trait]
impl MessageSource for SendbirdClient {
    /// GET list messages. Non-2xx and unexpected bodies are errors; order is kept as returned.
    async fn fetch_messages(
        &self,
        app_id: &str,
        channel_url: &str,
        anchor_ms: i64,
    ) -> Result<Vec<Message>, FetchError> {
        let url = self.messages_url(app_id, channel_url, anchor_ms)?;
        log::debug!("sendbird: GET {}", url);
        let res = self
            .client
            .get(url)
            .header("Api-Token", &self.api_token)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }
        let text = res.text().await?;
        let data: ListMessagesResponse =
            serde_json::from_str(&text).map_err(|e| FetchError::Schema(e.to_string()))?;
        Ok(data.messages.into_iter().map(Message::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_url_substitutes_app_id_and_window() {
        let client = SendbirdClient::new(crate::config::DEFAULT_CHAT_API_BASE, "tok");
        let url = client
            .messages_url("ABC-123", "sendbird_group_channel_1", 1_700_000_000_000)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api-abc-123.sendbird.com/v3/group_channels/sendbird_group_channel_1/messages\
             ?prev_limit=30&next_limit=30&include=true&message_ts=1700000000000"
        );
    }

    #[test]
    fn messages_url_keeps_base_path_and_escapes_channel() {
        let client = SendbirdClient::new("http://127.0.0.1:9000/proxy/", "tok");
        let url = client.messages_url("app", "chan/with space", 5).unwrap();
        assert_eq!(url.path(), "/proxy/v3/group_channels/chan%2Fwith%20space/messages");
    }

    #[test]
    fn messages_url_rejects_app_id_that_would_move_the_host() {
        let client = SendbirdClient::new(crate::config::DEFAULT_CHAT_API_BASE, "tok");
        for hostile in [
            "x.attacker.example/",
            "x.attacker.example",
            "evil@attacker.example#",
            "a?b",
            "a/b",
            "",
        ] {
            match client.messages_url(hostile, "chan", 1) {
                Err(FetchError::Url { .. }) => {}
                other => panic!("app_id {:?} should be rejected, got {:?}", hostile, other),
            }
        }
    }

    #[test]
    fn messages_url_host_follows_template() {
        let client = SendbirdClient::new(crate::config::DEFAULT_CHAT_API_BASE, "tok");
        let url = client.messages_url("Valid-App-9", "chan", 1).unwrap();
        assert_eq!(url.host_str(), Some("api-valid-app-9.sendbird.com"));
    }

    #[tokio::test]
    async fn transport_failure_keeps_root_cause_in_chain() {
        let client = SendbirdClient::new("http://127.0.0.1:1", "tok");
        let err = client
            .fetch_messages("app", "chan", 1)
            .await
            .expect_err("nothing listens on port 1");
        assert!(matches!(err, FetchError::Request(_)));
        let top = err.to_string();
        let chain = format!("{:#}", anyhow::Error::new(err));
        assert!(chain.starts_with("chat API request failed: "));
        assert!(chain.len() > top.len());
    }

    #[tokio::test]
    async fn ok_status_with_unexpected_body_is_schema_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/v3/group_channels/chan/messages")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"foo":1}"#)
            .create_async()
            .await;
        let client = SendbirdClient::new(server.url(), "tok");
        let err = client
            .fetch_messages("app", "chan", 1)
            .await
            .expect_err("body without messages");
        assert!(matches!(err, FetchError::Schema(_)), "got {:?}", err);
    }

    #[test]
    fn messages_url_rejects_bad_base() {
        let client = SendbirdClient::new("not a url", "tok");
        assert!(matches!(
            client.messages_url("app", "chan", 0),
            Err(FetchError::Url { .. })
        ));
    }

    #[test]
    fn wire_message_maps_missing_fields_to_none() {
        let data: ListMessagesResponse = serde_json::from_str(
            r#"{"messages":[
                {"message":"hi","user":{"nickname":"Ann"},"created_at":1},
                {"message":"no user"},
                {"user":{"user_id":"u2"}}
            ]}"#,
        )
        .unwrap();
        let msgs: Vec<Message> = data.messages.into_iter().map(Message::from).collect();
        assert_eq!(msgs[0], Message::new("Ann", "hi"));
        assert_eq!(msgs[1].nickname, None);
        assert_eq!(msgs[2].body, None);
        assert_eq!(msgs[2].nickname, None);
    }
}
