//! Chat platform access (Sendbird).
//!
//! `MessageSource` is the seam the ingest pipeline fetches transcripts through;
//! `SendbirdClient` is the HTTP implementation.

mod message;
mod sendbird;

pub use message::Message;
pub use sendbird::{FetchError, SendbirdClient, NEXT_LIMIT, PREV_LIMIT};

use async_trait::async_trait;

/// Fetches the window of messages around an anchor timestamp in a channel.
#[async_trait]
pub trait MessageSource: Send + Sync {
    async fn fetch_messages(
        &self,
        app_id: &str,
        channel_url: &str,
        anchor_ms: i64,
    ) -> Result<Vec<Message>, FetchError>;
}
