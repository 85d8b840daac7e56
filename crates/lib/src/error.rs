//! Per-request failure taxonomy for the relay.
//!
//! None of these reach the webhook caller; the pipeline logs them and the
//! handler still answers `{"status":"ok"}`. Messages carry no detail of their
//! own cause; log with `{:#}` through `anyhow` to get the whole `source()` chain.
//! Startup failures use [`crate::config::ConfigError`] instead.

use crate::automation::ForwardError;
use crate::chat::FetchError;
use crate::transcript::FormatError;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("malformed webhook body")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Forward(#[from] ForwardError),
}

impl RelayError {
    /// Name of the pipeline stage that failed, for log context.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse",
            Self::Fetch(_) => "fetch",
            Self::Format(_) => "format",
            Self::Forward(_) => "forward",
        }
    }
}
