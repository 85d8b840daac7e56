//! Render a message sequence as a plain-text transcript.

use crate::chat::Message;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("message {index} has no sender nickname")]
    MissingNickname { index: usize },
    #[error("message {index} has no body")]
    MissingBody { index: usize },
}

/// One `"{nickname}: {body}"` line per message, newline-joined, in input order.
/// Empty input yields an empty string. A message missing either field is an error.
pub fn format(messages: &[Message]) -> Result<String, FormatError> {
    let mut lines = Vec::with_capacity(messages.len());
    for (index, m) in messages.iter().enumerate() {
        let nickname = m
            .nickname
            .as_deref()
            .ok_or(FormatError::MissingNickname { index })?;
        let body = m.body.as_deref().ok_or(FormatError::MissingBody { index })?;
        lines.push(format!("{}: {}", nickname, body));
    }
    Ok(lines.join("\n"))
}
