//! One chat message as returned by the platform, in server order.

/// Sender nickname and text body. Either may be missing on the wire; the
/// transcript formatter rejects such entries rather than guessing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub nickname: Option<String>,
    pub body: Option<String>,
}

impl Message {
    pub fn new(nickname: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            nickname: Some(nickname.into()),
            body: Some(body.into()),
        }
    }
}
