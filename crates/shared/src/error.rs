use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error("step index {index} out of range for sequence with {len} steps")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Reasons an incoming server frame could not be turned into a [`ServerMessage`].
///
/// [`ServerMessage`]: crate::protocol::ServerMessage
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("frame is not valid json: {0}")]
    InvalidJson(String),
    #[error("frame has no string `type` field")]
    MissingType,
    #[error("invalid `{kind}` payload: {message}")]
    InvalidPayload { kind: String, message: String },
}

impl ProtocolError {
    pub fn invalid_payload(kind: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidPayload {
            kind: kind.into(),
            message: message.to_string(),
        }
    }
}
