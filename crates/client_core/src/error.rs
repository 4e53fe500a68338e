use shared::error::{ProtocolError, SequenceError};
use thiserror::Error;

use crate::channel::ChannelState;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("channel is not open (state: {state:?})")]
    NotReady { state: ChannelState },
    #[error("channel already has an active connection (state: {state:?})")]
    AlreadyActive { state: ChannelState },
    #[error("unsupported url scheme `{0}`; expected http, https, ws or wss")]
    UnsupportedScheme(String),
    #[error("failed to connect websocket {url}: {reason}")]
    Connect { url: String, reason: String },
    #[error("failed to encode outgoing frame: {0}")]
    Encode(String),
}

/// Failures surfaced to the presentation layer. None of these alter the held
/// sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("step index {index} out of range for sequence with {len} steps")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("cannot save: channel is not open (state: {state:?})")]
    ChannelNotReady { state: ChannelState },
    #[error("protocol error: {0}")]
    ProtocolError(String),
    #[error("connection closed{}", closed_suffix(.reason))]
    ChannelClosed { reason: Option<String> },
}

impl From<SequenceError> for EditorError {
    fn from(value: SequenceError) -> Self {
        match value {
            SequenceError::IndexOutOfRange { index, len } => Self::IndexOutOfRange { index, len },
        }
    }
}

impl From<ProtocolError> for EditorError {
    fn from(value: ProtocolError) -> Self {
        Self::ProtocolError(value.to_string())
    }
}

fn closed_suffix(reason: &Option<String>) -> String {
    match reason {
        Some(reason) if !reason.is_empty() => format!(": {reason}"),
        _ => String::new(),
    }
}
