use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{domain::Sequence, error::ProtocolError};

/// Editor → controller frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ClientCommand {
    GetSequence,
    SaveSequence { sequence: Sequence },
}

impl ClientCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ClientCommand::GetSequence => "get_sequence",
            ClientCommand::SaveSequence { .. } => "save_sequence",
        }
    }

    pub fn to_frame(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Controller → editor frames.
///
/// Decoding never fails on an unrecognized `type`; those frames become
/// [`ServerMessage::Unknown`] so newer controllers can add message kinds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Sequence {
        sequence: Sequence,
    },
    Pong,
    #[serde(skip)]
    Unknown(String),
}

#[derive(Deserialize)]
struct SequencePayload {
    sequence: Sequence,
}

impl ServerMessage {
    pub fn kind(&self) -> &str {
        match self {
            ServerMessage::Sequence { .. } => "sequence",
            ServerMessage::Pong => "pong",
            ServerMessage::Unknown(kind) => kind,
        }
    }

    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(frame)
            .map_err(|err| ProtocolError::InvalidJson(err.to_string()))?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(ProtocolError::MissingType)?;

        match kind {
            "sequence" => {
                let payload: SequencePayload = serde_json::from_value(value.clone())
                    .map_err(|err| ProtocolError::invalid_payload(kind, err))?;
                Ok(ServerMessage::Sequence {
                    sequence: payload.sequence,
                })
            }
            "pong" => Ok(ServerMessage::Pong),
            other => Ok(ServerMessage::Unknown(other.to_string())),
        }
    }

    pub fn to_frame(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
