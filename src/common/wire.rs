//! JSON envelopes exchanged over the WebSocket.
//!
//! Each named event travels as one text frame shaped like
//! `{"event": "<name>", "data": {...}}`. `connect` and `disconnect` have no
//! frame; they are the opening and closing of the socket itself.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::commands::OutboundEvent;
use super::events::InboundEvent;
use super::types::{ChatMessage, ServerNotice, UserMessage};

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),
}

/// Frames pushed from the server to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerFrame {
    NewChatMessage(ChatMessage),
    ServerMessage(ServerNotice),
}

/// Frames sent from a client to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientFrame {
    UserMessage(UserMessage),
}

impl ServerFrame {
    pub fn notice(text: impl Into<String>) -> Self {
        ServerFrame::ServerMessage(ServerNotice { text: text.into() })
    }

    pub fn encode(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Missing or mistyped fields are rejected rather than defaulted.
    pub fn decode(raw: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl ClientFrame {
    pub fn encode(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(raw: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl From<ServerFrame> for InboundEvent {
    fn from(frame: ServerFrame) -> Self {
        match frame {
            ServerFrame::NewChatMessage(message) => InboundEvent::NewChatMessage(message),
            ServerFrame::ServerMessage(ServerNotice { text }) => {
                InboundEvent::ServerMessage { text }
            }
        }
    }
}

impl From<OutboundEvent> for ClientFrame {
    fn from(event: OutboundEvent) -> Self {
        match event {
            OutboundEvent::UserMessage { text } => ClientFrame::UserMessage(UserMessage { text }),
        }
    }
}
