use super::types::{ChatMessage, DISCONNECTED_TEXT};

/// Sự kiện từ tầng mạng gửi lên UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// `connect`: the transport is open.
    Connected,
    /// `disconnect`: the transport closed or failed.
    Disconnected,
    /// `new_chat_message`
    NewChatMessage(ChatMessage),
    /// `server_message`
    ServerMessage { text: String },
}

impl InboundEvent {
    /// The line this event contributes to the message list, if any.
    pub fn into_message(self) -> Option<ChatMessage> {
        match self {
            InboundEvent::Connected => None,
            InboundEvent::Disconnected => Some(ChatMessage::system(DISCONNECTED_TEXT)),
            InboundEvent::NewChatMessage(message) => Some(message),
            InboundEvent::ServerMessage { text } => Some(ChatMessage::system(text)),
        }
    }
}
