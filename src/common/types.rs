use std::fmt;

use serde::{Deserialize, Serialize};

/// Tên hiển thị dành cho các thông báo hệ thống.
pub const SYSTEM_USERNAME: &str = "System";

/// Nội dung thông báo khi mất kết nối tới server.
pub const DISCONNECTED_TEXT: &str = "You have been disconnected.";

/// Domain model đại diện một tin nhắn chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub username: String,
    pub text: String,
}

impl ChatMessage {
    pub fn new(username: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            text: text.into(),
        }
    }

    /// A synthetic notice attributed to the "System" sender.
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(SYSTEM_USERNAME, text)
    }
}

impl fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.username, self.text)
    }
}

/// Payload of a `server_message` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerNotice {
    pub text: String,
}

/// Payload of a `user_message` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMessage {
    pub text: String,
}
