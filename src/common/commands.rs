/// Lệnh UI gửi xuống tầng mạng.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    /// `user_message { text }`
    UserMessage { text: String },
}
