pub mod chat_client;
pub mod ports;

pub use chat_client::ChatClient;
pub use ports::{Channel, ChannelError, InputField, MessageList, ScrollContainer};
