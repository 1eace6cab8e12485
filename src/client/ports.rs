//! Seams between the chat logic and the outside world.
//!
//! The UI shell and the transport each provide implementations; tests
//! provide in-memory ones.

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::common::OutboundEvent;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("outbound queue is full")]
    Full,
    #[error("channel is closed")]
    Closed,
}

/// Outbound half of the messaging channel.
pub trait Channel {
    fn emit(&mut self, event: OutboundEvent) -> Result<(), ChannelError>;
}

/// Commands are queued for the network task without blocking the UI thread.
impl Channel for mpsc::Sender<OutboundEvent> {
    fn emit(&mut self, event: OutboundEvent) -> Result<(), ChannelError> {
        self.try_send(event).map_err(|err| match err {
            TrySendError::Full(_) => ChannelError::Full,
            TrySendError::Closed(_) => ChannelError::Closed,
        })
    }
}

/// The message text box inside the send form.
pub trait InputField {
    fn value(&self) -> &str;
    fn clear(&mut self);
}

impl InputField for String {
    fn value(&self) -> &str {
        self
    }

    fn clear(&mut self) {
        String::clear(self);
    }
}

/// Append-only list of rendered chat lines.
pub trait MessageList {
    fn append(&mut self, item: String);
}

impl MessageList for Vec<String> {
    fn append(&mut self, item: String) {
        self.push(item);
    }
}

/// A vertically scrollable container wrapping the message list.
pub trait ScrollContainer {
    /// Total height of the scrollable content.
    fn scroll_height(&self) -> f32;
    fn set_scroll_top(&mut self, offset: f32);
}
