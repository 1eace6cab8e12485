pub mod commands;
pub mod events;
pub mod types;
pub mod wire;

pub use commands::OutboundEvent;
pub use events::InboundEvent;
pub use types::{ChatMessage, ServerNotice, UserMessage};
pub use wire::{ClientFrame, ServerFrame, WireError};
