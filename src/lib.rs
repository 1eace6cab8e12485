//! Realtime chat: a desktop client bound to a WebSocket event channel, and
//! the relay server it talks to.

pub mod client;
pub mod common;
pub mod config;
pub mod network;
pub mod storage;
pub mod ui;
