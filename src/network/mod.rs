pub mod client;
pub mod server;

pub use client::WsClient;
pub use server::RelayServer;
