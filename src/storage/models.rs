use std::fmt;
use std::net::SocketAddr;

use chrono::{DateTime, Utc};

/// Socket lifecycle and chat actions worth keeping an operator trail of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    SocketConnect,
    SocketDisconnect,
    MessageSent,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::SocketConnect => "SOCKET_CONNECT",
            AuditAction::SocketDisconnect => "SOCKET_DISCONNECT",
            AuditAction::MessageSent => "MESSAGE_SENT",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit entry waiting to be written.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub action: AuditAction,
    pub username: String,
    pub ip_address: String,
    pub details: String,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        action: AuditAction,
        username: &str,
        peer: Option<SocketAddr>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            action,
            username: username.to_string(),
            ip_address: peer.map_or_else(|| "N/A".to_string(), |addr| addr.ip().to_string()),
            details: details.into(),
            recorded_at: Utc::now(),
        }
    }
}

/// Audit row as stored.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub id: i64,
    pub action: String,
    pub username: String,
    pub ip_address: String,
    pub details: String,
    pub recorded_at: DateTime<Utc>,
}
