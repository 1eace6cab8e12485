pub mod audit_db;
pub mod database;
pub mod models;

pub use audit_db::AuditDatabase;
pub use models::{AuditAction, AuditEntry};

use std::fs;
use std::path::Path;

use tokio::sync::mpsc;

/// Ensure the directory holding `path` exists
pub fn ensure_parent_dir(path: &str) -> std::io::Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Cheap, cloneable handle for queueing audit entries.
#[derive(Clone)]
pub struct AuditLog {
    sender: mpsc::UnboundedSender<AuditEntry>,
}

impl AuditLog {
    pub fn new(sender: mpsc::UnboundedSender<AuditEntry>) -> Self {
        Self { sender }
    }

    pub fn record(&self, entry: AuditEntry) {
        log::info!(
            "User: {}, IP: {}, Action: {}, Details: {}",
            entry.username,
            entry.ip_address,
            entry.action,
            entry.details
        );
        if self.sender.send(entry).is_err() {
            log::warn!("Audit writer is gone; entry dropped");
        }
    }
}

/// Moves the database onto a blocking thread and feeds it from a queue.
pub fn spawn_audit_writer(db: AuditDatabase) -> AuditLog {
    let (sender, mut receiver) = mpsc::unbounded_channel::<AuditEntry>();

    tokio::task::spawn_blocking(move || {
        while let Some(entry) = receiver.blocking_recv() {
            if let Err(err) = db.record(&entry) {
                log::error!("Failed to write audit entry {}: {err}", entry.action);
            }
        }
        log::info!("Audit writer stopped");
    });

    AuditLog::new(sender)
}
