use rusqlite::{Result as SqlResult, params};
use std::path::Path;

use super::database::Database;
use super::models::{AuditEntry, AuditRecord};

/// Audit trail for the relay server
pub struct AuditDatabase {
    db: Database,
}

impl AuditDatabase {
    pub fn with_path<P: AsRef<Path>>(path: P) -> SqlResult<Self> {
        let audit_db = Self {
            db: Database::new(path)?,
        };
        audit_db.init_schema()?;
        Ok(audit_db)
    }

    pub fn in_memory() -> SqlResult<Self> {
        let audit_db = Self {
            db: Database::in_memory()?,
        };
        audit_db.init_schema()?;
        Ok(audit_db)
    }

    fn init_schema(&self) -> SqlResult<()> {
        let conn = self.db.connection();
        conn.execute(
            "CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                action TEXT NOT NULL,
                username TEXT NOT NULL,
                ip_address TEXT NOT NULL,
                details TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_audit_recorded_at ON audit_log(recorded_at)",
            [],
        )?;

        Ok(())
    }

    pub fn record(&self, entry: &AuditEntry) -> SqlResult<()> {
        let conn = self.db.connection();
        conn.execute(
            "INSERT INTO audit_log (action, username, ip_address, details, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.action.as_str(),
                entry.username,
                entry.ip_address,
                entry.details,
                entry.recorded_at
            ],
        )?;
        Ok(())
    }

    /// Newest entries first.
    pub fn recent(&self, limit: usize) -> SqlResult<Vec<AuditRecord>> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare(
            "SELECT id, action, username, ip_address, details, recorded_at
             FROM audit_log
             ORDER BY id DESC
             LIMIT ?1",
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let records = stmt
            .query_map(params![limit], |row| {
                Ok(AuditRecord {
                    id: row.get(0)?,
                    action: row.get(1)?,
                    username: row.get(2)?,
                    ip_address: row.get(3)?,
                    details: row.get(4)?,
                    recorded_at: row.get(5)?,
                })
            })?
            .collect::<SqlResult<Vec<_>>>()?;

        Ok(records)
    }

    pub fn count(&self) -> SqlResult<usize> {
        let conn = self.db.connection();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}
