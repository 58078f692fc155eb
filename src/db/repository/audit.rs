use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;

/// One data-access decision, as stored in `audit_log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub timestamp: String,
    pub patient_id: String,
    pub requester_id: String,
    pub scope: String,
    pub granted: bool,
}

/// Record an access decision, timestamped by the database clock.
pub fn insert_audit_entry(
    conn: &Connection,
    patient_id: &Uuid,
    requester_id: &Uuid,
    scope: &str,
    granted: bool,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO audit_log (patient_id, requester_id, scope, granted) VALUES (?1, ?2, ?3, ?4)",
        params![patient_id.to_string(), requester_id.to_string(), scope, granted as i32],
    )?;
    Ok(())
}

/// Prune audit entries older than the given number of days.
pub fn prune_audit_log(conn: &Connection, retention_days: i64) -> Result<usize, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM audit_log WHERE timestamp < datetime('now', ?1)",
        params![format!("-{retention_days} days")],
    )?;
    Ok(deleted)
}

/// Access decisions about one patient within the last N days, newest first.
pub fn query_audit_by_patient(
    conn: &Connection,
    patient_id: &Uuid,
    days: i64,
) -> Result<Vec<AuditEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT timestamp, patient_id, requester_id, scope, granted FROM audit_log
         WHERE patient_id = ?1 AND timestamp >= datetime('now', ?2)
         ORDER BY timestamp DESC, id DESC",
    )?;
    let rows = stmt
        .query_map(params![patient_id.to_string(), format!("-{days} days")], |row| {
            Ok(AuditEntry {
                timestamp: row.get(0)?,
                patient_id: row.get(1)?,
                requester_id: row.get(2)?,
                scope: row.get(3)?,
                granted: row.get::<_, i32>(4)? != 0,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
