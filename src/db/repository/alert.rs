use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{fmt_datetime, optional, parse_datetime, parse_opt_uuid, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::{AlertSeverity, AlertType};
use crate::models::Alert;

const ALERT_COLUMNS: &str = "id, patient_id, alert_type, severity, message, suggested_action,
     is_resolved, created_at, resolved_at, resolved_by, resolution_notes,
     related_symptom_id, related_chat_id, email_sent";

/// CRITICAL first, then newest first.
const SEVERITY_ORDER: &str = "CASE severity
         WHEN 'CRITICAL' THEN 4 WHEN 'HIGH' THEN 3 WHEN 'MEDIUM' THEN 2 ELSE 1 END DESC,
         created_at DESC";

pub fn insert_alert(conn: &Connection, alert: &Alert) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO alerts (id, patient_id, alert_type, severity, message, suggested_action,
         is_resolved, created_at, resolved_at, resolved_by, resolution_notes,
         related_symptom_id, related_chat_id, email_sent)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            alert.id.to_string(),
            alert.patient_id.to_string(),
            alert.alert_type.as_str(),
            alert.severity.as_str(),
            alert.message,
            alert.suggested_action,
            alert.is_resolved as i32,
            fmt_datetime(&alert.created_at),
            alert.resolved_at.as_ref().map(fmt_datetime),
            alert.resolved_by.map(|id| id.to_string()),
            alert.resolution_notes,
            alert.related_symptom_id.map(|id| id.to_string()),
            alert.related_chat_id.map(|id| id.to_string()),
            alert.email_sent as i32,
        ],
    )?;
    Ok(())
}

pub fn get_alert(conn: &Connection, id: &Uuid) -> Result<Option<Alert>, DatabaseError> {
    let row = optional(conn.query_row(
        &format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE id = ?1"),
        params![id.to_string()],
        read_alert_row,
    ))?;
    row.map(alert_from_row).transpose()
}

/// Unresolved alerts of one patient, most severe first.
pub fn get_active_alerts(conn: &Connection, patient_id: &Uuid) -> Result<Vec<Alert>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ALERT_COLUMNS} FROM alerts
         WHERE patient_id = ?1 AND is_resolved = 0
         ORDER BY {SEVERITY_ORDER}"
    ))?;
    let rows = stmt.query_map(params![patient_id.to_string()], read_alert_row)?;
    collect_alerts(rows)
}

/// Every alert of one patient, most severe first.
pub fn get_alerts_for_patient(conn: &Connection, patient_id: &Uuid) -> Result<Vec<Alert>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ALERT_COLUMNS} FROM alerts WHERE patient_id = ?1 ORDER BY {SEVERITY_ORDER}"
    ))?;
    let rows = stmt.query_map(params![patient_id.to_string()], read_alert_row)?;
    collect_alerts(rows)
}

/// Newest unresolved alerts across a set of patients.
pub fn get_recent_unresolved_alerts(
    conn: &Connection,
    patient_ids: &[Uuid],
    limit: usize,
) -> Result<Vec<Alert>, DatabaseError> {
    if patient_ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = (1..=patient_ids.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stmt = conn.prepare(&format!(
        "SELECT {ALERT_COLUMNS} FROM alerts
         WHERE is_resolved = 0 AND patient_id IN ({placeholders})
         ORDER BY created_at DESC LIMIT {limit}"
    ))?;

    let values: Vec<String> = patient_ids.iter().map(Uuid::to_string).collect();
    let rows = stmt.query_map(rusqlite::params_from_iter(values.iter()), read_alert_row)?;
    collect_alerts(rows)
}

/// Unresolved alert counts for one patient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertCounts {
    pub active: i64,
    pub critical: i64,
    pub high: i64,
}

pub fn count_active_alerts(conn: &Connection, patient_id: &Uuid) -> Result<AlertCounts, DatabaseError> {
    let counts = conn.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(severity = 'CRITICAL'), 0),
                COALESCE(SUM(severity = 'HIGH'), 0)
         FROM alerts WHERE patient_id = ?1 AND is_resolved = 0",
        params![patient_id.to_string()],
        |row| {
            Ok(AlertCounts {
                active: row.get(0)?,
                critical: row.get(1)?,
                high: row.get(2)?,
            })
        },
    )?;
    Ok(counts)
}

pub fn mark_alert_email_sent(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE alerts SET email_sent = 1 WHERE id = ?1",
        params![id.to_string()],
    )?;
    if affected == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

/// Close an alert. Resolving an already resolved alert is a constraint violation.
pub fn mark_alert_resolved(
    conn: &Connection,
    id: &Uuid,
    resolver_id: &Uuid,
    notes: Option<&str>,
    resolved_at: &chrono::NaiveDateTime,
) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE alerts SET is_resolved = 1, resolved_by = ?2, resolution_notes = ?3, resolved_at = ?4
         WHERE id = ?1 AND is_resolved = 0",
        params![id.to_string(), resolver_id.to_string(), notes, fmt_datetime(resolved_at)],
    )?;
    if affected == 0 {
        return match get_alert(conn, id)? {
            Some(_) => Err(DatabaseError::ConstraintViolation(format!(
                "alert {id} is already resolved"
            ))),
            None => Err(not_found(id)),
        };
    }
    Ok(())
}

fn not_found(id: &Uuid) -> DatabaseError {
    DatabaseError::NotFound {
        entity_type: "alert".into(),
        id: id.to_string(),
    }
}

struct AlertRow {
    id: String,
    patient_id: String,
    alert_type: String,
    severity: String,
    message: String,
    suggested_action: Option<String>,
    is_resolved: i32,
    created_at: String,
    resolved_at: Option<String>,
    resolved_by: Option<String>,
    resolution_notes: Option<String>,
    related_symptom_id: Option<String>,
    related_chat_id: Option<String>,
    email_sent: i32,
}

fn read_alert_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AlertRow> {
    Ok(AlertRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        alert_type: row.get(2)?,
        severity: row.get(3)?,
        message: row.get(4)?,
        suggested_action: row.get(5)?,
        is_resolved: row.get(6)?,
        created_at: row.get(7)?,
        resolved_at: row.get(8)?,
        resolved_by: row.get(9)?,
        resolution_notes: row.get(10)?,
        related_symptom_id: row.get(11)?,
        related_chat_id: row.get(12)?,
        email_sent: row.get(13)?,
    })
}

fn collect_alerts(
    rows: rusqlite::MappedRows<'_, impl FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<AlertRow>>,
) -> Result<Vec<Alert>, DatabaseError> {
    let mut alerts = Vec::new();
    for row in rows {
        alerts.push(alert_from_row(row?)?);
    }
    Ok(alerts)
}

fn alert_from_row(row: AlertRow) -> Result<Alert, DatabaseError> {
    Ok(Alert {
        id: parse_uuid(&row.id)?,
        patient_id: parse_uuid(&row.patient_id)?,
        alert_type: AlertType::from_str(&row.alert_type)?,
        severity: AlertSeverity::from_str(&row.severity)?,
        message: row.message,
        suggested_action: row.suggested_action,
        is_resolved: row.is_resolved != 0,
        created_at: parse_datetime(&row.created_at),
        resolved_at: row.resolved_at.map(|s| parse_datetime(&s)),
        resolved_by: parse_opt_uuid(row.resolved_by),
        resolution_notes: row.resolution_notes,
        related_symptom_id: parse_opt_uuid(row.related_symptom_id),
        related_chat_id: parse_opt_uuid(row.related_chat_id),
        email_sent: row.email_sent != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::*;
    use crate::models::enums::Role;

    fn alert_at(patient_id: Uuid, severity: AlertSeverity, at: &str) -> Alert {
        Alert {
            created_at: parse_datetime(at),
            ..Alert::new(patient_id, AlertType::Manual, severity, "revisar")
        }
    }

    #[test]
    fn alert_insert_and_retrieve() {
        let conn = test_db();
        let patient = make_user(&conn, "ana", Role::Patient);
        let alert = alert_at(patient.id, AlertSeverity::High, "2025-03-01 10:00:00")
            .with_action("Llamar hoy");
        insert_alert(&conn, &alert).unwrap();

        let loaded = get_alert(&conn, &alert.id).unwrap().unwrap();
        assert_eq!(loaded, alert);
    }

    #[test]
    fn active_alerts_ordered_by_severity_then_recency() {
        let conn = test_db();
        let patient = make_user(&conn, "ana", Role::Patient);
        let low = alert_at(patient.id, AlertSeverity::Low, "2025-03-05 10:00:00");
        let old_critical = alert_at(patient.id, AlertSeverity::Critical, "2025-03-01 10:00:00");
        let new_critical = alert_at(patient.id, AlertSeverity::Critical, "2025-03-04 10:00:00");
        let high = alert_at(patient.id, AlertSeverity::High, "2025-03-03 10:00:00");
        for a in [&low, &old_critical, &new_critical, &high] {
            insert_alert(&conn, a).unwrap();
        }

        let ids: Vec<_> = get_active_alerts(&conn, &patient.id)
            .unwrap()
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![new_critical.id, old_critical.id, high.id, low.id]);

        let counts = count_active_alerts(&conn, &patient.id).unwrap();
        assert_eq!(counts, AlertCounts { active: 4, critical: 2, high: 1 });
    }

    #[test]
    fn resolve_removes_from_active() {
        let conn = test_db();
        let patient = make_user(&conn, "ana", Role::Patient);
        let doctor = make_user(&conn, "drperez", Role::Doctor);
        let alert = alert_at(patient.id, AlertSeverity::High, "2025-03-01 10:00:00");
        insert_alert(&conn, &alert).unwrap();

        let at = parse_datetime("2025-03-02 10:00:00");
        mark_alert_resolved(&conn, &alert.id, &doctor.id, Some("Contactada"), &at).unwrap();
        assert!(get_active_alerts(&conn, &patient.id).unwrap().is_empty());
        assert_eq!(get_alerts_for_patient(&conn, &patient.id).unwrap().len(), 1);

        let again = mark_alert_resolved(&conn, &alert.id, &doctor.id, None, &at);
        assert!(matches!(again, Err(DatabaseError::ConstraintViolation(_))));
        let missing = mark_alert_resolved(&conn, &Uuid::new_v4(), &doctor.id, None, &at);
        assert!(matches!(missing, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn recent_unresolved_across_patients() {
        let conn = test_db();
        let ana = make_user(&conn, "ana", Role::Patient);
        let luis = make_user(&conn, "luis", Role::Patient);
        let other = make_user(&conn, "eva", Role::Patient);
        insert_alert(&conn, &alert_at(ana.id, AlertSeverity::Low, "2025-03-01 10:00:00")).unwrap();
        insert_alert(&conn, &alert_at(luis.id, AlertSeverity::Low, "2025-03-02 10:00:00")).unwrap();
        insert_alert(&conn, &alert_at(other.id, AlertSeverity::Low, "2025-03-03 10:00:00")).unwrap();

        let recent = get_recent_unresolved_alerts(&conn, &[ana.id, luis.id], 10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].patient_id, luis.id);
        assert!(get_recent_unresolved_alerts(&conn, &[], 10).unwrap().is_empty());
    }

    #[test]
    fn email_flag_persists() {
        let conn = test_db();
        let patient = make_user(&conn, "ana", Role::Patient);
        let alert = alert_at(patient.id, AlertSeverity::Critical, "2025-03-01 10:00:00");
        insert_alert(&conn, &alert).unwrap();
        mark_alert_email_sent(&conn, &alert.id).unwrap();
        assert!(get_alert(&conn, &alert.id).unwrap().unwrap().email_sent);
    }
}
