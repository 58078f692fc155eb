use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{fmt_datetime, optional, parse_datetime, parse_opt_uuid, parse_uuid, window_end, window_start};
use crate::db::DatabaseError;
use crate::models::enums::{ReportedVia, SymptomType};
use crate::models::SymptomReport;

const SYMPTOM_COLUMNS: &str = "id, patient_id, symptom_type, intensity, description, location,
     reported_via, timestamp, related_chat_id, doctor_notes, reviewed_by, reviewed_at";

pub fn insert_symptom_report(conn: &Connection, symptom: &SymptomReport) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO symptom_reports (id, patient_id, symptom_type, intensity, description, location,
         reported_via, timestamp, related_chat_id, doctor_notes, reviewed_by, reviewed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            symptom.id.to_string(),
            symptom.patient_id.to_string(),
            symptom.symptom_type.as_str(),
            symptom.intensity,
            symptom.description,
            symptom.location,
            symptom.reported_via.as_str(),
            fmt_datetime(&symptom.timestamp),
            symptom.related_chat_id.map(|id| id.to_string()),
            symptom.doctor_notes,
            symptom.reviewed_by.map(|id| id.to_string()),
            symptom.reviewed_at.as_ref().map(fmt_datetime),
        ],
    )?;
    Ok(())
}

pub fn get_symptom_report(conn: &Connection, id: &Uuid) -> Result<Option<SymptomReport>, DatabaseError> {
    let row = optional(conn.query_row(
        &format!("SELECT {SYMPTOM_COLUMNS} FROM symptom_reports WHERE id = ?1"),
        params![id.to_string()],
        read_symptom_row,
    ))?;
    row.map(symptom_from_row).transpose()
}

/// A patient's most recent reports, newest first.
pub fn get_recent_symptoms(
    conn: &Connection,
    patient_id: &Uuid,
    limit: usize,
) -> Result<Vec<SymptomReport>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SYMPTOM_COLUMNS} FROM symptom_reports WHERE patient_id = ?1
         ORDER BY timestamp DESC LIMIT ?2"
    ))?;
    let rows = stmt.query_map(params![patient_id.to_string(), limit as i64], read_symptom_row)?;
    collect_symptoms(rows)
}

/// Reports since midnight `days` days before `today`, newest first.
pub fn get_symptoms_in_window(
    conn: &Connection,
    patient_id: &Uuid,
    days: i64,
    today: NaiveDate,
) -> Result<Vec<SymptomReport>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SYMPTOM_COLUMNS} FROM symptom_reports
         WHERE patient_id = ?1 AND timestamp >= ?2 AND timestamp < ?3
         ORDER BY timestamp DESC"
    ))?;
    let rows = stmt.query_map(
        params![patient_id.to_string(), window_start(today, days), window_end(today)],
        read_symptom_row,
    )?;
    collect_symptoms(rows)
}

/// Record a doctor's review of a report.
pub fn update_symptom_review(
    conn: &Connection,
    id: &Uuid,
    reviewer_id: &Uuid,
    notes: &str,
    reviewed_at: &chrono::NaiveDateTime,
) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE symptom_reports SET doctor_notes = ?2, reviewed_by = ?3, reviewed_at = ?4 WHERE id = ?1",
        params![id.to_string(), notes, reviewer_id.to_string(), fmt_datetime(reviewed_at)],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "symptom_report".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

struct SymptomRow {
    id: String,
    patient_id: String,
    symptom_type: String,
    intensity: i32,
    description: String,
    location: Option<String>,
    reported_via: String,
    timestamp: String,
    related_chat_id: Option<String>,
    doctor_notes: Option<String>,
    reviewed_by: Option<String>,
    reviewed_at: Option<String>,
}

fn read_symptom_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SymptomRow> {
    Ok(SymptomRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        symptom_type: row.get(2)?,
        intensity: row.get(3)?,
        description: row.get(4)?,
        location: row.get(5)?,
        reported_via: row.get(6)?,
        timestamp: row.get(7)?,
        related_chat_id: row.get(8)?,
        doctor_notes: row.get(9)?,
        reviewed_by: row.get(10)?,
        reviewed_at: row.get(11)?,
    })
}

fn collect_symptoms(
    rows: rusqlite::MappedRows<'_, impl FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<SymptomRow>>,
) -> Result<Vec<SymptomReport>, DatabaseError> {
    let mut symptoms = Vec::new();
    for row in rows {
        symptoms.push(symptom_from_row(row?)?);
    }
    Ok(symptoms)
}

fn symptom_from_row(row: SymptomRow) -> Result<SymptomReport, DatabaseError> {
    Ok(SymptomReport {
        id: parse_uuid(&row.id)?,
        patient_id: parse_uuid(&row.patient_id)?,
        symptom_type: SymptomType::from_str(&row.symptom_type)?,
        intensity: row.intensity,
        description: row.description,
        location: row.location,
        reported_via: ReportedVia::from_str(&row.reported_via)?,
        timestamp: parse_datetime(&row.timestamp),
        related_chat_id: parse_opt_uuid(row.related_chat_id),
        doctor_notes: row.doctor_notes,
        reviewed_by: parse_opt_uuid(row.reviewed_by),
        reviewed_at: row.reviewed_at.map(|s| parse_datetime(&s)),
    })
}
