use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{fmt_datetime, parse_date, parse_datetime, parse_opt_uuid, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::TimelineEventType;
use crate::models::TimelineEvent;

pub fn insert_timeline_event(conn: &Connection, event: &TimelineEvent) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO timeline_events (id, patient_id, event_type, description, event_date, created_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.id.to_string(),
            event.patient_id.to_string(),
            event.event_type.as_str(),
            event.description,
            event.event_date.to_string(),
            event.created_by.map(|id| id.to_string()),
            fmt_datetime(&event.created_at),
        ],
    )?;
    Ok(())
}

/// A patient's events, most recent event date first.
pub fn get_timeline_events(conn: &Connection, patient_id: &Uuid) -> Result<Vec<TimelineEvent>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, event_type, description, event_date, created_by, created_at
         FROM timeline_events WHERE patient_id = ?1
         ORDER BY event_date DESC, created_at DESC",
    )?;

    let rows = stmt.query_map(params![patient_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, String>(6)?,
        ))
    })?;

    let mut events = Vec::new();
    for row in rows {
        let (id, patient_id, event_type, description, event_date, created_by, created_at) = row?;
        events.push(TimelineEvent {
            id: parse_uuid(&id)?,
            patient_id: parse_uuid(&patient_id)?,
            event_type: TimelineEventType::from_str(&event_type)?,
            description,
            event_date: parse_date(&event_date),
            created_by: parse_opt_uuid(created_by),
            created_at: parse_datetime(&created_at),
        });
    }
    Ok(events)
}
