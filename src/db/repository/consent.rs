use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{fmt_datetime, optional, parse_datetime, parse_uuid};
use crate::db::DatabaseError;
use crate::models::ConsentRecord;

/// Insert or replace the consent record of `record.patient_id`.
pub fn upsert_consent(conn: &Connection, record: &ConsentRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO consent_records (patient_id, can_share_with_doctor, can_share_chat_with_doctor,
         can_share_with_psychologist, can_use_for_research, consent_date, last_updated)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(patient_id) DO UPDATE SET
           can_share_with_doctor = excluded.can_share_with_doctor,
           can_share_chat_with_doctor = excluded.can_share_chat_with_doctor,
           can_share_with_psychologist = excluded.can_share_with_psychologist,
           can_use_for_research = excluded.can_use_for_research,
           last_updated = excluded.last_updated",
        params![
            record.patient_id.to_string(),
            record.can_share_with_doctor as i32,
            record.can_share_chat_with_doctor as i32,
            record.can_share_with_psychologist as i32,
            record.can_use_for_research as i32,
            fmt_datetime(&record.consent_date),
            fmt_datetime(&record.last_updated),
        ],
    )?;
    Ok(())
}

pub fn get_consent(conn: &Connection, patient_id: &Uuid) -> Result<Option<ConsentRecord>, DatabaseError> {
    let row = optional(conn.query_row(
        "SELECT patient_id, can_share_with_doctor, can_share_chat_with_doctor,
                can_share_with_psychologist, can_use_for_research, consent_date, last_updated
         FROM consent_records WHERE patient_id = ?1",
        params![patient_id.to_string()],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i32>(1)?,
                row.get::<_, i32>(2)?,
                row.get::<_, i32>(3)?,
                row.get::<_, i32>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        },
    ))?;

    row.map(|(id, doctor, chat, psychologist, research, consent_date, last_updated)| {
        Ok(ConsentRecord {
            patient_id: parse_uuid(&id)?,
            can_share_with_doctor: doctor != 0,
            can_share_chat_with_doctor: chat != 0,
            can_share_with_psychologist: psychologist != 0,
            can_use_for_research: research != 0,
            consent_date: parse_datetime(&consent_date),
            last_updated: parse_datetime(&last_updated),
        })
    })
    .transpose()
}
