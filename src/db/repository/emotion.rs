use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{
    fmt_datetime, optional, parse_date, parse_datetime, parse_opt_uuid, parse_uuid, window_end,
    window_start, window_start_date,
};
use crate::db::DatabaseError;
use crate::models::enums::CheckInType;
use crate::models::{CheckIn, EmotionLog};

// ── Emotion logs ──

const EMOTION_COLUMNS: &str =
    "id, patient_id, mood, anxiety, energy, pain_emotional_impact, notes, timestamp";

pub fn insert_emotion_log(conn: &Connection, log: &EmotionLog) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO emotion_logs (id, patient_id, mood, anxiety, energy, pain_emotional_impact, notes, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            log.id.to_string(),
            log.patient_id.to_string(),
            log.mood,
            log.anxiety,
            log.energy,
            log.pain_emotional_impact,
            log.notes,
            fmt_datetime(&log.timestamp),
        ],
    )?;
    Ok(())
}

/// Most recent logs, newest first.
pub fn get_recent_emotion_logs(
    conn: &Connection,
    patient_id: &Uuid,
    limit: usize,
) -> Result<Vec<EmotionLog>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EMOTION_COLUMNS} FROM emotion_logs WHERE patient_id = ?1
         ORDER BY timestamp DESC LIMIT ?2"
    ))?;
    let rows = stmt.query_map(params![patient_id.to_string(), limit as i64], read_emotion_row)?;
    rows.collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(emotion_from_row)
        .collect()
}

/// Logs since midnight `days` days before `today`, oldest first.
pub fn get_emotion_logs_in_window(
    conn: &Connection,
    patient_id: &Uuid,
    days: i64,
    today: NaiveDate,
) -> Result<Vec<EmotionLog>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EMOTION_COLUMNS} FROM emotion_logs
         WHERE patient_id = ?1 AND timestamp >= ?2 AND timestamp < ?3
         ORDER BY timestamp ASC"
    ))?;
    let rows = stmt.query_map(
        params![patient_id.to_string(), window_start(today, days), window_end(today)],
        read_emotion_row,
    )?;
    rows.collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(emotion_from_row)
        .collect()
}

type EmotionRow = (String, String, i32, i32, i32, Option<i32>, Option<String>, String);

fn read_emotion_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EmotionRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn emotion_from_row(row: EmotionRow) -> Result<EmotionLog, DatabaseError> {
    let (id, patient_id, mood, anxiety, energy, pain_emotional_impact, notes, timestamp) = row;
    Ok(EmotionLog {
        id: parse_uuid(&id)?,
        patient_id: parse_uuid(&patient_id)?,
        mood,
        anxiety,
        energy,
        pain_emotional_impact,
        notes,
        timestamp: parse_datetime(&timestamp),
    })
}

// ── Check-ins ──

const CHECKIN_COLUMNS: &str =
    "id, patient_id, checkin_type, scheduled_date, completed, completion_date, related_emotion_log_id";

pub fn insert_checkin(conn: &Connection, checkin: &CheckIn) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO checkins (id, patient_id, checkin_type, scheduled_date, completed,
         completion_date, related_emotion_log_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            checkin.id.to_string(),
            checkin.patient_id.to_string(),
            checkin.checkin_type.as_str(),
            checkin.scheduled_date.to_string(),
            checkin.completed as i32,
            checkin.completion_date.as_ref().map(fmt_datetime),
            checkin.related_emotion_log_id.map(|id| id.to_string()),
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DatabaseError::ConstraintViolation(format!(
                "{} check-in already scheduled for {}",
                checkin.checkin_type.as_str(),
                checkin.scheduled_date
            ))
        }
        other => other.into(),
    })?;
    Ok(())
}

/// First open check-in of the patient scheduled on `date`.
pub fn get_pending_checkin(
    conn: &Connection,
    patient_id: &Uuid,
    date: NaiveDate,
) -> Result<Option<CheckIn>, DatabaseError> {
    let row = optional(conn.query_row(
        &format!(
            "SELECT {CHECKIN_COLUMNS} FROM checkins
             WHERE patient_id = ?1 AND scheduled_date = ?2 AND completed = 0
             ORDER BY checkin_type LIMIT 1"
        ),
        params![patient_id.to_string(), date.to_string()],
        read_checkin_row,
    ))?;
    row.map(checkin_from_row).transpose()
}

pub fn complete_checkin(
    conn: &Connection,
    id: &Uuid,
    emotion_log_id: &Uuid,
    completed_at: &chrono::NaiveDateTime,
) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE checkins SET completed = 1, completion_date = ?2, related_emotion_log_id = ?3
         WHERE id = ?1",
        params![id.to_string(), fmt_datetime(completed_at), emotion_log_id.to_string()],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "checkin".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Check-ins scheduled from `today - days` through `today`.
pub fn get_checkins_in_window(
    conn: &Connection,
    patient_id: &Uuid,
    days: i64,
    today: NaiveDate,
) -> Result<Vec<CheckIn>, DatabaseError> {
    let start = window_start_date(today, days);
    let mut stmt = conn.prepare(&format!(
        "SELECT {CHECKIN_COLUMNS} FROM checkins
         WHERE patient_id = ?1 AND scheduled_date BETWEEN ?2 AND ?3
         ORDER BY scheduled_date ASC"
    ))?;
    let rows = stmt.query_map(
        params![patient_id.to_string(), start.to_string(), today.to_string()],
        read_checkin_row,
    )?;
    rows.collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(checkin_from_row)
        .collect()
}

type CheckInRow = (String, String, String, String, i32, Option<String>, Option<String>);

fn read_checkin_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CheckInRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn checkin_from_row(row: CheckInRow) -> Result<CheckIn, DatabaseError> {
    let (id, patient_id, checkin_type, scheduled_date, completed, completion_date, log_id) = row;
    Ok(CheckIn {
        id: parse_uuid(&id)?,
        patient_id: parse_uuid(&patient_id)?,
        checkin_type: CheckInType::from_str(&checkin_type)?,
        scheduled_date: parse_date(&scheduled_date),
        completed: completed != 0,
        completion_date: completion_date.map(|s| parse_datetime(&s)),
        related_emotion_log_id: parse_opt_uuid(log_id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::*;
    use crate::models::enums::Role;

    fn log_at(patient_id: Uuid, mood: i32, at: &str) -> EmotionLog {
        EmotionLog {
            timestamp: parse_datetime(at),
            ..EmotionLog::new(patient_id, mood, 4, 6)
        }
    }

    fn checkin_on(patient_id: Uuid, date: NaiveDate) -> CheckIn {
        CheckIn {
            id: Uuid::new_v4(),
            patient_id,
            checkin_type: CheckInType::Daily,
            scheduled_date: date,
            completed: false,
            completion_date: None,
            related_emotion_log_id: None,
        }
    }

    #[test]
    fn window_returns_oldest_first() {
        let conn = test_db();
        let patient = make_user(&conn, "ana", Role::Patient);
        insert_emotion_log(&conn, &log_at(patient.id, 2, "2025-02-01 09:00:00")).unwrap();
        insert_emotion_log(&conn, &log_at(patient.id, 5, "2025-03-08 09:00:00")).unwrap();
        insert_emotion_log(&conn, &log_at(patient.id, 7, "2025-03-10 09:00:00")).unwrap();

        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let moods: Vec<_> = get_emotion_logs_in_window(&conn, &patient.id, 7, today)
            .unwrap()
            .iter()
            .map(|l| l.mood)
            .collect();
        assert_eq!(moods, vec![5, 7]);

        let recent = get_recent_emotion_logs(&conn, &patient.id, 1).unwrap();
        assert_eq!(recent[0].mood, 7);
    }

    #[test]
    fn duplicate_checkin_is_constraint_violation() {
        let conn = test_db();
        let patient = make_user(&conn, "ana", Role::Patient);
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        insert_checkin(&conn, &checkin_on(patient.id, date)).unwrap();

        let err = insert_checkin(&conn, &checkin_on(patient.id, date)).unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
    }

    #[test]
    fn completing_checkin_closes_it() {
        let conn = test_db();
        let patient = make_user(&conn, "ana", Role::Patient);
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let checkin = checkin_on(patient.id, date);
        insert_checkin(&conn, &checkin).unwrap();
        let log = log_at(patient.id, 6, "2025-03-10 09:00:00");
        insert_emotion_log(&conn, &log).unwrap();

        let pending = get_pending_checkin(&conn, &patient.id, date).unwrap().unwrap();
        assert_eq!(pending.id, checkin.id);

        complete_checkin(&conn, &checkin.id, &log.id, &log.timestamp).unwrap();
        assert!(get_pending_checkin(&conn, &patient.id, date).unwrap().is_none());

        let all = get_checkins_in_window(&conn, &patient.id, 7, date).unwrap();
        assert!(all[0].completed);
        assert_eq!(all[0].related_emotion_log_id, Some(log.id));
    }
}
