use chrono::NaiveDate;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db;
use crate::error::CareError;
use crate::models::enums::TimelineEventType;
use crate::models::{TimelineEvent, User};

/// Add an entry to a patient's clinical timeline.
pub fn add_timeline_event(
    conn: &Connection,
    patient_id: Uuid,
    event_type: TimelineEventType,
    description: &str,
    event_date: NaiveDate,
    created_by: Option<&User>,
) -> Result<TimelineEvent, CareError> {
    if description.trim().is_empty() {
        return Err(CareError::InvalidInput("event description is empty".into()));
    }

    let event = TimelineEvent {
        id: Uuid::new_v4(),
        patient_id,
        event_type,
        description: description.trim().to_string(),
        event_date,
        created_by: created_by.map(|u| u.id),
        created_at: chrono::Local::now().naive_local(),
    };
    db::insert_timeline_event(conn, &event)?;

    tracing::info!(
        patient_id = %patient_id,
        event_type = event_type.as_str(),
        "Timeline event added"
    );
    Ok(event)
}

/// The patient's timeline, most recent event first.
pub fn patient_timeline(conn: &Connection, patient_id: &Uuid) -> Result<Vec<TimelineEvent>, CareError> {
    Ok(db::get_timeline_events(conn, patient_id)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::*;

    #[test]
    fn timeline_orders_by_event_date() {
        let conn = test_db();
        let (patient, doctor, _) = make_care_team(&conn);
        let date = |d| NaiveDate::from_ymd_opt(2024, 5, d).unwrap();

        add_timeline_event(&conn, patient.id, TimelineEventType::Diagnosis, "Diagnóstico inicial", date(2), Some(&doctor)).unwrap();
        add_timeline_event(&conn, patient.id, TimelineEventType::Surgery, "Mastectomía", date(20), Some(&doctor)).unwrap();
        add_timeline_event(&conn, patient.id, TimelineEventType::LabResult, "Hemograma", date(10), None).unwrap();

        let events = patient_timeline(&conn, &patient.id).unwrap();
        let kinds: Vec<_> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(
            kinds,
            vec![TimelineEventType::Surgery, TimelineEventType::LabResult, TimelineEventType::Diagnosis]
        );
        assert_eq!(events[0].created_by, Some(doctor.id));
        assert_eq!(events[1].created_by, None);
    }

    #[test]
    fn blank_description_rejected() {
        let conn = test_db();
        let (patient, _, _) = make_care_team(&conn);
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let err = add_timeline_event(&conn, patient.id, TimelineEventType::Other, "  ", date, None).unwrap_err();
        assert!(matches!(err, CareError::InvalidInput(_)));
    }
}
