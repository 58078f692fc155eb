use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{fmt_datetime, optional, parse_datetime, parse_opt_uuid, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::RecommendationCategory;
use crate::models::Recommendation;

const RECOMMENDATION_COLUMNS: &str = "id, patient_id, text, category, is_ai_generated, created_by,
     created_at, is_active, patient_completed, patient_helpful";

pub fn insert_recommendation(conn: &Connection, rec: &Recommendation) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO recommendations (id, patient_id, text, category, is_ai_generated, created_by,
         created_at, is_active, patient_completed, patient_helpful)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            rec.id.to_string(),
            rec.patient_id.to_string(),
            rec.text,
            rec.category.as_str(),
            rec.is_ai_generated as i32,
            rec.created_by.map(|id| id.to_string()),
            fmt_datetime(&rec.created_at),
            rec.is_active as i32,
            rec.patient_completed as i32,
            rec.patient_helpful.map(|h| h as i32),
        ],
    )?;
    Ok(())
}

pub fn get_recommendation(conn: &Connection, id: &Uuid) -> Result<Option<Recommendation>, DatabaseError> {
    let row = optional(conn.query_row(
        &format!("SELECT {RECOMMENDATION_COLUMNS} FROM recommendations WHERE id = ?1"),
        params![id.to_string()],
        read_recommendation_row,
    ))?;
    row.map(recommendation_from_row).transpose()
}

/// Active recommendations for a patient, newest first.
pub fn get_active_recommendations(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Recommendation>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECOMMENDATION_COLUMNS} FROM recommendations
         WHERE patient_id = ?1 AND is_active = 1
         ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map(params![patient_id.to_string()], read_recommendation_row)?;
    rows.collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(recommendation_from_row)
        .collect()
}

/// Every recommendation of a patient, newest first.
pub fn get_recommendations_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
    limit: usize,
) -> Result<Vec<Recommendation>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECOMMENDATION_COLUMNS} FROM recommendations
         WHERE patient_id = ?1
         ORDER BY created_at DESC LIMIT ?2"
    ))?;
    let rows = stmt.query_map(params![patient_id.to_string(), limit as i64], read_recommendation_row)?;
    rows.collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(recommendation_from_row)
        .collect()
}

/// Store the patient's feedback on a recommendation.
pub fn update_recommendation_feedback(
    conn: &Connection,
    id: &Uuid,
    completed: bool,
    helpful: Option<bool>,
) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE recommendations SET patient_completed = ?2, patient_helpful = ?3 WHERE id = ?1",
        params![id.to_string(), completed as i32, helpful.map(|h| h as i32)],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "recommendation".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

type RecommendationRow = (
    String, String, String, String, i32,
    Option<String>, String, i32, i32, Option<i32>,
);

fn read_recommendation_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RecommendationRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
    ))
}

fn recommendation_from_row(row: RecommendationRow) -> Result<Recommendation, DatabaseError> {
    let (
        id, patient_id, text, category, is_ai_generated,
        created_by, created_at, is_active, patient_completed, patient_helpful,
    ) = row;
    Ok(Recommendation {
        id: parse_uuid(&id)?,
        patient_id: parse_uuid(&patient_id)?,
        text,
        category: RecommendationCategory::from_str(&category)?,
        is_ai_generated: is_ai_generated != 0,
        created_by: parse_opt_uuid(created_by),
        created_at: parse_datetime(&created_at),
        is_active: is_active != 0,
        patient_completed: patient_completed != 0,
        patient_helpful: patient_helpful.map(|h| h != 0),
    })
}
