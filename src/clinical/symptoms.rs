use std::sync::LazyLock;

use regex::Regex;
use rusqlite::Connection;
use uuid::Uuid;

use super::alerts::{raise_symptom_alert, AlertNotifier};
use crate::db::{self, DatabaseError};
use crate::error::CareError;
use crate::models::enums::{ReportedVia, Role, SymptomType};
use crate::models::{Alert, SymptomReport, User};

/// Intensity assumed when a chat message names no number.
pub const DEFAULT_CHAT_INTENSITY: i32 = 5;

static INTENSITY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([1-9]|10)\b").expect("Invalid intensity regex pattern"));

/// Symptom type keywords, checked in order. Anything else is pain.
const CHAT_SYMPTOM_KEYWORDS: &[(&[&str], SymptomType)] = &[
    (&["cansada", "fatigada"], SymptomType::Fatigue),
    (&["náusea", "nausea"], SymptomType::Nausea),
];

/// First standalone number 1-10 in the text.
pub fn extract_intensity(message: &str) -> Option<i32> {
    INTENSITY_PATTERN
        .captures(message)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn infer_symptom_type(message: &str) -> SymptomType {
    let lower = message.to_lowercase();
    CHAT_SYMPTOM_KEYWORDS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, symptom_type)| *symptom_type)
        .unwrap_or(SymptomType::Pain)
}

fn validate_intensity(intensity: i32) -> Result<(), CareError> {
    if !(1..=10).contains(&intensity) {
        return Err(CareError::InvalidInput(format!(
            "intensity must be between 1 and 10, got {intensity}"
        )));
    }
    Ok(())
}

/// Store a symptom report and raise an alert when it is severe.
pub fn record_symptom(
    conn: &Connection,
    notifier: &AlertNotifier,
    patient: &User,
    report: SymptomReport,
) -> Result<(SymptomReport, Option<Alert>), CareError> {
    if !patient.is_patient() {
        return Err(CareError::role_required(Role::Patient, patient.role));
    }
    if report.patient_id != patient.id {
        return Err(CareError::InvalidInput("report belongs to another patient".into()));
    }
    validate_intensity(report.intensity)?;

    db::insert_symptom_report(conn, &report)?;
    tracing::info!(
        patient_id = %patient.id,
        symptom_type = report.symptom_type.as_str(),
        intensity = report.intensity,
        via = report.reported_via.as_str(),
        "Symptom recorded"
    );

    let alert = raise_symptom_alert(conn, notifier, patient, &report)?;
    Ok((report, alert))
}

/// Derive a symptom report from a chat message and record it.
pub fn record_symptom_from_chat(
    conn: &Connection,
    notifier: &AlertNotifier,
    patient: &User,
    message: &str,
    interaction_id: Uuid,
) -> Result<(SymptomReport, Option<Alert>), CareError> {
    let intensity = extract_intensity(message).unwrap_or(DEFAULT_CHAT_INTENSITY);
    let mut report = SymptomReport::new(
        patient.id,
        infer_symptom_type(message),
        intensity,
        message,
        ReportedVia::Chat,
    );
    report.related_chat_id = Some(interaction_id);
    record_symptom(conn, notifier, patient, report)
}

/// Attach a doctor's notes to a report.
pub fn review_symptom(
    conn: &Connection,
    reviewer: &User,
    symptom_id: &Uuid,
    notes: &str,
) -> Result<SymptomReport, CareError> {
    if !reviewer.is_doctor() {
        return Err(CareError::role_required(Role::Doctor, reviewer.role));
    }
    let now = chrono::Local::now().naive_local();
    db::update_symptom_review(conn, symptom_id, &reviewer.id, notes, &now).map_err(|e| match e {
        DatabaseError::NotFound { .. } => CareError::NotFound {
            entity: "symptom_report",
            id: *symptom_id,
        },
        other => CareError::Database(other),
    })?;

    db::get_symptom_report(conn, symptom_id)?.ok_or(CareError::NotFound {
        entity: "symptom_report",
        id: *symptom_id,
    })
}
