use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clinical::raise_emotion_alert;
use crate::db;
use crate::error::CareError;
use crate::models::enums::{CheckInType, Role};
use crate::models::{Alert, CheckIn, EmotionLog, User};

/// Wellbeing change between the first and last log of a window that
/// counts as a trend.
const TREND_THRESHOLD: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmotionTrend {
    InsufficientData,
    Improving,
    Stable,
    Declining,
}

impl EmotionTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InsufficientData => "INSUFFICIENT_DATA",
            Self::Improving => "IMPROVING",
            Self::Stable => "STABLE",
            Self::Declining => "DECLINING",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionAverages {
    pub mood: f64,
    pub anxiety: f64,
    pub energy: f64,
    pub samples: usize,
}

/// What recording an emotion log produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionLogOutcome {
    pub log: EmotionLog,
    pub alert: Option<Alert>,
    pub completed_checkin: Option<Uuid>,
}

fn validate_scale(name: &str, value: i32) -> Result<(), CareError> {
    if !(1..=10).contains(&value) {
        return Err(CareError::InvalidInput(format!(
            "{name} must be between 1 and 10, got {value}"
        )));
    }
    Ok(())
}

/// Store an emotion log, raise an alert when it needs attention and close
/// the check-in scheduled for that day.
pub fn record_emotion_log(
    conn: &Connection,
    patient: &User,
    log: EmotionLog,
) -> Result<EmotionLogOutcome, CareError> {
    if !patient.is_patient() {
        return Err(CareError::role_required(Role::Patient, patient.role));
    }
    if log.patient_id != patient.id {
        return Err(CareError::InvalidInput("log belongs to another patient".into()));
    }
    validate_scale("mood", log.mood)?;
    validate_scale("anxiety", log.anxiety)?;
    validate_scale("energy", log.energy)?;
    if let Some(impact) = log.pain_emotional_impact {
        validate_scale("pain_emotional_impact", impact)?;
    }

    db::insert_emotion_log(conn, &log)?;
    tracing::info!(
        patient_id = %patient.id,
        wellbeing = log.overall_wellbeing(),
        "Emotion log recorded"
    );

    let alert = raise_emotion_alert(conn, &log)?;

    let completed_checkin = match db::get_pending_checkin(conn, &patient.id, log.timestamp.date())? {
        Some(checkin) => {
            db::complete_checkin(conn, &checkin.id, &log.id, &log.timestamp)?;
            tracing::debug!(patient_id = %patient.id, checkin_id = %checkin.id, "Check-in completed");
            Some(checkin.id)
        }
        None => None,
    };

    Ok(EmotionLogOutcome {
        log,
        alert,
        completed_checkin,
    })
}

/// Direction of wellbeing since midnight `days` days before `today`.
pub fn analyze_trend(
    conn: &Connection,
    patient_id: &Uuid,
    days: i64,
    today: NaiveDate,
) -> Result<EmotionTrend, CareError> {
    let logs = db::get_emotion_logs_in_window(conn, patient_id, days, today)?;
    Ok(trend_of(&logs))
}

/// Trend of logs ordered oldest first.
pub fn trend_of(logs: &[EmotionLog]) -> EmotionTrend {
    let [first, .., last] = logs else {
        return EmotionTrend::InsufficientData;
    };
    let difference = last.overall_wellbeing() - first.overall_wellbeing();
    if difference > TREND_THRESHOLD {
        EmotionTrend::Improving
    } else if difference < -TREND_THRESHOLD {
        EmotionTrend::Declining
    } else {
        EmotionTrend::Stable
    }
}

/// Mean scores over the window, or `None` when it holds no logs.
pub fn average_scores(
    conn: &Connection,
    patient_id: &Uuid,
    days: i64,
    today: NaiveDate,
) -> Result<Option<EmotionAverages>, CareError> {
    let logs = db::get_emotion_logs_in_window(conn, patient_id, days, today)?;
    Ok(averages_of(&logs))
}

pub fn averages_of(logs: &[EmotionLog]) -> Option<EmotionAverages> {
    if logs.is_empty() {
        return None;
    }
    let n = logs.len() as f64;
    let mean = |f: fn(&EmotionLog) -> i32| logs.iter().map(|l| f64::from(f(l))).sum::<f64>() / n;
    Some(EmotionAverages {
        mood: mean(|l| l.mood),
        anxiety: mean(|l| l.anxiety),
        energy: mean(|l| l.energy),
        samples: logs.len(),
    })
}

// ── Check-ins ──

pub fn schedule_checkin(
    conn: &Connection,
    patient_id: Uuid,
    checkin_type: CheckInType,
    date: NaiveDate,
) -> Result<CheckIn, CareError> {
    let checkin = CheckIn {
        id: Uuid::new_v4(),
        patient_id,
        checkin_type,
        scheduled_date: date,
        completed: false,
        completion_date: None,
        related_emotion_log_id: None,
    };
    db::insert_checkin(conn, &checkin)?;
    Ok(checkin)
}

/// Share of check-ins completed in the window, `None` when none were scheduled.
pub fn check_adherence(
    conn: &Connection,
    patient_id: &Uuid,
    days: i64,
    today: NaiveDate,
) -> Result<Option<f64>, CareError> {
    let checkins = db::get_checkins_in_window(conn, patient_id, days, today)?;
    if checkins.is_empty() {
        return Ok(None);
    }
    let completed = checkins.iter().filter(|c| c.completed).count();
    Ok(Some(completed as f64 / checkins.len() as f64))
}
