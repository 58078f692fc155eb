//! Read-only views for the three roles.
//!
//! Each builder checks the viewer's role and care assignment, then gathers
//! what the screen shows. Consent gates chat transcripts for doctors and
//! emotional data for psychologists.

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::db::{self, AlertCounts};
use crate::error::CareError;
use crate::models::enums::{AlertSeverity, CheckInType, Role};
use crate::models::{
    Alert, ChatInteraction, EmotionLog, Recommendation, SymptomReport, TimelineEvent, User,
};
use crate::psychosocial::{
    analyze_trend, authorize_access, average_scores, can_access_data, check_adherence, DataScope,
    EmotionAverages, EmotionTrend,
};

const RECENT_ALERTS_LIMIT: usize = 10;
const DETAIL_SYMPTOMS_LIMIT: usize = 20;
const DETAIL_TIMELINE_LIMIT: usize = 15;
const EMOTION_DETAIL_LOGS_LIMIT: usize = 30;
const EMOTION_DETAIL_RECOMMENDATIONS_LIMIT: usize = 10;
const PATIENT_RECENT_LIMIT: usize = 5;
const PATIENT_CHATS_LIMIT: usize = 3;
const PATIENT_RECOMMENDATIONS_LIMIT: usize = 3;

/// Days of recent history the weekly figures cover.
const WEEK: i64 = 7;
const MONTH: i64 = 30;
/// Days a severe symptom keeps the wellness light red.
const SEVERE_SYMPTOM_DAYS: i64 = 3;
const GREEN_WELLBEING: f64 = 6.0;

// ── Doctor ──

#[derive(Debug, Clone, Serialize)]
pub struct PatientAlertSummary {
    pub patient: User,
    pub active_alerts: i64,
    pub critical_alerts: i64,
    pub high_alerts: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorDashboard {
    pub patients: Vec<PatientAlertSummary>,
    pub recent_alerts: Vec<Alert>,
    pub total_patients: usize,
    pub patients_with_alerts: usize,
    pub critical_alerts: i64,
}

pub fn doctor_dashboard(conn: &Connection, doctor: &User) -> Result<DoctorDashboard, CareError> {
    if !doctor.is_doctor() {
        return Err(CareError::role_required(Role::Doctor, doctor.role));
    }

    let mut patients = Vec::new();
    for patient in db::list_patients_for_doctor(conn, &doctor.id)? {
        let AlertCounts { active, critical, high } = db::count_active_alerts(conn, &patient.id)?;
        patients.push(PatientAlertSummary {
            patient,
            active_alerts: active,
            critical_alerts: critical,
            high_alerts: high,
        });
    }
    patients.sort_by(|a, b| {
        b.critical_alerts
            .cmp(&a.critical_alerts)
            .then(b.high_alerts.cmp(&a.high_alerts))
    });

    let ids: Vec<Uuid> = patients.iter().map(|p| p.patient.id).collect();
    let recent_alerts = db::get_recent_unresolved_alerts(conn, &ids, RECENT_ALERTS_LIMIT)?;

    Ok(DoctorDashboard {
        total_patients: patients.len(),
        patients_with_alerts: patients.iter().filter(|p| p.active_alerts > 0).count(),
        critical_alerts: patients.iter().map(|p| p.critical_alerts).sum(),
        patients,
        recent_alerts,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorPatientDetail {
    pub patient: User,
    pub can_access_chat: bool,
    pub recent_symptoms: Vec<SymptomReport>,
    pub active_alerts: Vec<Alert>,
    pub timeline: Vec<TimelineEvent>,
    /// Mean intensity of the last week's reports, 0 when there are none.
    pub avg_symptom_intensity: f64,
}

pub fn doctor_patient_detail(
    conn: &Connection,
    doctor: &User,
    patient_id: &Uuid,
    today: NaiveDate,
) -> Result<DoctorPatientDetail, CareError> {
    if !doctor.is_doctor() {
        return Err(CareError::role_required(Role::Doctor, doctor.role));
    }
    let patient = assigned_patient(conn, patient_id, |p| p.assigned_doctor_id == Some(doctor.id))?;

    let week = db::get_symptoms_in_window(conn, patient_id, WEEK, today)?;
    let avg_symptom_intensity = if week.is_empty() {
        0.0
    } else {
        week.iter().map(|s| f64::from(s.intensity)).sum::<f64>() / week.len() as f64
    };

    let mut timeline = db::get_timeline_events(conn, patient_id)?;
    timeline.truncate(DETAIL_TIMELINE_LIMIT);

    Ok(DoctorPatientDetail {
        can_access_chat: can_access_data(conn, patient_id, doctor, DataScope::Chat)?,
        recent_symptoms: db::get_recent_symptoms(conn, patient_id, DETAIL_SYMPTOMS_LIMIT)?,
        active_alerts: db::get_active_alerts(conn, patient_id)?,
        timeline,
        avg_symptom_intensity,
        patient,
    })
}

/// A patient's chat transcript, for a doctor the patient allowed to read it.
pub fn doctor_chat_view(
    conn: &Connection,
    doctor: &User,
    patient_id: &Uuid,
    limit: usize,
) -> Result<Vec<ChatInteraction>, CareError> {
    if !doctor.is_doctor() {
        return Err(CareError::role_required(Role::Doctor, doctor.role));
    }
    assigned_patient(conn, patient_id, |p| p.assigned_doctor_id == Some(doctor.id))?;
    authorize_access(conn, patient_id, doctor, DataScope::Chat)?;
    Ok(db::get_recent_chat_interactions(conn, patient_id, limit)?)
}

// ── Psychologist ──

#[derive(Debug, Clone, Serialize)]
pub struct PatientEmotionSummary {
    pub patient: User,
    pub can_access: bool,
    /// Present only with consent and at least one log this week.
    pub averages: Option<EmotionAverages>,
    pub trend: Option<EmotionTrend>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PsychologistDashboard {
    pub patients: Vec<PatientEmotionSummary>,
    pub total_patients: usize,
    pub patients_with_access: usize,
    pub patients_declining: usize,
}

pub fn psychologist_dashboard(
    conn: &Connection,
    psychologist: &User,
    today: NaiveDate,
) -> Result<PsychologistDashboard, CareError> {
    if !psychologist.is_psychologist() {
        return Err(CareError::role_required(Role::Psychologist, psychologist.role));
    }

    let mut patients = Vec::new();
    for patient in db::list_patients_for_psychologist(conn, &psychologist.id)? {
        let summary = if can_access_data(conn, &patient.id, psychologist, DataScope::Emotional)? {
            PatientEmotionSummary {
                can_access: true,
                averages: average_scores(conn, &patient.id, WEEK, today)?,
                trend: Some(analyze_trend(conn, &patient.id, WEEK, today)?),
                patient,
            }
        } else {
            PatientEmotionSummary {
                patient,
                can_access: false,
                averages: None,
                trend: None,
            }
        };
        patients.push(summary);
    }

    Ok(PsychologistDashboard {
        total_patients: patients.len(),
        patients_with_access: patients.iter().filter(|p| p.can_access).count(),
        patients_declining: patients
            .iter()
            .filter(|p| p.trend == Some(EmotionTrend::Declining))
            .count(),
        patients,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct EmotionalDetail {
    pub patient: User,
    pub emotion_logs: Vec<EmotionLog>,
    pub trend_7_days: EmotionTrend,
    pub trend_30_days: EmotionTrend,
    pub recommendations: Vec<Recommendation>,
    pub adherence: Option<f64>,
}

pub fn psychologist_patient_detail(
    conn: &Connection,
    psychologist: &User,
    patient_id: &Uuid,
    today: NaiveDate,
) -> Result<EmotionalDetail, CareError> {
    if !psychologist.is_psychologist() {
        return Err(CareError::role_required(Role::Psychologist, psychologist.role));
    }
    let patient = assigned_patient(conn, patient_id, |p| {
        p.assigned_psychologist_id == Some(psychologist.id)
    })?;
    authorize_access(conn, patient_id, psychologist, DataScope::Emotional)?;

    Ok(EmotionalDetail {
        emotion_logs: db::get_recent_emotion_logs(conn, patient_id, EMOTION_DETAIL_LOGS_LIMIT)?,
        trend_7_days: analyze_trend(conn, patient_id, WEEK, today)?,
        trend_30_days: analyze_trend(conn, patient_id, MONTH, today)?,
        recommendations: db::get_recommendations_for_patient(
            conn,
            patient_id,
            EMOTION_DETAIL_RECOMMENDATIONS_LIMIT,
        )?,
        adherence: check_adherence(conn, patient_id, WEEK, today)?,
        patient,
    })
}

// ── Patient ──

/// Traffic-light summary shown to the patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WellnessStatus {
    Green,
    Yellow,
    Red,
}

impl WellnessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "GREEN",
            Self::Yellow => "YELLOW",
            Self::Red => "RED",
        }
    }
}

pub fn wellness_status(conn: &Connection, patient_id: &Uuid, today: NaiveDate) -> Result<WellnessStatus, CareError> {
    let urgent_alert = db::get_active_alerts(conn, patient_id)?
        .iter()
        .any(|a| a.severity.rank() >= AlertSeverity::High.rank());
    let severe_symptom = db::get_symptoms_in_window(conn, patient_id, SEVERE_SYMPTOM_DAYS, today)?
        .iter()
        .any(SymptomReport::is_severe);
    if urgent_alert || severe_symptom {
        return Ok(WellnessStatus::Red);
    }

    let latest = db::get_recent_emotion_logs(conn, patient_id, 1)?;
    Ok(match latest.first() {
        Some(log) if log.needs_attention() => WellnessStatus::Yellow,
        Some(log) if log.overall_wellbeing() >= GREEN_WELLBEING => WellnessStatus::Green,
        _ => WellnessStatus::Yellow,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientDashboard {
    pub wellness: WellnessStatus,
    pub recent_symptoms: Vec<SymptomReport>,
    pub recent_emotions: Vec<EmotionLog>,
    pub pending_recommendations: Vec<Recommendation>,
    pub recent_chats: Vec<ChatInteraction>,
    pub checkin_completed: bool,
}

pub fn patient_dashboard(conn: &Connection, patient: &User, today: NaiveDate) -> Result<PatientDashboard, CareError> {
    if !patient.is_patient() {
        return Err(CareError::role_required(Role::Patient, patient.role));
    }

    let pending_recommendations = db::get_active_recommendations(conn, &patient.id)?
        .into_iter()
        .filter(|r| !r.patient_completed)
        .take(PATIENT_RECOMMENDATIONS_LIMIT)
        .collect();
    let checkin_completed = db::get_checkins_in_window(conn, &patient.id, 0, today)?
        .iter()
        .any(|c| c.checkin_type == CheckInType::Daily && c.completed);

    Ok(PatientDashboard {
        wellness: wellness_status(conn, &patient.id, today)?,
        recent_symptoms: db::get_recent_symptoms(conn, &patient.id, PATIENT_RECENT_LIMIT)?,
        recent_emotions: db::get_recent_emotion_logs(conn, &patient.id, PATIENT_RECENT_LIMIT)?,
        pending_recommendations,
        recent_chats: db::get_recent_chat_interactions(conn, &patient.id, PATIENT_CHATS_LIMIT)?,
        checkin_completed,
    })
}

/// Load a patient the viewer is assigned to. Unassigned patients look
/// missing to the viewer.
fn assigned_patient(
    conn: &Connection,
    patient_id: &Uuid,
    is_assigned: impl Fn(&crate::models::Profile) -> bool,
) -> Result<User, CareError> {
    let not_found = || CareError::NotFound {
        entity: "patient",
        id: *patient_id,
    };
    let patient = db::get_user(conn, patient_id)?
        .filter(User::is_patient)
        .ok_or_else(not_found)?;
    match db::get_profile(conn, patient_id)? {
        Some(profile) if is_assigned(&profile) => Ok(patient),
        _ => Err(not_found()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::clinical::{raise_chat_alert, record_symptom, AlertNotifier};
    use crate::db::repository::parse_datetime;
    use crate::db::repository::test_support::*;
    use crate::models::enums::{ReportedVia, SymptomType};
    use crate::models::{ChatInteraction, ConsentUpdate, Profile};
    use crate::notify::MemoryMailer;
    use crate::psychosocial::{get_or_create_consent, record_emotion_log, schedule_checkin, update_consent};
    use crate::triage::RiskTier;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn notifier() -> AlertNotifier {
        AlertNotifier::new(Arc::new(MemoryMailer::new()), "lia@lia.test")
    }

    fn symptom_at(patient: &User, intensity: i32, at: &str) -> SymptomReport {
        SymptomReport {
            timestamp: parse_datetime(at),
            ..SymptomReport::new(patient.id, SymptomType::Pain, intensity, "dolor", ReportedVia::Form)
        }
    }

    fn log_at(patient: &User, mood: i32, anxiety: i32, energy: i32, at: &str) -> EmotionLog {
        EmotionLog {
            timestamp: parse_datetime(at),
            ..EmotionLog::new(patient.id, mood, anxiety, energy)
        }
    }

    fn chat_alert(conn: &Connection, patient: &User, tier: RiskTier) -> Alert {
        let interaction = ChatInteraction {
            id: Uuid::new_v4(),
            user_id: patient.id,
            message_text: "mensaje".into(),
            bot_response: "respuesta".into(),
            sentiment: crate::triage::Sentiment::Alert,
            risk_keywords: Vec::new(),
            emotion_scores: None,
            timestamp: chrono::Local::now().naive_local(),
        };
        db::insert_chat_interaction(conn, &interaction).unwrap();
        raise_chat_alert(conn, &notifier(), patient, &interaction, tier, None)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn doctor_dashboard_sorts_by_critical_then_high() {
        let conn = test_db();
        let (ana, doctor, _) = make_care_team(&conn);
        let eva = make_user(&conn, "eva", Role::Patient);
        let luz = make_user(&conn, "luz", Role::Patient);
        for p in [&eva, &luz] {
            db::upsert_profile(
                &conn,
                &Profile {
                    assigned_doctor_id: Some(doctor.id),
                    ..Profile::for_user(p.id)
                },
            )
            .unwrap();
        }
        chat_alert(&conn, &eva, RiskTier::High);
        chat_alert(&conn, &luz, RiskTier::Critical);
        chat_alert(&conn, &luz, RiskTier::High);

        let dash = doctor_dashboard(&conn, &doctor).unwrap();
        let order: Vec<_> = dash.patients.iter().map(|p| p.patient.id).collect();
        assert_eq!(order, vec![luz.id, eva.id, ana.id]);
        assert_eq!(dash.total_patients, 3);
        assert_eq!(dash.patients_with_alerts, 2);
        assert_eq!(dash.critical_alerts, 1);
        assert_eq!(dash.recent_alerts.len(), 3);
    }

    #[test]
    fn dashboards_check_roles() {
        let conn = test_db();
        let (patient, doctor, psychologist) = make_care_team(&conn);
        assert!(matches!(
            doctor_dashboard(&conn, &psychologist).unwrap_err(),
            CareError::RoleRequired { .. }
        ));
        assert!(matches!(
            psychologist_dashboard(&conn, &doctor, today()).unwrap_err(),
            CareError::RoleRequired { .. }
        ));
        assert!(matches!(
            patient_dashboard(&conn, &doctor, today()).unwrap_err(),
            CareError::RoleRequired { .. }
        ));
        assert!(patient_dashboard(&conn, &patient, today()).is_ok());
    }

    #[test]
    fn patient_detail_requires_assignment_and_gates_chat() {
        let conn = test_db();
        let (patient, doctor, _) = make_care_team(&conn);
        let other_doctor = make_user(&conn, "drgomez", Role::Doctor);
        get_or_create_consent(&conn, &patient.id).unwrap();

        let err = doctor_patient_detail(&conn, &other_doctor, &patient.id, today()).unwrap_err();
        assert!(matches!(err, CareError::NotFound { .. }));

        db::insert_symptom_report(&conn, &symptom_at(&patient, 4, "2025-03-09 10:00:00")).unwrap();
        db::insert_symptom_report(&conn, &symptom_at(&patient, 6, "2025-03-10 10:00:00")).unwrap();
        db::insert_symptom_report(&conn, &symptom_at(&patient, 10, "2025-02-01 10:00:00")).unwrap();

        let detail = doctor_patient_detail(&conn, &doctor, &patient.id, today()).unwrap();
        assert!(!detail.can_access_chat);
        assert_eq!(detail.recent_symptoms.len(), 3);
        assert!((detail.avg_symptom_intensity - 5.0).abs() < 1e-9);
        assert!(matches!(
            doctor_chat_view(&conn, &doctor, &patient.id, 10).unwrap_err(),
            CareError::AccessDenied { .. }
        ));

        let update = ConsentUpdate {
            can_share_chat_with_doctor: Some(true),
            ..ConsentUpdate::default()
        };
        update_consent(&conn, &patient, &update).unwrap();
        assert!(doctor_patient_detail(&conn, &doctor, &patient.id, today()).unwrap().can_access_chat);
        assert!(doctor_chat_view(&conn, &doctor, &patient.id, 10).unwrap().is_empty());
    }

    #[test]
    fn psychologist_dashboard_respects_consent() {
        let conn = test_db();
        let (ana, _, psychologist) = make_care_team(&conn);
        let eva = make_user(&conn, "eva", Role::Patient);
        db::upsert_profile(
            &conn,
            &Profile {
                assigned_psychologist_id: Some(psychologist.id),
                ..Profile::for_user(eva.id)
            },
        )
        .unwrap();
        get_or_create_consent(&conn, &ana.id).unwrap();

        db::insert_emotion_log(&conn, &log_at(&ana, 7, 3, 7, "2025-03-05 09:00:00")).unwrap();
        db::insert_emotion_log(&conn, &log_at(&ana, 3, 8, 3, "2025-03-09 09:00:00")).unwrap();
        db::insert_emotion_log(&conn, &log_at(&eva, 5, 5, 5, "2025-03-09 09:00:00")).unwrap();

        let dash = psychologist_dashboard(&conn, &psychologist, today()).unwrap();
        assert_eq!(dash.total_patients, 2);
        assert_eq!(dash.patients_with_access, 1);
        assert_eq!(dash.patients_declining, 1);

        let ana_row = dash.patients.iter().find(|p| p.patient.id == ana.id).unwrap();
        assert_eq!(ana_row.averages.unwrap().samples, 2);
        let eva_row = dash.patients.iter().find(|p| p.patient.id == eva.id).unwrap();
        assert!(!eva_row.can_access);
        assert!(eva_row.averages.is_none());

        assert!(matches!(
            psychologist_patient_detail(&conn, &psychologist, &eva.id, today()).unwrap_err(),
            CareError::AccessDenied { .. }
        ));
        let detail = psychologist_patient_detail(&conn, &psychologist, &ana.id, today()).unwrap();
        assert_eq!(detail.trend_7_days, EmotionTrend::Declining);
        assert_eq!(detail.emotion_logs.len(), 2);
        assert_eq!(detail.adherence, None);
    }

    #[test]
    fn wellness_lights() {
        let conn = test_db();
        let (patient, _, _) = make_care_team(&conn);
        assert_eq!(wellness_status(&conn, &patient.id, today()).unwrap(), WellnessStatus::Yellow);

        db::insert_emotion_log(&conn, &log_at(&patient, 8, 2, 7, "2025-03-09 09:00:00")).unwrap();
        assert_eq!(wellness_status(&conn, &patient.id, today()).unwrap(), WellnessStatus::Green);

        db::insert_emotion_log(&conn, &log_at(&patient, 2, 5, 5, "2025-03-10 09:00:00")).unwrap();
        assert_eq!(wellness_status(&conn, &patient.id, today()).unwrap(), WellnessStatus::Yellow);

        // severe report older than three days no longer counts
        db::insert_symptom_report(&conn, &symptom_at(&patient, 9, "2025-03-06 09:00:00")).unwrap();
        assert_eq!(wellness_status(&conn, &patient.id, today()).unwrap(), WellnessStatus::Yellow);
        db::insert_symptom_report(&conn, &symptom_at(&patient, 8, "2025-03-08 09:00:00")).unwrap();
        assert_eq!(wellness_status(&conn, &patient.id, today()).unwrap(), WellnessStatus::Red);
    }

    #[test]
    fn severe_symptom_three_days_back_still_counts() {
        let conn = test_db();
        let (patient, _, _) = make_care_team(&conn);
        db::insert_emotion_log(&conn, &log_at(&patient, 8, 2, 7, "2025-03-09 09:00:00")).unwrap();
        db::insert_symptom_report(&conn, &symptom_at(&patient, 9, "2025-03-07 00:00:00")).unwrap();
        assert_eq!(wellness_status(&conn, &patient.id, today()).unwrap(), WellnessStatus::Red);
    }

    #[test]
    fn weekly_intensity_includes_day_seven() {
        let conn = test_db();
        let (patient, doctor, _) = make_care_team(&conn);
        db::insert_symptom_report(&conn, &symptom_at(&patient, 2, "2025-03-03 08:00:00")).unwrap();
        db::insert_symptom_report(&conn, &symptom_at(&patient, 6, "2025-03-10 08:00:00")).unwrap();
        db::insert_symptom_report(&conn, &symptom_at(&patient, 10, "2025-03-02 23:59:00")).unwrap();

        let detail = doctor_patient_detail(&conn, &doctor, &patient.id, today()).unwrap();
        assert!((detail.avg_symptom_intensity - 4.0).abs() < 1e-9);
    }

    #[test]
    fn urgent_alert_turns_light_red() {
        let conn = test_db();
        let (patient, _, _) = make_care_team(&conn);
        db::insert_emotion_log(&conn, &log_at(&patient, 8, 2, 7, "2025-03-09 09:00:00")).unwrap();
        let report = SymptomReport::new(patient.id, SymptomType::Fever, 5, "fiebre", ReportedVia::Form);
        record_symptom(&conn, &notifier(), &patient, report).unwrap();
        assert_eq!(wellness_status(&conn, &patient.id, today()).unwrap(), WellnessStatus::Green);

        chat_alert(&conn, &patient, RiskTier::High);
        assert_eq!(wellness_status(&conn, &patient.id, today()).unwrap(), WellnessStatus::Red);
    }

    #[test]
    fn patient_dashboard_reports_todays_checkin() {
        let conn = test_db();
        let (patient, _, _) = make_care_team(&conn);
        let yesterday = today().pred_opt().unwrap();
        schedule_checkin(&conn, patient.id, CheckInType::Daily, yesterday).unwrap();
        record_emotion_log(&conn, &patient, log_at(&patient, 6, 4, 6, "2025-03-09 18:00:00")).unwrap();
        schedule_checkin(&conn, patient.id, CheckInType::Daily, today()).unwrap();
        // yesterday's completed check-in does not count for today
        assert!(!patient_dashboard(&conn, &patient, today()).unwrap().checkin_completed);

        record_emotion_log(&conn, &patient, log_at(&patient, 6, 4, 6, "2025-03-10 18:00:00")).unwrap();
        let dash = patient_dashboard(&conn, &patient, today()).unwrap();
        assert!(dash.checkin_completed);
        assert_eq!(dash.recent_emotions.len(), 2);
    }
}
