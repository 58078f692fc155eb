use std::sync::Arc;

use rusqlite::Connection;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::error::CareError;
use crate::models::enums::{AlertSeverity, AlertType, Role};
use crate::models::{Alert, ChatInteraction, EmotionLog, SymptomReport, User};
use crate::notify::{compose_alert_email, Mailer, OutgoingEmail};
use crate::triage::RiskTier;

pub const CHAT_REVIEW_ACTION: &str = "Revisar conversación y contactar al paciente";
pub const EMOTION_FOLLOW_UP_ACTION: &str = "Contactar al paciente para seguimiento psicológico.";

/// Delivers alert e-mails to the patient's assigned doctor.
#[derive(Clone)]
pub struct AlertNotifier {
    mailer: Arc<dyn Mailer>,
    from_address: String,
}

impl AlertNotifier {
    pub fn new(mailer: Arc<dyn Mailer>, from_address: &str) -> Self {
        Self {
            mailer,
            from_address: from_address.to_string(),
        }
    }

    pub fn from_address(&self) -> &str {
        &self.from_address
    }
}

impl std::fmt::Debug for AlertNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertNotifier")
            .field("from_address", &self.from_address)
            .finish_non_exhaustive()
    }
}

/// Raise a CHAT_RISK alert for an alerting tier. Lower tiers raise nothing.
pub fn raise_chat_alert(
    conn: &Connection,
    notifier: &AlertNotifier,
    patient: &User,
    interaction: &ChatInteraction,
    tier: RiskTier,
    suggested_action: Option<&str>,
) -> Result<Option<Alert>, CareError> {
    if !tier.is_alerting() {
        return Ok(None);
    }
    let Some(severity) = AlertSeverity::from_risk(tier) else {
        return Ok(None);
    };

    let mut alert = Alert::new(
        patient.id,
        AlertType::ChatRisk,
        severity,
        format!("Riesgo {tier} detectado en conversación con Lia"),
    )
    .with_action(suggested_action.unwrap_or(CHAT_REVIEW_ACTION));
    alert.related_chat_id = Some(interaction.id);
    db::insert_alert(conn, &alert)?;

    tracing::warn!(
        patient_id = %patient.id,
        alert_id = %alert.id,
        tier = %tier,
        "Chat risk alert created"
    );

    alert.email_sent = dispatch_alert_email(conn, notifier, &alert, patient);
    Ok(Some(alert))
}

/// Alert severity for a reported symptom intensity.
pub fn severity_for_intensity(intensity: i32) -> Option<AlertSeverity> {
    match intensity {
        i if i >= 9 => Some(AlertSeverity::Critical),
        i if i >= 8 => Some(AlertSeverity::High),
        _ => None,
    }
}

/// Raise a SYMPTOM_SEVERE alert when the intensity calls for one.
pub fn raise_symptom_alert(
    conn: &Connection,
    notifier: &AlertNotifier,
    patient: &User,
    symptom: &SymptomReport,
) -> Result<Option<Alert>, CareError> {
    let Some(severity) = severity_for_intensity(symptom.intensity) else {
        return Ok(None);
    };

    let label = symptom.symptom_type.label();
    let mut alert = Alert::new(
        patient.id,
        AlertType::SymptomSevere,
        severity,
        format!(
            "Síntoma severo reportado: {label} con intensidad {}/10",
            symptom.intensity
        ),
    )
    .with_action(format!("Evaluar al paciente inmediatamente. Síntoma: {label}"));
    alert.related_symptom_id = Some(symptom.id);
    db::insert_alert(conn, &alert)?;

    tracing::warn!(
        patient_id = %patient.id,
        alert_id = %alert.id,
        severity = severity.as_str(),
        "Symptom alert created"
    );

    alert.email_sent = dispatch_alert_email(conn, notifier, &alert, patient);
    Ok(Some(alert))
}

/// Raise an EMOTION_CRISIS alert for a log that needs attention. No e-mail.
pub fn raise_emotion_alert(conn: &Connection, log: &EmotionLog) -> Result<Option<Alert>, CareError> {
    if !log.needs_attention() {
        return Ok(None);
    }
    let severity = if log.mood <= 3 {
        AlertSeverity::Medium
    } else {
        AlertSeverity::Low
    };

    let alert = Alert::new(
        log.patient_id,
        AlertType::EmotionCrisis,
        severity,
        format!(
            "Estado emocional preocupante detectado. Ánimo: {}/10, Ansiedad: {}/10",
            log.mood, log.anxiety
        ),
    )
    .with_action(EMOTION_FOLLOW_UP_ACTION);
    db::insert_alert(conn, &alert)?;

    tracing::warn!(
        patient_id = %log.patient_id,
        alert_id = %alert.id,
        severity = severity.as_str(),
        "Emotional alert created"
    );
    Ok(Some(alert))
}

/// E-mail the patient's assigned doctor about `alert`.
///
/// Best effort: every failure is logged and reported as `false`, never
/// returned, and the stored alert is left in place. On success the alert
/// is flagged `email_sent`.
pub fn dispatch_alert_email(
    conn: &Connection,
    notifier: &AlertNotifier,
    alert: &Alert,
    patient: &User,
) -> bool {
    let doctor = match db::get_assigned_doctor(conn, &patient.id) {
        Ok(doctor) => doctor,
        Err(e) => {
            tracing::error!(alert_id = %alert.id, error = %e, "Cannot look up assigned doctor");
            return false;
        }
    };
    let Some(address) = doctor.and_then(|d| d.email).filter(|e| !e.trim().is_empty()) else {
        tracing::warn!(
            patient_id = %patient.id,
            alert_id = %alert.id,
            "No doctor assigned or no e-mail for patient"
        );
        return false;
    };

    let (subject, body) = compose_alert_email(alert, patient);
    let email = OutgoingEmail {
        from: notifier.from_address.clone(),
        to: vec![address],
        subject,
        body,
    };

    if let Err(e) = notifier.mailer.send(&email) {
        tracing::error!(alert_id = %alert.id, error = %e, "Error sending alert e-mail");
        return false;
    }
    if let Err(e) = db::mark_alert_email_sent(conn, &alert.id) {
        tracing::error!(alert_id = %alert.id, error = %e, "Alert e-mail sent but flag not stored");
        return false;
    }

    tracing::info!(alert_id = %alert.id, "Alert e-mail sent");
    true
}

/// Close an alert on behalf of a clinician.
pub fn resolve_alert(
    conn: &Connection,
    alert_id: &Uuid,
    resolver: &User,
    notes: Option<&str>,
) -> Result<Alert, CareError> {
    if resolver.role == Role::Patient {
        return Err(CareError::role_required(Role::Doctor, resolver.role));
    }

    let now = chrono::Local::now().naive_local();
    db::mark_alert_resolved(conn, alert_id, &resolver.id, notes, &now).map_err(|e| match e {
        DatabaseError::NotFound { .. } => CareError::NotFound {
            entity: "alert",
            id: *alert_id,
        },
        other => CareError::Database(other),
    })?;

    tracing::info!(alert_id = %alert_id, resolver_id = %resolver.id, "Alert resolved");

    db::get_alert(conn, alert_id)?.ok_or(CareError::NotFound {
        entity: "alert",
        id: *alert_id,
    })
}
