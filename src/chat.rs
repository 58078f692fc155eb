//! Patient chat with Lia.
//!
//! One call per inbound message: classify, store the interaction, then
//! raise the follow-up records the classification calls for.

use rand::Rng;
use rusqlite::Connection;
use serde::Serialize;

use crate::clinical::{raise_chat_alert, record_symptom_from_chat, AlertNotifier};
use crate::db;
use crate::error::CareError;
use crate::models::enums::Role;
use crate::models::{Alert, ChatInteraction, SymptomReport, User, VoiceMemo};
use crate::triage::{normalize, ClassificationResult, TriageEngine};

/// Everything produced while handling one message.
#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    pub interaction: ChatInteraction,
    pub classification: ClassificationResult,
    pub alert: Option<Alert>,
    pub symptom: Option<SymptomReport>,
}

impl ChatOutcome {
    pub fn response_text(&self) -> &str {
        &self.classification.response_text
    }
}

pub fn handle_message(
    conn: &Connection,
    engine: &TriageEngine,
    notifier: &AlertNotifier,
    patient: &User,
    raw_message: &str,
) -> Result<ChatOutcome, CareError> {
    handle_message_with_rng(conn, engine, notifier, patient, raw_message, &mut rand::thread_rng())
}

/// `handle_message` with an explicit randomness source for the reply.
pub fn handle_message_with_rng<R: Rng + ?Sized>(
    conn: &Connection,
    engine: &TriageEngine,
    notifier: &AlertNotifier,
    patient: &User,
    raw_message: &str,
    rng: &mut R,
) -> Result<ChatOutcome, CareError> {
    if !patient.is_patient() {
        return Err(CareError::role_required(Role::Patient, patient.role));
    }
    let message = raw_message.trim();
    if message.is_empty() {
        return Err(CareError::EmptyMessage);
    }

    let classification = engine.classify_with_rng(message, &patient.display_name(), rng);

    match persist_outcome(conn, engine, notifier, patient, message, &classification) {
        Ok((interaction, alert, symptom)) => {
            tracing::info!(
                patient_id = %patient.id,
                tier = %classification.risk_tier,
                alert = alert.is_some(),
                symptom = symptom.is_some(),
                "Chat interaction saved"
            );
            Ok(ChatOutcome {
                interaction,
                classification,
                alert,
                symptom,
            })
        }
        Err(CareError::Database(source)) => {
            tracing::error!(patient_id = %patient.id, error = %source, "Error storing chat interaction");
            Err(CareError::ChatPersistence {
                classification: Box::new(classification),
                source,
            })
        }
        Err(other) => Err(other),
    }
}

fn persist_outcome(
    conn: &Connection,
    engine: &TriageEngine,
    notifier: &AlertNotifier,
    patient: &User,
    message: &str,
    classification: &ClassificationResult,
) -> Result<(ChatInteraction, Option<Alert>, Option<SymptomReport>), CareError> {
    let interaction = ChatInteraction::from_classification(patient.id, message, classification);
    db::insert_chat_interaction(conn, &interaction)?;

    let alert = raise_chat_alert(
        conn,
        notifier,
        patient,
        &interaction,
        classification.risk_tier,
        classification.suggested_action.as_deref(),
    )?;

    let symptom = if engine.pain_cues().mentions_pain(&normalize(message)) {
        let (report, _) = record_symptom_from_chat(conn, notifier, patient, message, interaction.id)?;
        Some(report)
    } else {
        None
    };

    Ok((interaction, alert, symptom))
}

/// A patient's most recent interactions, newest first.
pub fn chat_history(conn: &Connection, patient: &User, limit: usize) -> Result<Vec<ChatInteraction>, CareError> {
    Ok(db::get_recent_chat_interactions(conn, &patient.id, limit)?)
}

/// Store a patient's voice memo. The audio itself lives outside the database;
/// only its path, an optional transcription and the duration are kept.
pub fn record_voice_memo(
    conn: &Connection,
    patient: &User,
    audio_path: &str,
    transcription: Option<&str>,
    duration_seconds: Option<i32>,
) -> Result<VoiceMemo, CareError> {
    if patient.role != Role::Patient {
        return Err(CareError::role_required(Role::Patient, patient.role));
    }
    let audio_path = audio_path.trim();
    if audio_path.is_empty() {
        return Err(CareError::InvalidInput("audio path is empty".into()));
    }
    if duration_seconds.is_some_and(|d| d < 0) {
        return Err(CareError::InvalidInput("duration cannot be negative".into()));
    }

    let memo = VoiceMemo {
        transcription: transcription.map(str::trim).unwrap_or_default().to_string(),
        duration_seconds,
        ..VoiceMemo::new(patient.id, audio_path)
    };
    db::insert_voice_memo(conn, &memo)?;

    tracing::info!(
        patient_id = %patient.id,
        memo_id = %memo.id,
        transcribed = memo.is_transcribed(),
        "Voice memo stored"
    );
    Ok(memo)
}

/// A patient's voice memos, newest first.
pub fn voice_memos(conn: &Connection, patient: &User, limit: usize) -> Result<Vec<VoiceMemo>, CareError> {
    Ok(db::get_voice_memos(conn, &patient.id, limit)?)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::db::repository::test_support::*;
    use crate::models::enums::{AlertSeverity, AlertType, SymptomType};
    use crate::notify::MemoryMailer;
    use crate::triage::{RiskTier, Sentiment};

    fn send(conn: &Connection, mailer: Arc<MemoryMailer>, patient: &User, text: &str) -> Result<ChatOutcome, CareError> {
        let notifier = AlertNotifier::new(mailer, "lia@lia.test");
        handle_message_with_rng(
            conn,
            TriageEngine::shared(),
            &notifier,
            patient,
            text,
            &mut StdRng::seed_from_u64(3),
        )
    }

    #[test]
    fn crisis_message_alerts_and_emails() {
        let conn = test_db();
        let (patient, _, _) = make_care_team(&conn);
        let mailer = Arc::new(MemoryMailer::new());

        let outcome = send(&conn, mailer.clone(), &patient, "Creo que quiero morir").unwrap();
        assert_eq!(outcome.classification.risk_tier, RiskTier::Critical);
        assert_eq!(outcome.interaction.sentiment, Sentiment::Alert);

        let alert = outcome.alert.unwrap();
        assert_eq!(alert.alert_type, AlertType::ChatRisk);
        assert_eq!(alert.severity, AlertSeverity::Critical);
        assert_eq!(alert.related_chat_id, Some(outcome.interaction.id));
        assert_eq!(mailer.sent().len(), 1);
        assert!(outcome.symptom.is_none());
    }

    #[test]
    fn pain_message_records_symptom() {
        let conn = test_db();
        let (patient, _, _) = make_care_team(&conn);

        let outcome = send(&conn, Arc::new(MemoryMailer::new()), &patient, "Tengo mucho dolor, como un 9").unwrap();
        assert!(outcome.classification.risk_tier <= RiskTier::Low);

        let symptom = outcome.symptom.unwrap();
        assert_eq!(symptom.symptom_type, SymptomType::Pain);
        assert_eq!(symptom.intensity, 9);
        assert_eq!(symptom.related_chat_id, Some(outcome.interaction.id));

        // the severe symptom raised its own alert
        let alerts = db::get_active_alerts(&conn, &patient.id).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::SymptomSevere);
    }

    #[test]
    fn greeting_is_stored_without_followups() {
        let conn = test_db();
        let (patient, _, _) = make_care_team(&conn);

        let outcome = send(&conn, Arc::new(MemoryMailer::new()), &patient, "  Hola Lia  ").unwrap();
        assert!(outcome.alert.is_none());
        assert!(outcome.symptom.is_none());
        assert_eq!(outcome.interaction.message_text, "Hola Lia");
        assert!(outcome.response_text().contains("ana"));

        let history = chat_history(&conn, &patient, 10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, outcome.interaction.id);
    }

    #[test]
    fn empty_message_rejected_before_classification() {
        let conn = test_db();
        let (patient, _, _) = make_care_team(&conn);
        let err = send(&conn, Arc::new(MemoryMailer::new()), &patient, "   ").unwrap_err();
        assert!(matches!(err, CareError::EmptyMessage));
        assert!(chat_history(&conn, &patient, 10).unwrap().is_empty());
    }

    #[test]
    fn clinicians_cannot_chat() {
        let conn = test_db();
        let (_, doctor, _) = make_care_team(&conn);
        let err = send(&conn, Arc::new(MemoryMailer::new()), &doctor, "hola").unwrap_err();
        assert!(matches!(err, CareError::RoleRequired { .. }));
    }

    #[test]
    fn storage_failure_keeps_classification() {
        let conn = test_db();
        let (patient, _, _) = make_care_team(&conn);
        conn.execute_batch("DROP TABLE alerts; DROP TABLE symptom_reports; DROP TABLE chat_interactions;")
            .unwrap();

        let err = send(&conn, Arc::new(MemoryMailer::new()), &patient, "quiero morir").unwrap_err();
        match err {
            CareError::ChatPersistence { classification, .. } => {
                assert_eq!(classification.risk_tier, RiskTier::Critical);
                assert!(!classification.response_text.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn voice_memo_stored_with_transcription() {
        let conn = test_db();
        let (patient, _, _) = make_care_team(&conn);

        let memo = record_voice_memo(
            &conn,
            &patient,
            " voice_memos/2025/03/10/nota.webm ",
            Some("  Hoy dormí mejor  "),
            Some(35),
        )
        .unwrap();
        assert_eq!(memo.audio_path, "voice_memos/2025/03/10/nota.webm");
        assert_eq!(memo.transcription, "Hoy dormí mejor");
        assert!(memo.is_transcribed());

        let untranscribed = record_voice_memo(&conn, &patient, "otra.webm", None, None).unwrap();
        assert!(!untranscribed.is_transcribed());

        let stored = voice_memos(&conn, &patient, 10).unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().any(|m| m.id == memo.id && m.duration_seconds == Some(35)));
    }

    #[test]
    fn voice_memo_rejects_bad_input() {
        let conn = test_db();
        let (patient, doctor, _) = make_care_team(&conn);

        let err = record_voice_memo(&conn, &doctor, "nota.webm", None, None).unwrap_err();
        assert!(matches!(err, CareError::RoleRequired { .. }));

        let err = record_voice_memo(&conn, &patient, "   ", Some("hola"), None).unwrap_err();
        assert!(matches!(err, CareError::InvalidInput(_)));

        let err = record_voice_memo(&conn, &patient, "nota.webm", None, Some(-3)).unwrap_err();
        assert!(matches!(err, CareError::InvalidInput(_)));

        assert!(voice_memos(&conn, &patient, 10).unwrap().is_empty());
    }
}
