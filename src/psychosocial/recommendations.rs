use rand::seq::SliceRandom;
use rand::Rng;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db;
use crate::error::CareError;
use crate::models::enums::{RecommendationCategory, Role};
use crate::models::{EmotionLog, Recommendation, User};

/// Number of recent logs the generator looks at.
pub const RECENT_LOG_WINDOW: usize = 7;

pub const LOW_MOOD_POOL: &[&str] = &[
    "Considera dar un paseo corto al aire libre. La naturaleza puede ayudar a mejorar el ánimo.",
    "Prueba escuchar música que te guste. La música puede tener un efecto positivo en el estado de ánimo.",
    "Conecta con un ser querido, aunque sea por mensaje. El apoyo social es invaluable.",
];

pub const HIGH_ANXIETY_POOL: &[&str] = &[
    "Intenta una técnica de respiración: inhala por 4, mantén por 4, exhala por 6.",
    "Prueba la meditación guiada. Hay apps gratuitas que pueden ayudarte.",
    "Escribe tus preocupaciones en un diario. A veces expresarlas ayuda a procesarlas.",
];

pub const LOW_ENERGY_POOL: &[&str] = &[
    "Asegúrate de estar hidratándote bien. La deshidratación puede causar fatiga.",
    "Intenta una siesta corta de 20 minutos. Puede ayudar a restaurar energía.",
    "Considera alimentos nutritivos y ligeros que te den energía sin pesadez.",
];

pub const GENERAL_POOL: &[&str] = &[
    "Mantén una rutina de sueño regular. Dormir bien es fundamental para el bienestar.",
    "Practica la gratitud: escribe 3 cosas por las que estés agradecida hoy.",
    "Haz algo pequeño que disfrutes cada día, aunque sea 10 minutos.",
];

struct Means {
    mood: f64,
    anxiety: f64,
    energy: f64,
}

type PoolRule = (fn(&Means) -> bool, RecommendationCategory, &'static [&'static str]);

const POOL_RULES: &[PoolRule] = &[
    (|m| m.mood <= 4.0, RecommendationCategory::Meditation, LOW_MOOD_POOL),
    (|m| m.anxiety >= 7.0, RecommendationCategory::Meditation, HIGH_ANXIETY_POOL),
    (|m| m.energy <= 4.0, RecommendationCategory::Exercise, LOW_ENERGY_POOL),
];

/// Category and text pool for a patient's recent logs.
pub fn select_pool(recent: &[EmotionLog]) -> (RecommendationCategory, &'static [&'static str]) {
    if recent.is_empty() {
        return (RecommendationCategory::Other, GENERAL_POOL);
    }
    let n = recent.len() as f64;
    let means = Means {
        mood: recent.iter().map(|l| f64::from(l.mood)).sum::<f64>() / n,
        anxiety: recent.iter().map(|l| f64::from(l.anxiety)).sum::<f64>() / n,
        energy: recent.iter().map(|l| f64::from(l.energy)).sum::<f64>() / n,
    };
    POOL_RULES
        .iter()
        .find(|(applies, _, _)| applies(&means))
        .map(|(_, category, pool)| (*category, *pool))
        .unwrap_or((RecommendationCategory::Other, GENERAL_POOL))
}

/// Generate and store a recommendation from the patient's recent logs.
pub fn generate_recommendation<R: Rng + ?Sized>(
    conn: &Connection,
    patient: &User,
    rng: &mut R,
) -> Result<Recommendation, CareError> {
    if !patient.is_patient() {
        return Err(CareError::role_required(Role::Patient, patient.role));
    }
    let recent = db::get_recent_emotion_logs(conn, &patient.id, RECENT_LOG_WINDOW)?;
    let (category, pool) = select_pool(&recent);
    let text = pool.choose(rng).copied().unwrap_or(GENERAL_POOL[0]);

    let mut rec = Recommendation::new(patient.id, text, category);
    rec.is_ai_generated = true;
    db::insert_recommendation(conn, &rec)?;

    tracing::info!(
        patient_id = %patient.id,
        category = category.as_str(),
        "Recommendation generated"
    );
    Ok(rec)
}

/// A psychologist's own recommendation for a patient.
pub fn add_manual_recommendation(
    conn: &Connection,
    author: &User,
    patient_id: Uuid,
    text: &str,
    category: RecommendationCategory,
) -> Result<Recommendation, CareError> {
    if !author.is_psychologist() {
        return Err(CareError::role_required(Role::Psychologist, author.role));
    }
    if text.trim().is_empty() {
        return Err(CareError::InvalidInput("recommendation text is empty".into()));
    }

    let mut rec = Recommendation::new(patient_id, text.trim(), category);
    rec.created_by = Some(author.id);
    db::insert_recommendation(conn, &rec)?;
    Ok(rec)
}

/// Patient feedback: done or not, and whether it helped.
pub fn record_recommendation_feedback(
    conn: &Connection,
    patient: &User,
    recommendation_id: &Uuid,
    completed: bool,
    helpful: Option<bool>,
) -> Result<Recommendation, CareError> {
    let not_found = || CareError::NotFound {
        entity: "recommendation",
        id: *recommendation_id,
    };
    let rec = db::get_recommendation(conn, recommendation_id)?.ok_or_else(not_found)?;
    if rec.patient_id != patient.id {
        return Err(not_found());
    }

    db::update_recommendation_feedback(conn, recommendation_id, completed, helpful)?;
    Ok(Recommendation {
        patient_completed: completed,
        patient_helpful: helpful,
        ..rec
    })
}

pub fn active_recommendations(conn: &Connection, patient_id: &Uuid) -> Result<Vec<Recommendation>, CareError> {
    Ok(db::get_active_recommendations(conn, patient_id)?)
}
