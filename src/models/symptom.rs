use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{ReportedVia, SymptomType};

/// Intensity at or above which a symptom counts as severe.
pub const SEVERE_INTENSITY: i32 = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomReport {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub symptom_type: SymptomType,
    /// 1-10
    pub intensity: i32,
    pub description: String,
    pub location: Option<String>,
    pub reported_via: ReportedVia,
    pub timestamp: NaiveDateTime,
    pub related_chat_id: Option<Uuid>,
    pub doctor_notes: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<NaiveDateTime>,
}

impl SymptomReport {
    pub fn new(
        patient_id: Uuid,
        symptom_type: SymptomType,
        intensity: i32,
        description: &str,
        reported_via: ReportedVia,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id,
            symptom_type,
            intensity,
            description: description.to_string(),
            location: None,
            reported_via,
            timestamp: chrono::Local::now().naive_local(),
            related_chat_id: None,
            doctor_notes: None,
            reviewed_by: None,
            reviewed_at: None,
        }
    }

    pub fn is_severe(&self) -> bool {
        self.intensity >= SEVERE_INTENSITY
    }

    pub fn is_reviewed(&self) -> bool {
        self.reviewed_at.is_some()
    }
}
