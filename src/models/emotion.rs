use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::CheckInType;

/// Self-reported emotional state. All scales run 1-10.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionLog {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub mood: i32,
    pub anxiety: i32,
    pub energy: i32,
    pub pain_emotional_impact: Option<i32>,
    pub notes: Option<String>,
    pub timestamp: NaiveDateTime,
}

impl EmotionLog {
    pub fn new(patient_id: Uuid, mood: i32, anxiety: i32, energy: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id,
            mood,
            anxiety,
            energy,
            pain_emotional_impact: None,
            notes: None,
            timestamp: chrono::Local::now().naive_local(),
        }
    }

    /// Mean of mood, energy and inverted anxiety.
    pub fn overall_wellbeing(&self) -> f64 {
        f64::from(self.mood + self.energy + (11 - self.anxiety)) / 3.0
    }

    pub fn needs_attention(&self) -> bool {
        self.mood <= 3 || self.anxiety >= 8 || self.energy <= 2
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub checkin_type: CheckInType,
    pub scheduled_date: NaiveDate,
    pub completed: bool,
    pub completion_date: Option<NaiveDateTime>,
    pub related_emotion_log_id: Option<Uuid>,
}
