use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::RecommendationCategory;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub text: String,
    pub category: RecommendationCategory,
    pub is_ai_generated: bool,
    pub created_by: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub is_active: bool,
    pub patient_completed: bool,
    pub patient_helpful: Option<bool>,
}

impl Recommendation {
    pub fn new(patient_id: Uuid, text: &str, category: RecommendationCategory) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id,
            text: text.to_string(),
            category,
            is_ai_generated: false,
            created_by: None,
            created_at: chrono::Local::now().naive_local(),
            is_active: true,
            patient_completed: false,
            patient_helpful: None,
        }
    }
}
