use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which categories of patient data may be shared with whom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub patient_id: Uuid,
    pub can_share_with_doctor: bool,
    pub can_share_chat_with_doctor: bool,
    pub can_share_with_psychologist: bool,
    pub can_use_for_research: bool,
    pub consent_date: NaiveDateTime,
    pub last_updated: NaiveDateTime,
}

impl ConsentRecord {
    /// Defaults granted on first access: clinical and emotional data shared,
    /// chat transcripts and research use withheld.
    pub fn with_defaults(patient_id: Uuid) -> Self {
        let now = chrono::Local::now().naive_local();
        Self {
            patient_id,
            can_share_with_doctor: true,
            can_share_chat_with_doctor: false,
            can_share_with_psychologist: true,
            can_use_for_research: false,
            consent_date: now,
            last_updated: now,
        }
    }
}

/// Partial update of a consent record. `None` leaves a flag untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsentUpdate {
    pub can_share_with_doctor: Option<bool>,
    pub can_share_chat_with_doctor: Option<bool>,
    pub can_share_with_psychologist: Option<bool>,
    pub can_use_for_research: Option<bool>,
}
