use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::TimelineEventType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub event_type: TimelineEventType,
    pub description: String,
    pub event_date: NaiveDate,
    pub created_by: Option<Uuid>,
    pub created_at: NaiveDateTime,
}
