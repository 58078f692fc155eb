use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AlertSeverity, AlertType};

/// A flag raised for the clinical team about one patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub suggested_action: Option<String>,
    pub is_resolved: bool,
    pub created_at: NaiveDateTime,
    pub resolved_at: Option<NaiveDateTime>,
    pub resolved_by: Option<Uuid>,
    pub resolution_notes: Option<String>,
    pub related_symptom_id: Option<Uuid>,
    pub related_chat_id: Option<Uuid>,
    pub email_sent: bool,
}

impl Alert {
    pub fn new(
        patient_id: Uuid,
        alert_type: AlertType,
        severity: AlertSeverity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id,
            alert_type,
            severity,
            message: message.into(),
            suggested_action: None,
            is_resolved: false,
            created_at: chrono::Local::now().naive_local(),
            resolved_at: None,
            resolved_by: None,
            resolution_notes: None,
            related_symptom_id: None,
            related_chat_id: None,
            email_sent: false,
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.suggested_action = Some(action.into());
        self
    }

    pub fn is_urgent(&self) -> bool {
        matches!(self.severity, AlertSeverity::High | AlertSeverity::Critical)
    }
}
