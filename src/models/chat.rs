use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::triage::{ClassificationResult, Sentiment};

/// One patient message and the agent's reply, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatInteraction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message_text: String,
    pub bot_response: String,
    pub sentiment: Sentiment,
    /// Ids of the lexicon entries that fired.
    pub risk_keywords: Vec<String>,
    /// Per-emotion scores from an external analyzer. The rule engine
    /// leaves it empty.
    pub emotion_scores: Option<serde_json::Value>,
    pub timestamp: NaiveDateTime,
}

impl ChatInteraction {
    pub fn from_classification(user_id: Uuid, message: &str, result: &ClassificationResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            message_text: message.to_string(),
            bot_response: result.response_text.clone(),
            sentiment: result.sentiment,
            risk_keywords: result.matched_patterns.clone(),
            emotion_scores: None,
            timestamp: chrono::Local::now().naive_local(),
        }
    }
}

/// A recorded audio message from a patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceMemo {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Location of the stored audio file.
    pub audio_path: String,
    /// Empty until a transcription is attached.
    pub transcription: String,
    pub duration_seconds: Option<i32>,
    pub created_at: NaiveDateTime,
}

impl VoiceMemo {
    pub fn new(user_id: Uuid, audio_path: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            audio_path: audio_path.to_string(),
            transcription: String::new(),
            duration_seconds: None,
            created_at: chrono::Local::now().naive_local(),
        }
    }

    pub fn is_transcribed(&self) -> bool {
        !self.transcription.trim().is_empty()
    }
}
