use thiserror::Error;
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::Role;
use crate::triage::ClassificationResult;

/// Errors surfaced by the care services.
#[derive(Error, Debug)]
pub enum CareError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Operation requires role {required}, user has {actual}")]
    RoleRequired { required: &'static str, actual: &'static str },

    #[error("Access to {scope} data of patient {patient_id} denied")]
    AccessDenied { patient_id: Uuid, scope: &'static str },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    /// The message was classified but the interaction could not be stored.
    /// The classification is kept so the reply can still be shown.
    #[error("Chat interaction could not be stored: {source}")]
    ChatPersistence {
        classification: Box<ClassificationResult>,
        #[source]
        source: DatabaseError,
    },
}

impl CareError {
    pub fn role_required(required: Role, actual: Role) -> Self {
        Self::RoleRequired {
            required: required.as_str(),
            actual: actual.as_str(),
        }
    }
}
