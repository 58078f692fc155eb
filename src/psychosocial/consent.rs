//! Patient data-sharing consent.
//!
//! Access cascade, checked in order, default deny:
//! 1. Patient reading their own data → granted
//! 2. No consent record → denied
//! 3. Doctor: clinical data per `can_share_with_doctor`, chat transcripts per
//!    `can_share_chat_with_doctor`
//! 4. Psychologist: emotional data per `can_share_with_psychologist`
//! 5. Anything else → denied
//!
//! Every decision taken through `authorize_access` lands in `audit_log`.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db;
use crate::error::CareError;
use crate::models::enums::Role;
use crate::models::{ConsentRecord, ConsentUpdate, User};

/// Category of patient data a requester asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataScope {
    Clinical,
    Chat,
    Emotional,
}

impl DataScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Clinical => "CLINICAL",
            Self::Chat => "CHAT",
            Self::Emotional => "EMOTIONAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessReason {
    OwnData,
    Consented,
    NoConsentRecord,
    NotConsented,
    OutOfRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: AccessReason,
}

impl AccessDecision {
    fn allow(reason: AccessReason) -> Self {
        Self { allowed: true, reason }
    }

    fn deny(reason: AccessReason) -> Self {
        Self { allowed: false, reason }
    }
}

/// The patient's consent record, created with defaults on first access.
pub fn get_or_create_consent(conn: &Connection, patient_id: &Uuid) -> Result<ConsentRecord, CareError> {
    if let Some(record) = db::get_consent(conn, patient_id)? {
        return Ok(record);
    }
    let record = ConsentRecord::with_defaults(*patient_id);
    db::upsert_consent(conn, &record)?;
    tracing::debug!(patient_id = %patient_id, "Default consent created");
    Ok(record)
}

/// Apply a partial update. Only the patient may change their own consent.
pub fn update_consent(conn: &Connection, patient: &User, update: &ConsentUpdate) -> Result<ConsentRecord, CareError> {
    if !patient.is_patient() {
        return Err(CareError::role_required(Role::Patient, patient.role));
    }
    let mut record = get_or_create_consent(conn, &patient.id)?;

    if let Some(v) = update.can_share_with_doctor {
        record.can_share_with_doctor = v;
    }
    if let Some(v) = update.can_share_chat_with_doctor {
        record.can_share_chat_with_doctor = v;
    }
    if let Some(v) = update.can_share_with_psychologist {
        record.can_share_with_psychologist = v;
    }
    if let Some(v) = update.can_use_for_research {
        record.can_use_for_research = v;
    }
    record.last_updated = chrono::Local::now().naive_local();

    db::upsert_consent(conn, &record)?;
    tracing::info!(patient_id = %patient.id, "Consent updated");
    Ok(record)
}

/// Decide access without recording it.
pub fn check_access(
    conn: &Connection,
    patient_id: &Uuid,
    requester: &User,
    scope: DataScope,
) -> Result<AccessDecision, CareError> {
    if requester.id == *patient_id {
        return Ok(AccessDecision::allow(AccessReason::OwnData));
    }
    let Some(consent) = db::get_consent(conn, patient_id)? else {
        return Ok(AccessDecision::deny(AccessReason::NoConsentRecord));
    };

    let flag = match (requester.role, scope) {
        (Role::Doctor, DataScope::Clinical) => consent.can_share_with_doctor,
        (Role::Doctor, DataScope::Chat) => consent.can_share_chat_with_doctor,
        (Role::Psychologist, DataScope::Emotional) => consent.can_share_with_psychologist,
        _ => return Ok(AccessDecision::deny(AccessReason::OutOfRole)),
    };
    Ok(if flag {
        AccessDecision::allow(AccessReason::Consented)
    } else {
        AccessDecision::deny(AccessReason::NotConsented)
    })
}

pub fn can_access_data(
    conn: &Connection,
    patient_id: &Uuid,
    requester: &User,
    scope: DataScope,
) -> Result<bool, CareError> {
    Ok(check_access(conn, patient_id, requester, scope)?.allowed)
}

/// Decide access, audit the decision and fail with `AccessDenied` on refusal.
pub fn authorize_access(
    conn: &Connection,
    patient_id: &Uuid,
    requester: &User,
    scope: DataScope,
) -> Result<(), CareError> {
    let decision = check_access(conn, patient_id, requester, scope)?;
    db::insert_audit_entry(conn, patient_id, &requester.id, scope.as_str(), decision.allowed)?;

    if decision.allowed {
        return Ok(());
    }
    tracing::warn!(
        patient_id = %patient_id,
        requester_id = %requester.id,
        scope = scope.as_str(),
        reason = ?decision.reason,
        "Data access denied"
    );
    Err(CareError::AccessDenied {
        patient_id: *patient_id,
        scope: scope.as_str(),
    })
}
