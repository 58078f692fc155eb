use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Role;
use crate::triage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub is_verified: bool,
    pub created_at: NaiveDateTime,
}

impl User {
    pub fn new(username: &str, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            first_name: None,
            last_name: None,
            email: None,
            phone: None,
            role,
            is_verified: false,
            created_at: chrono::Local::now().naive_local(),
        }
    }

    pub fn is_patient(&self) -> bool {
        self.role == Role::Patient
    }

    pub fn is_doctor(&self) -> bool {
        self.role == Role::Doctor
    }

    pub fn is_psychologist(&self) -> bool {
        self.role == Role::Psychologist
    }

    /// Name the chat agent addresses the user by.
    pub fn display_name(&self) -> String {
        triage::resolve_display_name(self.first_name.as_deref(), Some(&self.username))
    }

    /// "First Last" when any part is set, otherwise the username.
    pub fn full_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            self.username.clone()
        } else {
            parts.join(" ")
        }
    }
}

/// Extended profile. For patients it names the assigned care team.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: Uuid,
    pub birth_date: Option<NaiveDate>,
    pub medical_record_number: Option<String>,
    pub assigned_doctor_id: Option<Uuid>,
    pub assigned_psychologist_id: Option<Uuid>,
    pub bio: Option<String>,
}

impl Profile {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }

    /// Age in whole years on `today`.
    pub fn age_on(&self, today: NaiveDate) -> Option<i32> {
        let birth = self.birth_date?;
        let mut age = today.year() - birth.year();
        if (today.month(), today.day()) < (birth.month(), birth.day()) {
            age -= 1;
        }
        Some(age)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_first_name() {
        let mut user = User::new("lucia88", Role::Patient);
        assert_eq!(user.display_name(), "lucia88");
        user.first_name = Some("Lucía".into());
        assert_eq!(user.display_name(), "Lucía");
    }

    #[test]
    fn full_name_falls_back_to_username() {
        let mut user = User::new("drperez", Role::Doctor);
        assert_eq!(user.full_name(), "drperez");
        user.first_name = Some("Marta".into());
        user.last_name = Some("Pérez".into());
        assert_eq!(user.full_name(), "Marta Pérez");
    }

    #[test]
    fn age_counts_birthday() {
        let profile = Profile {
            birth_date: NaiveDate::from_ymd_opt(1990, 6, 15),
            ..Profile::for_user(Uuid::new_v4())
        };
        let before = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
        let on = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        assert_eq!(profile.age_on(before), Some(34));
        assert_eq!(profile.age_on(on), Some(35));
        assert_eq!(Profile::for_user(Uuid::new_v4()).age_on(on), None);
    }
}
