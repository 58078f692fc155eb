use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{fmt_datetime, optional, parse_date, parse_datetime, parse_opt_uuid, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::Role;
use crate::models::{Profile, User};

const USER_COLUMNS: &str =
    "id, username, first_name, last_name, email, phone, role, is_verified, created_at";

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, username, first_name, last_name, email, phone, role, is_verified, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            user.id.to_string(),
            user.username,
            user.first_name,
            user.last_name,
            user.email,
            user.phone,
            user.role.as_str(),
            user.is_verified as i32,
            fmt_datetime(&user.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    let row = optional(conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id.to_string()],
        read_user_row,
    ))?;
    row.map(user_from_row).transpose()
}

pub fn get_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>, DatabaseError> {
    let row = optional(conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
        params![username],
        read_user_row,
    ))?;
    row.map(user_from_row).transpose()
}

/// Like `get_user` but a missing row is an error.
pub fn require_user(conn: &Connection, id: &Uuid) -> Result<User, DatabaseError> {
    get_user(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "user".into(),
        id: id.to_string(),
    })
}

pub fn list_users_by_role(conn: &Connection, role: Role) -> Result<Vec<User>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE role = ?1 ORDER BY username"
    ))?;
    let rows = stmt.query_map(params![role.as_str()], read_user_row)?;
    let mut users = Vec::new();
    for row in rows {
        users.push(user_from_row(row?)?);
    }
    Ok(users)
}

/// Insert or replace the profile of `profile.user_id`.
pub fn upsert_profile(conn: &Connection, profile: &Profile) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO profiles (user_id, birth_date, medical_record_number, assigned_doctor_id,
         assigned_psychologist_id, bio)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(user_id) DO UPDATE SET
           birth_date = excluded.birth_date,
           medical_record_number = excluded.medical_record_number,
           assigned_doctor_id = excluded.assigned_doctor_id,
           assigned_psychologist_id = excluded.assigned_psychologist_id,
           bio = excluded.bio",
        params![
            profile.user_id.to_string(),
            profile.birth_date.map(|d| d.to_string()),
            profile.medical_record_number,
            profile.assigned_doctor_id.map(|id| id.to_string()),
            profile.assigned_psychologist_id.map(|id| id.to_string()),
            profile.bio,
        ],
    )?;
    Ok(())
}

pub fn get_profile(conn: &Connection, user_id: &Uuid) -> Result<Option<Profile>, DatabaseError> {
    let row = optional(conn.query_row(
        "SELECT user_id, birth_date, medical_record_number, assigned_doctor_id,
                assigned_psychologist_id, bio
         FROM profiles WHERE user_id = ?1",
        params![user_id.to_string()],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        },
    ))?;

    row.map(|(user_id, birth_date, mrn, doctor, psychologist, bio)| {
        Ok(Profile {
            user_id: parse_uuid(&user_id)?,
            birth_date: birth_date.map(|d| parse_date(&d)),
            medical_record_number: mrn,
            assigned_doctor_id: parse_opt_uuid(doctor),
            assigned_psychologist_id: parse_opt_uuid(psychologist),
            bio,
        })
    })
    .transpose()
}

/// The doctor assigned to a patient, if any.
pub fn get_assigned_doctor(conn: &Connection, patient_id: &Uuid) -> Result<Option<User>, DatabaseError> {
    match get_profile(conn, patient_id)?.and_then(|p| p.assigned_doctor_id) {
        Some(doctor_id) => get_user(conn, &doctor_id),
        None => Ok(None),
    }
}

pub fn list_patients_for_doctor(conn: &Connection, doctor_id: &Uuid) -> Result<Vec<User>, DatabaseError> {
    list_assigned_patients(conn, "assigned_doctor_id", doctor_id)
}

pub fn list_patients_for_psychologist(
    conn: &Connection,
    psychologist_id: &Uuid,
) -> Result<Vec<User>, DatabaseError> {
    list_assigned_patients(conn, "assigned_psychologist_id", psychologist_id)
}

fn list_assigned_patients(
    conn: &Connection,
    column: &str,
    staff_id: &Uuid,
) -> Result<Vec<User>, DatabaseError> {
    let columns = USER_COLUMNS
        .split(", ")
        .map(|c| format!("u.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stmt = conn.prepare(&format!(
        "SELECT {columns} FROM users u JOIN profiles p ON p.user_id = u.id
         WHERE p.{column} = ?1 AND u.role = 'PATIENT'
         ORDER BY u.username"
    ))?;
    let rows = stmt.query_map(params![staff_id.to_string()], read_user_row)?;
    let mut users = Vec::new();
    for row in rows {
        users.push(user_from_row(row?)?);
    }
    Ok(users)
}

struct UserRow {
    id: String,
    username: String,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    role: String,
    is_verified: i32,
    created_at: String,
}

fn read_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        email: row.get(4)?,
        phone: row.get(5)?,
        role: row.get(6)?,
        is_verified: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn user_from_row(row: UserRow) -> Result<User, DatabaseError> {
    Ok(User {
        id: parse_uuid(&row.id)?,
        username: row.username,
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
        phone: row.phone,
        role: Role::from_str(&row.role)?,
        is_verified: row.is_verified != 0,
        created_at: parse_datetime(&row.created_at),
    })
}
