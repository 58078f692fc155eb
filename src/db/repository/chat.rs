use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{fmt_datetime, optional, parse_datetime, parse_uuid};
use crate::db::DatabaseError;
use crate::models::{ChatInteraction, VoiceMemo};
use crate::triage::Sentiment;

const CHAT_COLUMNS: &str =
    "id, user_id, message_text, bot_response, sentiment, risk_keywords, emotion_scores, timestamp";

pub fn insert_chat_interaction(conn: &Connection, chat: &ChatInteraction) -> Result<(), DatabaseError> {
    let keywords_json =
        serde_json::to_string(&chat.risk_keywords).unwrap_or_else(|_| "[]".to_string());
    let scores_json = chat.emotion_scores.as_ref().map(|v| v.to_string());
    conn.execute(
        "INSERT INTO chat_interactions (id, user_id, message_text, bot_response, sentiment,
         risk_keywords, emotion_scores, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            chat.id.to_string(),
            chat.user_id.to_string(),
            chat.message_text,
            chat.bot_response,
            chat.sentiment.as_str(),
            keywords_json,
            scores_json,
            fmt_datetime(&chat.timestamp),
        ],
    )?;
    Ok(())
}

pub fn get_chat_interaction(conn: &Connection, id: &Uuid) -> Result<Option<ChatInteraction>, DatabaseError> {
    let row = optional(conn.query_row(
        &format!("SELECT {CHAT_COLUMNS} FROM chat_interactions WHERE id = ?1"),
        params![id.to_string()],
        read_chat_row,
    ))?;
    row.map(chat_from_row).transpose()
}

/// Most recent interactions of a user, newest first.
pub fn get_recent_chat_interactions(
    conn: &Connection,
    user_id: &Uuid,
    limit: usize,
) -> Result<Vec<ChatInteraction>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CHAT_COLUMNS} FROM chat_interactions WHERE user_id = ?1
         ORDER BY timestamp DESC, rowid DESC LIMIT ?2"
    ))?;
    let rows = stmt.query_map(params![user_id.to_string(), limit as i64], read_chat_row)?;

    let mut chats = Vec::new();
    for row in rows {
        chats.push(chat_from_row(row?)?);
    }
    Ok(chats)
}

struct ChatRow {
    id: String,
    user_id: String,
    message_text: String,
    bot_response: String,
    sentiment: String,
    risk_keywords: String,
    emotion_scores: Option<String>,
    timestamp: String,
}

fn read_chat_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatRow> {
    Ok(ChatRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        message_text: row.get(2)?,
        bot_response: row.get(3)?,
        sentiment: row.get(4)?,
        risk_keywords: row.get(5)?,
        emotion_scores: row.get(6)?,
        timestamp: row.get(7)?,
    })
}

fn chat_from_row(row: ChatRow) -> Result<ChatInteraction, DatabaseError> {
    Ok(ChatInteraction {
        id: parse_uuid(&row.id)?,
        user_id: parse_uuid(&row.user_id)?,
        message_text: row.message_text,
        bot_response: row.bot_response,
        sentiment: Sentiment::from_str(&row.sentiment).map_err(|_| DatabaseError::InvalidEnum {
            field: "Sentiment".into(),
            value: row.sentiment.clone(),
        })?,
        risk_keywords: serde_json::from_str(&row.risk_keywords).unwrap_or_default(),
        emotion_scores: row.emotion_scores.and_then(|s| serde_json::from_str(&s).ok()),
        timestamp: parse_datetime(&row.timestamp),
    })
}

// ── Voice memos ──

pub fn insert_voice_memo(conn: &Connection, memo: &VoiceMemo) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO voice_memos (id, user_id, audio_path, transcription, duration_seconds, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            memo.id.to_string(),
            memo.user_id.to_string(),
            memo.audio_path,
            memo.transcription,
            memo.duration_seconds,
            fmt_datetime(&memo.created_at),
        ],
    )?;
    Ok(())
}

/// A user's voice memos, newest first.
pub fn get_voice_memos(conn: &Connection, user_id: &Uuid, limit: usize) -> Result<Vec<VoiceMemo>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, audio_path, transcription, duration_seconds, created_at
         FROM voice_memos WHERE user_id = ?1
         ORDER BY created_at DESC, rowid DESC LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![user_id.to_string(), limit as i64], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<i32>>(4)?,
            row.get::<_, String>(5)?,
        ))
    })?;

    let mut memos = Vec::new();
    for row in rows {
        let (id, user_id, audio_path, transcription, duration_seconds, created_at) = row?;
        memos.push(VoiceMemo {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            audio_path,
            transcription,
            duration_seconds,
            created_at: parse_datetime(&created_at),
        });
    }
    Ok(memos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::*;
    use crate::models::enums::Role;

    fn interaction(user_id: Uuid, text: &str, at: &str) -> ChatInteraction {
        ChatInteraction {
            id: Uuid::new_v4(),
            user_id,
            message_text: text.into(),
            bot_response: "Te escucho.".into(),
            sentiment: Sentiment::Alert,
            risk_keywords: vec!["quiero morir".into()],
            emotion_scores: None,
            timestamp: parse_datetime(at),
        }
    }

    #[test]
    fn keywords_survive_storage() {
        let conn = test_db();
        let user = make_user(&conn, "ana", Role::Patient);
        let chat = interaction(user.id, "quiero morir", "2025-03-01 10:00:00");
        insert_chat_interaction(&conn, &chat).unwrap();

        let loaded = get_chat_interaction(&conn, &chat.id).unwrap().unwrap();
        assert_eq!(loaded, chat);
    }

    #[test]
    fn emotion_scores_stored_as_json() {
        let conn = test_db();
        let user = make_user(&conn, "ana", Role::Patient);
        let chat = ChatInteraction {
            emotion_scores: Some(serde_json::json!({"tristeza": 0.7, "miedo": 0.2})),
            ..interaction(user.id, "estoy triste", "2025-03-01 10:00:00")
        };
        insert_chat_interaction(&conn, &chat).unwrap();

        let loaded = get_chat_interaction(&conn, &chat.id).unwrap().unwrap();
        assert_eq!(loaded.emotion_scores.unwrap()["tristeza"], 0.7);
    }

    #[test]
    fn recent_history_newest_first() {
        let conn = test_db();
        let user = make_user(&conn, "ana", Role::Patient);
        insert_chat_interaction(&conn, &interaction(user.id, "uno", "2025-03-01 10:00:00")).unwrap();
        insert_chat_interaction(&conn, &interaction(user.id, "dos", "2025-03-02 10:00:00")).unwrap();
        insert_chat_interaction(&conn, &interaction(user.id, "tres", "2025-03-03 10:00:00")).unwrap();

        let recent = get_recent_chat_interactions(&conn, &user.id, 2).unwrap();
        let texts: Vec<_> = recent.iter().map(|c| c.message_text.as_str()).collect();
        assert_eq!(texts, vec!["tres", "dos"]);
    }

    #[test]
    fn interaction_requires_existing_user() {
        let conn = test_db();
        let chat = interaction(Uuid::new_v4(), "hola", "2025-03-01 10:00:00");
        assert!(insert_chat_interaction(&conn, &chat).is_err());
    }

    #[test]
    fn voice_memos_listed_newest_first() {
        let conn = test_db();
        let user = make_user(&conn, "ana", Role::Patient);
        let older = VoiceMemo {
            created_at: parse_datetime("2025-03-01 10:00:00"),
            duration_seconds: Some(42),
            ..VoiceMemo::new(user.id, "voice_memos/2025/03/01/a.webm")
        };
        let newer = VoiceMemo {
            created_at: parse_datetime("2025-03-02 10:00:00"),
            transcription: "Hoy me siento mejor".into(),
            ..VoiceMemo::new(user.id, "voice_memos/2025/03/02/b.webm")
        };
        insert_voice_memo(&conn, &older).unwrap();
        insert_voice_memo(&conn, &newer).unwrap();

        let memos = get_voice_memos(&conn, &user.id, 10).unwrap();
        assert_eq!(memos, vec![newer, older]);
        assert!(get_voice_memos(&conn, &Uuid::new_v4(), 10).unwrap().is_empty());
    }

    #[test]
    fn negative_duration_rejected_by_schema() {
        let conn = test_db();
        let user = make_user(&conn, "ana", Role::Patient);
        let memo = VoiceMemo {
            duration_seconds: Some(-1),
            ..VoiceMemo::new(user.id, "a.webm")
        };
        assert!(insert_voice_memo(&conn, &memo).is_err());
    }
}
