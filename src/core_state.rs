//! Shared application state.
//!
//! `CoreState` is built once at startup and shared behind an `Arc` by every
//! front end. Connections are opened per request; the triage engine and the
//! alert notifier are shared.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::Connection;

use crate::clinical::AlertNotifier;
use crate::config::{AppConfig, ConfigError};
use crate::db;
use crate::triage::TriageEngine;

pub struct CoreState {
    db_path: PathBuf,
    engine: Arc<TriageEngine>,
    notifier: AlertNotifier,
}

impl CoreState {
    pub fn new(db_path: PathBuf, engine: Arc<TriageEngine>, notifier: AlertNotifier) -> Self {
        Self {
            db_path,
            engine,
            notifier,
        }
    }

    /// Build state from configuration, creating the database directory and
    /// applying migrations once up front.
    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::DataDir {
                path: parent.display().to_string(),
                reason: e.to_string(),
            })?;
        }
        let state = Self::new(
            config.database_path.clone(),
            config.build_engine()?,
            config.build_notifier()?,
        );
        state.open_db()?;

        tracing::info!(
            app = crate::config::APP_NAME,
            version = crate::config::APP_VERSION,
            db = %state.db_path.display(),
            "Core state ready"
        );
        Ok(state)
    }

    /// Open a database connection. Migrations run on every open and are a
    /// no-op once applied.
    pub fn open_db(&self) -> Result<Connection, CoreError> {
        db::open_database(&self.db_path).map_err(CoreError::Database)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn engine(&self) -> &TriageEngine {
        &self.engine
    }

    pub fn notifier(&self) -> &AlertNotifier {
        &self.notifier
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Cannot create data directory {path}: {reason}")]
    DataDir { path: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::handle_message;
    use crate::db::repository::test_support::make_care_team;

    #[test]
    fn state_from_config_creates_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            database_path: dir.path().join("nested").join("lia.db"),
            ..AppConfig::default()
        };

        let state = CoreState::from_config(&config).unwrap();
        assert!(state.db_path().exists());

        let conn = state.open_db().unwrap();
        assert_eq!(db::get_current_version(&conn), 1);
    }

    #[test]
    fn state_handles_a_chat_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            database_path: dir.path().join("lia.db"),
            ..AppConfig::default()
        };
        let state = CoreState::from_config(&config).unwrap();
        let conn = state.open_db().unwrap();
        let (patient, _, _) = make_care_team(&conn);

        let outcome = handle_message(&conn, state.engine(), state.notifier(), &patient, "Gracias Lia").unwrap();
        assert!(!outcome.response_text().is_empty());

        // a second connection sees the stored interaction
        let other = state.open_db().unwrap();
        assert_eq!(db::get_recent_chat_interactions(&other, &patient.id, 5).unwrap().len(), 1);
    }
}
