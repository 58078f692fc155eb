use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::clinical::AlertNotifier;
use crate::notify::{LogMailer, Mailer, NotifyError, RelayMailer};
use crate::triage::{TriageEngine, TriageError, TriageTables};

/// Application-level constants
pub const APP_NAME: &str = "Lia";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_MAIL_FROM: &str = "noreply@lia.local";
pub const DEFAULT_MAIL_TIMEOUT_SECS: u64 = 10;
const DATABASE_FILE: &str = "lia.db";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "lia_lib=info,warn"
}

/// Get the application data directory.
/// `LIA_DATA_DIR` when set, else `<platform data dir>/Lia`.
pub fn app_data_dir() -> PathBuf {
    if let Some(dir) = non_blank_var("LIA_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

pub fn default_database_path() -> PathBuf {
    app_data_dir().join(DATABASE_FILE)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
    #[error(transparent)]
    Triage(#[from] TriageError),
    #[error(transparent)]
    Mailer(#[from] NotifyError),
}

/// Deployment settings, read from `LIA_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_path: PathBuf,
    /// Override file for the triage tables; builtin tables when `None`.
    pub triage_tables: Option<PathBuf>,
    pub mail_from: String,
    /// HTTP mail relay. Alert e-mails only go to the log when `None`.
    pub mail_relay_url: Option<String>,
    pub mail_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            triage_tables: None,
            mail_from: DEFAULT_MAIL_FROM.to_string(),
            mail_relay_url: None,
            mail_timeout_secs: DEFAULT_MAIL_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let mail_timeout_secs = match get("LIA_MAIL_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                var: "LIA_MAIL_TIMEOUT_SECS",
                value: raw,
            })?,
            None => defaults.mail_timeout_secs,
        };

        Ok(Self {
            database_path: get("LIA_DATABASE_PATH").map(PathBuf::from).unwrap_or(defaults.database_path),
            triage_tables: get("LIA_TRIAGE_TABLES").map(PathBuf::from),
            mail_from: get("LIA_MAIL_FROM").unwrap_or(defaults.mail_from),
            mail_relay_url: get("LIA_MAIL_RELAY_URL"),
            mail_timeout_secs,
        })
    }

    /// Builtin engine, or one compiled from the override tables.
    pub fn build_engine(&self) -> Result<Arc<TriageEngine>, ConfigError> {
        match &self.triage_tables {
            Some(path) => Ok(Arc::new(load_engine(path)?)),
            None => Ok(Arc::new(TriageEngine::from_tables(&TriageTables::builtin())?)),
        }
    }

    pub fn build_notifier(&self) -> Result<AlertNotifier, ConfigError> {
        let mailer: Arc<dyn Mailer> = match &self.mail_relay_url {
            Some(url) => Arc::new(RelayMailer::new(url, self.mail_timeout_secs)?),
            None => Arc::new(LogMailer),
        };
        Ok(AlertNotifier::new(mailer, &self.mail_from))
    }
}

fn load_engine(path: &Path) -> Result<TriageEngine, TriageError> {
    let tables = TriageTables::load(path)?;
    let engine = TriageEngine::from_tables(&tables)?;
    tracing::info!(path = %path.display(), "Triage tables loaded");
    Ok(engine)
}

fn non_blank_var(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.database_path.ends_with("lia.db"));
    }

    #[test]
    fn variables_override_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("LIA_DATABASE_PATH", "/tmp/lia/test.db"),
            ("LIA_MAIL_FROM", "alertas@hospital.test"),
            ("LIA_MAIL_RELAY_URL", "http://127.0.0.1:8025/send"),
            ("LIA_MAIL_TIMEOUT_SECS", "3"),
            ("LIA_TRIAGE_TABLES", "  "),
        ]))
        .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/lia/test.db"));
        assert_eq!(config.mail_from, "alertas@hospital.test");
        assert_eq!(config.mail_relay_url.as_deref(), Some("http://127.0.0.1:8025/send"));
        assert_eq!(config.mail_timeout_secs, 3);
        assert_eq!(config.triage_tables, None);
    }

    #[test]
    fn bad_timeout_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("LIA_MAIL_TIMEOUT_SECS", "pronto")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "LIA_MAIL_TIMEOUT_SECS", .. }));
    }

    #[test]
    fn engine_from_table_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tables.json");
        std::fs::write(&path, serde_json::to_string(&TriageTables::builtin()).unwrap()).unwrap();

        let config = AppConfig {
            triage_tables: Some(path),
            ..AppConfig::default()
        };
        let engine = config.build_engine().unwrap();
        let result = engine.classify("quiero morir", "Ana");
        assert_eq!(result.risk_tier, crate::triage::RiskTier::Critical);
    }

    #[test]
    fn missing_table_file_is_an_error() {
        let config = AppConfig {
            triage_tables: Some(PathBuf::from("/nonexistent/lia/tables.json")),
            ..AppConfig::default()
        };
        assert!(matches!(config.build_engine().unwrap_err(), ConfigError::Triage(_)));
    }

    #[test]
    fn notifier_uses_configured_sender() {
        let notifier = AppConfig::default().build_notifier().unwrap();
        assert_eq!(notifier.from_address(), DEFAULT_MAIL_FROM);
    }

    #[test]
    fn app_name_is_lia() {
        assert_eq!(APP_NAME, "Lia");
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
