//! Outbound alert e-mail.
//!
//! `Mailer` is the seam: `RelayMailer` posts to an HTTP mail relay,
//! `LogMailer` only logs, `MemoryMailer` keeps messages for inspection.

use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Alert, User};

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Cannot reach mail relay at {0}")]
    RelayConnection(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Mail relay rejected message (status {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Mailer unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

pub trait Mailer: Send + Sync {
    fn send(&self, email: &OutgoingEmail) -> Result<(), NotifyError>;
}

/// Subject and body of the notification for `alert` about `patient`.
pub fn compose_alert_email(alert: &Alert, patient: &User) -> (String, String) {
    let full_name = patient.full_name();
    let subject = format!("⚠ Alerta {} - {}", alert.severity.label(), full_name);
    let body = format!(
        "Alerta: {alert_type}\n\
         Paciente: {full_name}\n\
         Severidad: {severity}\n\
         \n\
         Mensaje:\n\
         {message}\n\
         \n\
         Acción sugerida:\n\
         {action}\n\
         \n\
         ---\n\
         Sistema Lia for a Woman\n",
        alert_type = alert.alert_type.label(),
        severity = alert.severity.label(),
        message = alert.message,
        action = alert.suggested_action.as_deref().unwrap_or("-"),
    );
    (subject, body)
}

// ── HTTP relay ──

/// Delivers e-mail through an HTTP relay accepting `OutgoingEmail` as JSON.
pub struct RelayMailer {
    endpoint: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl RelayMailer {
    pub fn new(endpoint: &str, timeout_secs: u64) -> Result<Self, NotifyError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| NotifyError::HttpClient(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Mailer for RelayMailer {
    fn send(&self, email: &OutgoingEmail) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(email)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    NotifyError::RelayConnection(self.endpoint.clone())
                } else if e.is_timeout() {
                    NotifyError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    NotifyError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

// ── Development backends ──

/// Writes e-mails to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, email: &OutgoingEmail) -> Result<(), NotifyError> {
        tracing::info!(
            from = %email.from,
            recipients = email.to.len(),
            subject = %email.subject,
            "E-mail logged (no delivery backend configured)"
        );
        Ok(())
    }
}

/// Keeps sent e-mails in memory. Optionally fails every send.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail_with: Option<String>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_with: Some(reason.to_string()),
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Mailer for MemoryMailer {
    fn send(&self, email: &OutgoingEmail) -> Result<(), NotifyError> {
        if let Some(reason) = &self.fail_with {
            return Err(NotifyError::Unavailable(reason.clone()));
        }
        self.sent
            .lock()
            .map_err(|_| NotifyError::Unavailable("mailbox lock poisoned".into()))?
            .push(email.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{AlertSeverity, AlertType, Role};

    fn patient() -> User {
        let mut user = User::new("ana", Role::Patient);
        user.first_name = Some("Ana".into());
        user.last_name = Some("García".into());
        user
    }

    #[test]
    fn alert_email_subject_and_body() {
        let alert = Alert::new(
            uuid::Uuid::new_v4(),
            AlertType::ChatRisk,
            AlertSeverity::Critical,
            "Riesgo CRITICAL detectado en conversación con Lia",
        )
        .with_action("Llamar hoy");

        let (subject, body) = compose_alert_email(&alert, &patient());
        assert_eq!(subject, "⚠ Alerta Crítica - Ana García");
        assert!(body.contains("Alerta: Riesgo Detectado en Chat"));
        assert!(body.contains("Paciente: Ana García"));
        assert!(body.contains("Severidad: Crítica"));
        assert!(body.contains("Llamar hoy"));
    }

    #[test]
    fn memory_mailer_records_and_fails() {
        let email = OutgoingEmail {
            from: "lia@lia.test".into(),
            to: vec!["dr@lia.test".into()],
            subject: "s".into(),
            body: "b".into(),
        };

        let mailer = MemoryMailer::new();
        mailer.send(&email).unwrap();
        assert_eq!(mailer.sent(), vec![email.clone()]);

        let broken = MemoryMailer::failing("smtp down");
        assert!(matches!(broken.send(&email), Err(NotifyError::Unavailable(_))));
        assert!(broken.sent().is_empty());
    }

    #[test]
    fn relay_reports_unreachable_endpoint() {
        let mailer = RelayMailer::new("http://127.0.0.1:9/", 2).unwrap();
        assert_eq!(mailer.endpoint(), "http://127.0.0.1:9");
        let email = OutgoingEmail {
            from: "lia@lia.test".into(),
            to: vec!["dr@lia.test".into()],
            subject: "s".into(),
            body: "b".into(),
        };
        assert!(mailer.send(&email).is_err());
    }

    #[test]
    fn log_mailer_always_succeeds() {
        let email = OutgoingEmail {
            from: "a".into(),
            to: vec![],
            subject: "s".into(),
            body: "b".into(),
        };
        assert!(LogMailer.send(&email).is_ok());
    }
}
