use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Severity of distress language detected in a message.
///
/// Variants are declared in ascending severity so the derived `Ord`
/// matches clinical priority: `None < Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskTier {
    /// Lexicon scan order. The first tier with a match decides the result.
    pub const SCAN_ORDER: [RiskTier; 4] = [
        RiskTier::Critical,
        RiskTier::High,
        RiskTier::Medium,
        RiskTier::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }

    /// HIGH and CRITICAL tiers require a clinical alert.
    pub fn is_alerting(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RiskTier {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(Self::None),
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            other => Err(TriageError::UnknownLabel {
                kind: "RiskTier",
                value: other.to_string(),
            }),
        }
    }
}

/// Coarse conversational topic of one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    Greeting,
    Gratitude,
    Joy,
    Sadness,
    Anxiety,
    Pain,
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "GREETING",
            Self::Gratitude => "GRATITUDE",
            Self::Joy => "JOY",
            Self::Sadness => "SADNESS",
            Self::Anxiety => "ANXIETY",
            Self::Pain => "PAIN",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Mood label persisted with a chat interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sentiment {
    Neutral,
    Positive,
    Concern,
    Alert,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "NEUTRAL",
            Self::Positive => "POSITIVE",
            Self::Concern => "CONCERN",
            Self::Alert => "ALERT",
        }
    }
}

impl std::str::FromStr for Sentiment {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEUTRAL" => Ok(Self::Neutral),
            "POSITIVE" => Ok(Self::Positive),
            "CONCERN" => Ok(Self::Concern),
            "ALERT" => Ok(Self::Alert),
            other => Err(TriageError::UnknownLabel {
                kind: "Sentiment",
                value: other.to_string(),
            }),
        }
    }
}

/// Outcome of scanning a message against the risk lexicon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub tier: RiskTier,
    /// Ids of the patterns that matched, all from `tier`.
    pub matched: Vec<String>,
}

impl RiskAssessment {
    pub fn none() -> Self {
        Self {
            tier: RiskTier::None,
            matched: Vec::new(),
        }
    }
}

/// Everything the pipeline derives from one inbound message.
///
/// Transient: the caller folds the relevant fields into a persisted
/// chat interaction and decides whether to raise an alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub response_text: String,
    pub sentiment: Sentiment,
    pub risk_tier: RiskTier,
    pub intent: Intent,
    pub matched_patterns: Vec<String>,
    pub suggested_action: Option<String>,
}

/// Errors raised while building triage tables. Classification itself
/// never fails.
#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Lexicon entries cannot use tier {0}")]
    InvalidTier(RiskTier),

    #[error("Unknown {kind} label: {value}")]
    UnknownLabel { kind: &'static str, value: String },

    #[error("Failed to read triage tables from {path}: {reason}")]
    TablesUnreadable { path: String, reason: String },

    #[error("Malformed triage tables: {0}")]
    TablesMalformed(String),
}
