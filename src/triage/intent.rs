use serde::{Deserialize, Serialize};

use super::types::Intent;

// ── Shipped keyword groups ──────────────────────────────────

pub const GREETING_KEYWORDS: &[&str] = &["hola", "buenos d", "buenas t", "buenas n", "hi", "hey"];
pub const GRATITUDE_KEYWORDS: &[&str] = &["gracias", "agradez", "amable"];
pub const JOY_KEYWORDS: &[&str] = &["bien", "feliz", "contenta", "genial", "mejor", "alegr"];
pub const SADNESS_KEYWORDS: &[&str] = &["triste", "llora", "pena", "depre", "sola", "vacía"];
pub const ANXIETY_KEYWORDS: &[&str] = &["ansiedad", "miedo", "nervios", "angustia", "panico", "tiembla"];
pub const PAIN_KEYWORDS: &[&str] = &["dolor", "duele", "ardor", "punzada", "migraña"];

/// One entry of the ordered intent rule list: if any keyword occurs as a
/// substring of the message, the rule's intent is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentRule {
    pub intent: Intent,
    pub keywords: Vec<String>,
}

impl IntentRule {
    pub fn new<I, S>(intent: Intent, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            intent,
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, message: &str) -> bool {
        self.keywords.iter().any(|kw| message.contains(kw.as_str()))
    }
}

/// First-match-wins intent classifier over an ordered rule list.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    rules: Vec<IntentRule>,
}

impl IntentClassifier {
    pub fn new(rules: Vec<IntentRule>) -> Self {
        Self { rules }
    }

    /// GREETING, GRATITUDE, JOY, SADNESS, ANXIETY, PAIN, in that order.
    pub fn builtin_rules() -> Vec<IntentRule> {
        vec![
            IntentRule::new(Intent::Greeting, GREETING_KEYWORDS.iter().copied()),
            IntentRule::new(Intent::Gratitude, GRATITUDE_KEYWORDS.iter().copied()),
            IntentRule::new(Intent::Joy, JOY_KEYWORDS.iter().copied()),
            IntentRule::new(Intent::Sadness, SADNESS_KEYWORDS.iter().copied()),
            IntentRule::new(Intent::Anxiety, ANXIETY_KEYWORDS.iter().copied()),
            IntentRule::new(Intent::Pain, PAIN_KEYWORDS.iter().copied()),
        ]
    }

    pub fn builtin() -> Self {
        Self::new(Self::builtin_rules())
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    /// Classify a normalized message. Messages matching no rule are UNKNOWN.
    pub fn classify(&self, message: &str) -> Intent {
        self.rules
            .iter()
            .find(|rule| rule.matches(message))
            .map(|rule| rule.intent)
            .unwrap_or(Intent::Unknown)
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::builtin()
    }
}
