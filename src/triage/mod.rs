//! Rule-based triage of free-text patient messages.
//!
//! Pipeline: normalize → risk detection + intent classification →
//! reply, suggested action and sentiment. Every stage is a pure function
//! of the message and the read-only tables the engine was built with, so
//! one engine can serve concurrent requests without locking.

pub mod advice;
pub mod intent;
pub mod lexicon;
pub mod responses;
pub mod tables;
pub mod types;

use std::sync::LazyLock;

use rand::Rng;

pub use advice::{map_sentiment, suggest_action};
pub use intent::{IntentClassifier, IntentRule};
pub use lexicon::{Lexicon, LexiconEntry};
pub use responses::{PainCues, ResponseContext, ResponseGenerator, TemplateBank, TemplateGroup};
pub use tables::{RiskPatterns, TriageTables};
pub use types::{ClassificationResult, Intent, RiskAssessment, RiskTier, Sentiment, TriageError};

/// Generic term used when the patient has neither a first name nor a username.
pub const DEFAULT_DISPLAY_NAME: &str = "amiga";

static SHARED_ENGINE: LazyLock<TriageEngine> = LazyLock::new(|| {
    TriageEngine::from_tables(&TriageTables::builtin()).expect("Invalid builtin triage tables")
});

/// Lowercase and trim a raw message before matching.
pub fn normalize(message: &str) -> String {
    message.trim().to_lowercase()
}

/// First non-blank of the patient's first name and username, else the
/// generic fallback term.
pub fn resolve_display_name(first_name: Option<&str>, username: Option<&str>) -> String {
    [first_name, username]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|name| !name.is_empty())
        .unwrap_or(DEFAULT_DISPLAY_NAME)
        .to_string()
}

/// The assembled classification pipeline.
#[derive(Debug, Clone)]
pub struct TriageEngine {
    lexicon: Lexicon,
    intents: IntentClassifier,
    responses: ResponseGenerator,
}

impl TriageEngine {
    pub fn new(lexicon: Lexicon, intents: IntentClassifier, responses: ResponseGenerator) -> Self {
        Self {
            lexicon,
            intents,
            responses,
        }
    }

    pub fn from_tables(tables: &TriageTables) -> Result<Self, TriageError> {
        Ok(Self::new(
            tables.risk_patterns.compile()?,
            IntentClassifier::new(tables.intents.clone()),
            ResponseGenerator::new(tables.templates.clone(), tables.pain.clone()),
        ))
    }

    /// Process-wide engine built from the shipped tables.
    pub fn shared() -> &'static TriageEngine {
        &SHARED_ENGINE
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn templates(&self) -> &TemplateBank {
        self.responses.bank()
    }

    pub fn pain_cues(&self) -> &PainCues {
        self.responses.cues()
    }

    pub fn detect_risk(&self, message: &str) -> RiskAssessment {
        self.lexicon.detect(&normalize(message))
    }

    pub fn classify_intent(&self, message: &str) -> Intent {
        self.intents.classify(&normalize(message))
    }

    pub fn classify(&self, message: &str, display_name: &str) -> ClassificationResult {
        self.classify_with_rng(message, display_name, &mut rand::thread_rng())
    }

    /// Run the full pipeline with an explicit randomness source for
    /// template selection.
    pub fn classify_with_rng<R: Rng + ?Sized>(
        &self,
        message: &str,
        display_name: &str,
        rng: &mut R,
    ) -> ClassificationResult {
        let message = normalize(message);

        let risk = self.lexicon.detect(&message);
        let intent = self.intents.classify(&message);

        let ctx = ResponseContext {
            intent,
            risk_tier: risk.tier,
            display_name,
            message: &message,
        };
        let response_text = self.responses.generate(&ctx, rng);
        let suggested_action =
            suggest_action(risk.tier, &message, self.responses.cues()).map(str::to_string);
        let sentiment = map_sentiment(risk.tier, intent);

        if risk.tier.is_alerting() {
            tracing::warn!(
                tier = %risk.tier,
                matches = risk.matched.len(),
                "Alerting risk tier detected in message"
            );
        } else {
            tracing::debug!(
                tier = %risk.tier,
                intent = intent.as_str(),
                sentiment = sentiment.as_str(),
                "Message classified"
            );
        }

        ClassificationResult {
            response_text,
            sentiment,
            risk_tier: risk.tier,
            intent,
            matched_patterns: risk.matched,
            suggested_action,
        }
    }
}

impl Default for TriageEngine {
    fn default() -> Self {
        Self::shared().clone()
    }
}
