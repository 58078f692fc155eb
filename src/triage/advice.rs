//! Clinical action advice and sentiment labels derived from the upstream
//! risk tier and intent. Both are ordered first-match-wins rule lists.

use super::responses::PainCues;
use super::types::{Intent, RiskTier, Sentiment};

pub const CRISIS_PROTOCOL_ACTION: &str = "URGENTE: Activar protocolo de crisis/suicidio.";
pub const URGENT_REVIEW_ACTION: &str = "PRIORIDAD: Valoración médica/psicológica en <24h.";
pub const ANALGESIA_REVIEW_ACTION: &str = "Seguimiento: Ajuste de analgesia o revisión física.";

type ActionPredicate = fn(RiskTier, &str, &PainCues) -> bool;

fn is_critical(tier: RiskTier, _: &str, _: &PainCues) -> bool {
    tier == RiskTier::Critical
}

fn is_high(tier: RiskTier, _: &str, _: &PainCues) -> bool {
    tier == RiskTier::High
}

fn is_medium_pain(tier: RiskTier, message: &str, cues: &PainCues) -> bool {
    tier == RiskTier::Medium && cues.mentions_pain(message)
}

const ACTION_RULES: &[(ActionPredicate, &str)] = &[
    (is_critical, CRISIS_PROTOCOL_ACTION),
    (is_high, URGENT_REVIEW_ACTION),
    (is_medium_pain, ANALGESIA_REVIEW_ACTION),
];

/// Suggested follow-up for clinical staff, if any.
pub fn suggest_action(tier: RiskTier, message: &str, cues: &PainCues) -> Option<&'static str> {
    ACTION_RULES
        .iter()
        .find(|(applies, _)| applies(tier, message, cues))
        .map(|(_, action)| *action)
}

type SentimentPredicate = fn(RiskTier, Intent) -> bool;

fn alerting_risk(tier: RiskTier, _: Intent) -> bool {
    tier.is_alerting()
}

fn medium_risk(tier: RiskTier, _: Intent) -> bool {
    tier == RiskTier::Medium
}

fn joyful(_: RiskTier, intent: Intent) -> bool {
    intent == Intent::Joy
}

fn distressed(_: RiskTier, intent: Intent) -> bool {
    matches!(intent, Intent::Sadness | Intent::Anxiety)
}

const SENTIMENT_RULES: &[(SentimentPredicate, Sentiment)] = &[
    (alerting_risk, Sentiment::Alert),
    (medium_risk, Sentiment::Concern),
    (joyful, Sentiment::Positive),
    (distressed, Sentiment::Concern),
];

pub fn map_sentiment(tier: RiskTier, intent: Intent) -> Sentiment {
    SENTIMENT_RULES
        .iter()
        .find(|(applies, _)| applies(tier, intent))
        .map(|(_, sentiment)| *sentiment)
        .unwrap_or(Sentiment::Neutral)
}
