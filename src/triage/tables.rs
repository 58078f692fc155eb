use std::path::Path;

use serde::{Deserialize, Serialize};

use super::intent::{IntentClassifier, IntentRule};
use super::lexicon::{self, Lexicon};
use super::responses::{PainCues, TemplateBank};
use super::types::{RiskTier, TriageError};

/// Risk patterns keyed by tier, as written in a tables file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskPatterns {
    pub critical: Vec<String>,
    pub high: Vec<String>,
    pub medium: Vec<String>,
    pub low: Vec<String>,
}

impl RiskPatterns {
    pub fn builtin() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }
        Self {
            critical: owned(lexicon::CRITICAL_PATTERNS),
            high: owned(lexicon::HIGH_PATTERNS),
            medium: owned(lexicon::MEDIUM_PATTERNS),
            low: owned(lexicon::LOW_PATTERNS),
        }
    }

    pub fn compile(&self) -> Result<Lexicon, TriageError> {
        Lexicon::from_patterns(&[
            (RiskTier::Critical, self.critical.as_slice()),
            (RiskTier::High, self.high.as_slice()),
            (RiskTier::Medium, self.medium.as_slice()),
            (RiskTier::Low, self.low.as_slice()),
        ])
    }
}

/// Full, serializable description of the triage tables.
///
/// Loaded once at startup and compiled into a `TriageEngine`; the engine
/// never reads the tables again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageTables {
    pub risk_patterns: RiskPatterns,
    /// Intent rules in priority order.
    pub intents: Vec<IntentRule>,
    pub pain: PainCues,
    pub templates: TemplateBank,
}

impl TriageTables {
    pub fn builtin() -> Self {
        Self {
            risk_patterns: RiskPatterns::builtin(),
            intents: IntentClassifier::builtin_rules(),
            pain: PainCues::builtin(),
            templates: TemplateBank::builtin(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, TriageError> {
        serde_json::from_str(json).map_err(|e| TriageError::TablesMalformed(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, TriageError> {
        let json = std::fs::read_to_string(path).map_err(|e| TriageError::TablesUnreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let tables = Self::from_json(&json)?;
        tracing::info!(
            path = %path.display(),
            intents = tables.intents.len(),
            "Loaded triage tables"
        );
        Ok(tables)
    }

    pub fn to_json(&self) -> Result<String, TriageError> {
        serde_json::to_string_pretty(self).map_err(|e| TriageError::TablesMalformed(e.to_string()))
    }
}

impl Default for TriageTables {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::triage::types::Intent;

    #[test]
    fn builtin_tables_survive_json() {
        let tables = TriageTables::builtin();
        let json = tables.to_json().unwrap();
        assert_eq!(TriageTables::from_json(&json).unwrap(), tables);
    }

    #[test]
    fn intent_labels_are_uppercase_in_json() {
        let json = TriageTables::builtin().to_json().unwrap();
        assert!(json.contains("\"GREETING\""));
        assert!(json.contains("\"pain_high\""));
    }

    #[test]
    fn malformed_json_rejected() {
        let err = TriageTables::from_json("{\"risk_patterns\": 3}").unwrap_err();
        assert!(matches!(err, TriageError::TablesMalformed(_)));
    }

    #[test]
    fn load_from_file() {
        let mut tables = TriageTables::builtin();
        tables.intents.retain(|r| r.intent != Intent::Greeting);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(tables.to_json().unwrap().as_bytes()).unwrap();

        let loaded = TriageTables::load(file.path()).unwrap();
        assert_eq!(loaded.intents.len(), 5);
    }

    #[test]
    fn missing_file_reported() {
        let err = TriageTables::load(Path::new("/nonexistent/lia/tables.json")).unwrap_err();
        assert!(matches!(err, TriageError::TablesUnreadable { .. }));
    }

    #[test]
    fn bad_pattern_fails_compilation() {
        let mut patterns = RiskPatterns::builtin();
        patterns.low.push("[abc".into());
        assert!(matches!(
            patterns.compile().unwrap_err(),
            TriageError::InvalidPattern { .. }
        ));
    }
}
