use regex::Regex;

use super::types::{RiskAssessment, RiskTier, TriageError};

// ── Shipped lexicon ─────────────────────────────────────────

pub const CRITICAL_PATTERNS: &[&str] = &[
    r"quiero morir",
    r"suicidar",
    r"acabar con todo",
    r"no vale la pena vivir",
    r"mejor muerta",
    r"matarme",
    r"pastillas para dormir",
    r"cortarme",
];

pub const HIGH_PATTERNS: &[&str] = &[
    r"no aguanto m[áa]s",
    r"no puedo m[áa]s",
    r"dolor insoportable",
    r"no encuentro salida",
    r"desesperad[oa]",
    r"ayuda por favor",
];

pub const MEDIUM_PATTERNS: &[&str] = &[
    r"muy triste",
    r"dolor intenso",
    r"dolor fuerte",
    r"muy mal",
    r"fatal",
    r"terrible",
    r"llorando",
    r"deprimid[oa]",
];

pub const LOW_PATTERNS: &[&str] = &[
    r"triste",
    r"duele",
    r"cansada",
    r"agotada",
    r"molesta",
    r"aburrida",
];

/// One compiled lexicon pattern bound to its tier.
#[derive(Debug, Clone)]
pub struct LexiconEntry {
    tier: RiskTier,
    pattern: Regex,
}

impl LexiconEntry {
    pub fn new(tier: RiskTier, pattern: &str) -> Result<Self, TriageError> {
        if tier == RiskTier::None {
            return Err(TriageError::InvalidTier(tier));
        }
        let pattern = Regex::new(pattern).map_err(|e| TriageError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { tier, pattern })
    }

    pub fn tier(&self) -> RiskTier {
        self.tier
    }

    /// The pattern source doubles as the id reported in matches.
    pub fn id(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn is_match(&self, message: &str) -> bool {
        self.pattern.is_match(message)
    }
}

/// Immutable table of risk patterns grouped by tier.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    entries: Vec<LexiconEntry>,
}

impl Lexicon {
    pub fn new(entries: Vec<LexiconEntry>) -> Self {
        Self { entries }
    }

    /// Compile `(tier, patterns)` groups into a lexicon.
    pub fn from_patterns<S: AsRef<str>>(
        groups: &[(RiskTier, &[S])],
    ) -> Result<Self, TriageError> {
        let mut entries = Vec::new();
        for (tier, patterns) in groups {
            for pattern in patterns.iter() {
                entries.push(LexiconEntry::new(*tier, pattern.as_ref())?);
            }
        }
        Ok(Self::new(entries))
    }

    /// The shipped Spanish lexicon.
    pub fn builtin() -> Result<Self, TriageError> {
        Self::from_patterns(&[
            (RiskTier::Critical, CRITICAL_PATTERNS),
            (RiskTier::High, HIGH_PATTERNS),
            (RiskTier::Medium, MEDIUM_PATTERNS),
            (RiskTier::Low, LOW_PATTERNS),
        ])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries_for(&self, tier: RiskTier) -> impl Iterator<Item = &LexiconEntry> {
        self.entries.iter().filter(move |e| e.tier == tier)
    }

    /// Scan a normalized message.
    ///
    /// Tiers are tried from CRITICAL down to LOW; the first tier with at
    /// least one match is returned together with every match in that tier.
    /// Lower tiers are never reported alongside a higher one.
    pub fn detect(&self, message: &str) -> RiskAssessment {
        for tier in RiskTier::SCAN_ORDER {
            let matched: Vec<String> = self
                .entries_for(tier)
                .filter(|entry| entry.is_match(message))
                .map(|entry| entry.id().to_string())
                .collect();

            if !matched.is_empty() {
                return RiskAssessment { tier, matched };
            }
        }

        RiskAssessment::none()
    }
}
