use serde::{Deserialize, Serialize};

/// Canonical risk tier. Always rendered in English, whatever the
/// conversation language; translation is done by the locale pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    /// Numeric severity used by reconciliation: Low=1, Medium=2, High=3.
    pub fn rank(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Parse an English tier token, ignoring case and surrounding whitespace.
    /// "HIGH", "high " and "High" all map to `High`.
    pub fn from_english(token: &str) -> Option<Self> {
        let token = token.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(token))
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final (or intermediate) risk record handed to collaborators.
///
/// `explanation` and `next_steps` are never empty on any record the
/// engine produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub explanation: String,
    pub next_steps: String,
}

impl RiskAssessment {
    pub fn new(level: RiskLevel, explanation: impl Into<String>, next_steps: impl Into<String>) -> Self {
        Self {
            level,
            explanation: explanation.into(),
            next_steps: next_steps.into(),
        }
    }

    pub fn is_well_formed(&self) -> bool {
        !self.explanation.trim().is_empty() && !self.next_steps.trim().is_empty()
    }
}

/// Per-invocation indicator counts. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskTierCounts {
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl RiskTierCounts {
    pub fn add(&mut self, level: RiskLevel, amount: u32) {
        match level {
            RiskLevel::High => self.high += amount,
            RiskLevel::Medium => self.medium += amount,
            RiskLevel::Low => self.low += amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_order_low_to_high() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert_eq!(RiskLevel::High.rank(), 3);
    }

    #[test]
    fn from_english_is_case_insensitive() {
        assert_eq!(RiskLevel::from_english("HIGH"), Some(RiskLevel::High));
        assert_eq!(RiskLevel::from_english(" medium "), Some(RiskLevel::Medium));
        assert_eq!(RiskLevel::from_english("low"), Some(RiskLevel::Low));
        assert_eq!(RiskLevel::from_english("severe"), None);
        assert_eq!(RiskLevel::from_english(""), None);
    }

    #[test]
    fn level_serializes_as_english_token() {
        let json = serde_json::to_string(&RiskLevel::Medium).unwrap();
        assert_eq!(json, "\"Medium\"");
    }

    #[test]
    fn blank_text_is_not_well_formed() {
        let record = RiskAssessment::new(RiskLevel::Low, "  ", "See your provider.");
        assert!(!record.is_well_formed());
    }

    #[test]
    fn tier_counts_add() {
        let mut counts = RiskTierCounts::default();
        counts.add(RiskLevel::High, 2);
        counts.add(RiskLevel::Low, 1);
        assert_eq!(counts, RiskTierCounts { high: 2, medium: 0, low: 1 });
    }
}
