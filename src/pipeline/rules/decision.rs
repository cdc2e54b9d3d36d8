use serde::{Deserialize, Serialize};

use crate::locale::{RuleTexts, TextPair};
use crate::models::{RiskLevel, RiskTierCounts};

/// Row of the rule decision table that produced a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleBranch {
    /// low ≥ 3
    Reassuring,
    /// high ≥ 2
    MultipleHigh,
    /// high = 1, medium ≥ 1
    HighWithModerate,
    /// high = 1
    SingleHigh,
    /// medium ≥ 2
    MultipleModerate,
    /// medium = 1, low ≥ 1
    ModerateWithReassuring,
    /// medium = 1
    SingleModerate,
    NoConcern,
}

impl RuleBranch {
    pub fn level(self) -> RiskLevel {
        match self {
            Self::MultipleHigh | Self::HighWithModerate => RiskLevel::High,
            Self::SingleHigh | Self::MultipleModerate | Self::SingleModerate => RiskLevel::Medium,
            Self::Reassuring | Self::ModerateWithReassuring | Self::NoConcern => RiskLevel::Low,
        }
    }

    /// Branches whose text names the single high-tier indicator.
    pub fn names_indicator(self) -> bool {
        matches!(self, Self::HighWithModerate | Self::SingleHigh)
    }

    pub fn texts(self, texts: &RuleTexts) -> &TextPair {
        match self {
            Self::Reassuring => &texts.reassuring,
            Self::MultipleHigh => &texts.multiple_high,
            Self::HighWithModerate => &texts.high_with_moderate,
            Self::SingleHigh => &texts.single_high,
            Self::MultipleModerate => &texts.multiple_moderate,
            Self::ModerateWithReassuring => &texts.moderate_with_reassuring,
            Self::SingleModerate => &texts.single_moderate,
            Self::NoConcern => &texts.no_concern,
        }
    }
}

/// Evaluated top to bottom, first match wins. Reassurance is checked
/// first: three or more low-tier signals outrank everything else.
pub fn decide(counts: &RiskTierCounts) -> RuleBranch {
    let RiskTierCounts { high, medium, low } = *counts;
    if low >= 3 {
        RuleBranch::Reassuring
    } else if high >= 2 {
        RuleBranch::MultipleHigh
    } else if high == 1 && medium >= 1 {
        RuleBranch::HighWithModerate
    } else if high == 1 {
        RuleBranch::SingleHigh
    } else if medium >= 2 {
        RuleBranch::MultipleModerate
    } else if medium == 1 && low >= 1 {
        RuleBranch::ModerateWithReassuring
    } else if medium == 1 {
        RuleBranch::SingleModerate
    } else {
        RuleBranch::NoConcern
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(high: u32, medium: u32, low: u32) -> RiskTierCounts {
        RiskTierCounts { high, medium, low }
    }

    #[test]
    fn decision_table_rows() {
        let cases = [
            (counts(5, 5, 3), RuleBranch::Reassuring, RiskLevel::Low),
            (counts(2, 0, 0), RuleBranch::MultipleHigh, RiskLevel::High),
            (counts(2, 4, 2), RuleBranch::MultipleHigh, RiskLevel::High),
            (counts(1, 1, 0), RuleBranch::HighWithModerate, RiskLevel::High),
            (counts(1, 0, 2), RuleBranch::SingleHigh, RiskLevel::Medium),
            (counts(0, 2, 0), RuleBranch::MultipleModerate, RiskLevel::Medium),
            (counts(0, 1, 1), RuleBranch::ModerateWithReassuring, RiskLevel::Low),
            (counts(0, 1, 0), RuleBranch::SingleModerate, RiskLevel::Medium),
            (counts(0, 0, 2), RuleBranch::NoConcern, RiskLevel::Low),
            (counts(0, 0, 0), RuleBranch::NoConcern, RiskLevel::Low),
        ];
        for (input, branch, level) in cases {
            assert_eq!(decide(&input), branch, "counts {input:?}");
            assert_eq!(branch.level(), level);
        }
    }

    #[test]
    fn only_single_high_branches_name_indicator() {
        assert!(RuleBranch::SingleHigh.names_indicator());
        assert!(RuleBranch::HighWithModerate.names_indicator());
        assert!(!RuleBranch::MultipleHigh.names_indicator());
        assert!(!RuleBranch::SingleModerate.names_indicator());
    }
}
