//! Deterministic first-pass classifier.
//!
//! Counts indicator phrases per tier, applies bare-affirmative suppression,
//! adds blood-pressure increments, then reads the level off the decision
//! table. Pure function of the answers and the compiled locale tables.

pub mod blood_pressure;
pub mod decision;

pub use blood_pressure::*;
pub use decision::*;

use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::engine::EngineError;
use crate::locale::{render, IndicatorPattern, LocalePack};
use crate::models::{RiskAssessment, RiskLevel, RiskTierCounts};
use crate::pipeline::normalize::NormalizedResponses;

struct CompiledIndicator {
    label: String,
    regex: Regex,
}

/// A tier indicator that matched somewhere in the answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndicatorMatch {
    pub tier: RiskLevel,
    pub label: String,
}

/// Pressure evidence and what it added to the counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PressureFinding {
    pub signal: PressureSignal,
    pub category: Option<BloodPressureCategory>,
    pub contribution: Option<(RiskLevel, u32)>,
}

/// Audit trail of one rule classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleFindings {
    pub counts: RiskTierCounts,
    pub matches: Vec<IndicatorMatch>,
    pub bare_affirmatives: u32,
    pub pressure: Option<PressureFinding>,
    pub branch: RuleBranch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleAssessment {
    pub assessment: RiskAssessment,
    pub findings: RuleFindings,
}

/// Rule classifier for one locale. Patterns are compiled at construction.
pub struct RuleClassifier {
    pack: Arc<LocalePack>,
    high: Vec<CompiledIndicator>,
    medium: Vec<CompiledIndicator>,
    low: Vec<CompiledIndicator>,
    pressure: PressureExtractor,
}

impl RuleClassifier {
    pub fn new(pack: Arc<LocalePack>) -> Result<Self, EngineError> {
        let compile_tier = |level: RiskLevel| -> Result<Vec<CompiledIndicator>, EngineError> {
            pack.indicators
                .tier(level)
                .iter()
                .map(|indicator| compile_indicator(&pack.tag, indicator))
                .collect()
        };

        Ok(Self {
            high: compile_tier(RiskLevel::High)?,
            medium: compile_tier(RiskLevel::Medium)?,
            low: compile_tier(RiskLevel::Low)?,
            pressure: PressureExtractor::for_locale(&pack)?,
            pack,
        })
    }

    pub fn classify(&self, responses: &NormalizedResponses<'_>) -> RuleAssessment {
        let mut counts = RiskTierCounts::default();
        let mut matches = Vec::new();

        for (level, tier) in [
            (RiskLevel::High, &self.high),
            (RiskLevel::Medium, &self.medium),
            (RiskLevel::Low, &self.low),
        ] {
            for indicator in tier.iter().filter(|i| i.regex.is_match(&responses.blob)) {
                counts.add(level, 1);
                matches.push(IndicatorMatch {
                    tier: level,
                    label: indicator.label.clone(),
                });
            }
        }

        // An unqualified "yes" says nothing about severity.
        let bare_affirmatives = responses
            .answers
            .iter()
            .filter(|answer| self.pack.is_bare_affirmative(answer))
            .count() as u32;
        if bare_affirmatives > 0 && counts.high == 0 {
            counts.medium = counts.medium.saturating_sub(bare_affirmatives);
        }

        let pressure = self.pressure.extract(&responses.blob).map(|signal| {
            let contribution = signal.contribution();
            if let Some((level, amount)) = contribution {
                counts.add(level, amount);
            }
            PressureFinding {
                signal,
                category: match signal {
                    PressureSignal::Reading(reading) => Some(reading.category()),
                    PressureSignal::Standalone { .. } => None,
                },
                contribution,
            }
        });

        let branch = decide(&counts);
        tracing::debug!(
            locale = %self.pack.tag,
            high = counts.high,
            medium = counts.medium,
            low = counts.low,
            bare_affirmatives,
            branch = ?branch,
            "Rule classification"
        );

        let texts = branch.texts(&self.pack.rule_texts);
        let explanation = if branch.names_indicator() {
            let indicator = self.high_indicator_name(&matches, pressure.as_ref());
            render(&texts.explanation, &[("indicator", &indicator)])
        } else {
            texts.explanation.clone()
        };

        RuleAssessment {
            assessment: RiskAssessment::new(branch.level(), explanation, texts.next_steps.clone()),
            findings: RuleFindings {
                counts,
                matches,
                bare_affirmatives,
                pressure,
                branch,
            },
        }
    }

    /// Name of the lone high-tier signal: the matched phrase, or the
    /// pressure value when the increment came from a number.
    fn high_indicator_name(&self, matches: &[IndicatorMatch], pressure: Option<&PressureFinding>) -> String {
        if let Some(found) = matches.iter().find(|m| m.tier == RiskLevel::High) {
            return found.label.clone();
        }
        match pressure {
            Some(finding) => render(
                &self.pack.reading_label,
                &[("reading", &finding.signal.display_value())],
            ),
            None => self.pack.level_label(RiskLevel::High).to_string(),
        }
    }
}

fn compile_indicator(locale: &str, indicator: &IndicatorPattern) -> Result<CompiledIndicator, EngineError> {
    let regex = RegexBuilder::new(&indicator.pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| EngineError::InvalidPattern {
            locale: locale.to_string(),
            label: indicator.label.clone(),
            message: e.to_string(),
        })?;
    Ok(CompiledIndicator {
        label: indicator.label.clone(),
        regex,
    })
}
