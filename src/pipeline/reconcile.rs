use serde::Serialize;

use crate::locale::{render, LocalePack};
use crate::models::{RiskAssessment, RiskLevel};
use crate::pipeline::generative::GenerativeOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentSource {
    RuleBased,
    Generative,
}

/// How the final record was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum ReconciliationPath {
    /// Both classifiers produced the same tier.
    Agreement,
    /// High against Low, overridden to Medium.
    ExtremeDisagreement,
    /// Adjacent tiers; the higher one was kept.
    HigherTierWins { primary: AssessmentSource },
    /// The model could not be used; the rule record stands alone.
    RuleOnly,
}

/// Reconcile the rule record with whatever the generative adapter produced.
///
/// Unlike a classified answer, a fallback outcome is not fed through
/// [`combine`]: the rule record is returned as is, so a gateway outage never
/// lowers a rule High to Medium.
pub fn reconcile(
    rule: &RiskAssessment,
    generative: &GenerativeOutcome,
    pack: &LocalePack,
) -> (RiskAssessment, ReconciliationPath) {
    match generative {
        GenerativeOutcome::Classified(model) => combine(rule, model, pack),
        GenerativeOutcome::Fallback { .. } => (rule.clone(), ReconciliationPath::RuleOnly),
    }
}

/// Merge two assessments, leaning toward caution.
pub fn combine(
    rule: &RiskAssessment,
    model: &RiskAssessment,
    pack: &LocalePack,
) -> (RiskAssessment, ReconciliationPath) {
    if rule.level == model.level {
        return (rule.clone(), ReconciliationPath::Agreement);
    }

    let texts = &pack.reconciliation;

    if rule.level.rank().abs_diff(model.level.rank()) == 2 {
        let explanation = render(
            &texts.disagreement_explanation,
            &[
                ("rule_level", pack.level_label(rule.level)),
                ("model_level", pack.level_label(model.level)),
            ],
        );
        return (
            RiskAssessment::new(RiskLevel::Medium, explanation, texts.disagreement_next_steps.clone()),
            ReconciliationPath::ExtremeDisagreement,
        );
    }

    let (primary, secondary, source) = if rule.level > model.level {
        (rule, model, AssessmentSource::RuleBased)
    } else {
        (model, rule, AssessmentSource::Generative)
    };

    let mut explanation = primary.explanation.clone();
    if primary.explanation.trim() != secondary.explanation.trim() {
        let note = render(
            &texts.additional_signal,
            &[("level", pack.level_label(secondary.level))],
        );
        explanation = format!("{explanation}\n\n{note}");
    }

    (
        RiskAssessment::new(primary.level, explanation, primary.next_steps.clone()),
        ReconciliationPath::HigherTierWins { primary: source },
    )
}
