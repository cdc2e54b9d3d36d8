//! Locale packs: everything language-specific the engine needs, as data.
//!
//! A pack carries the indicator tables, affirmative tokens, blood-pressure
//! separator words, prompt template and every sentence the engine can emit
//! for one language. Packs are plain JSON, so a new locale is a new document
//! handed to [`LocaleRegistry::register`], not new code.

use serde::{Deserialize, Serialize};

use crate::engine::EngineError;
use crate::models::RiskLevel;

const ENGLISH_PACK: &str = include_str!("packs/en.json");
const ARABIC_PACK: &str = include_str!("packs/ar.json");

/// One weighted indicator phrase. `pattern` is a regular expression,
/// word-boundary anchored, matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorPattern {
    pub label: String,
    pub pattern: String,
}

/// Ordered indicator sets per tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorTable {
    pub high: Vec<IndicatorPattern>,
    pub medium: Vec<IndicatorPattern>,
    pub low: Vec<IndicatorPattern>,
}

impl IndicatorTable {
    pub fn tier(&self, level: RiskLevel) -> &[IndicatorPattern] {
        match level {
            RiskLevel::High => &self.high,
            RiskLevel::Medium => &self.medium,
            RiskLevel::Low => &self.low,
        }
    }
}

/// Localized display names for the canonical tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelLabels {
    pub low: String,
    pub medium: String,
    pub high: String,
}

/// An explanation / next-steps sentence pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPair {
    pub explanation: String,
    pub next_steps: String,
}

/// One text pair per rule decision branch. `high_with_moderate` and
/// `single_high` may contain an `{indicator}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTexts {
    pub reassuring: TextPair,
    pub multiple_high: TextPair,
    pub high_with_moderate: TextPair,
    pub single_high: TextPair,
    pub multiple_moderate: TextPair,
    pub moderate_with_reassuring: TextPair,
    pub single_moderate: TextPair,
    pub no_concern: TextPair,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub system: String,
    pub question_prefix: String,
    pub answer_prefix: String,
    /// Must contain a `{responses}` placeholder.
    pub template: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationTexts {
    /// Placeholders: `{rule_level}`, `{model_level}`.
    pub disagreement_explanation: String,
    pub disagreement_next_steps: String,
    /// Placeholder: `{level}`.
    pub additional_signal: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalePack {
    pub tag: String,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub affirmatives: Vec<String>,
    #[serde(default)]
    pub pressure_separators: Vec<String>,
    #[serde(default)]
    pub non_pressure_units: Vec<String>,
    /// Placeholder: `{reading}`.
    pub reading_label: String,
    pub indicators: IndicatorTable,
    pub level_labels: LevelLabels,
    pub rule_texts: RuleTexts,
    pub prompt: PromptTemplate,
    pub fallback: TextPair,
    pub reconciliation: ReconciliationTexts,
}

impl LocalePack {
    /// Parse and validate a pack from its JSON document.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let pack: LocalePack =
            serde_json::from_str(json).map_err(|e| EngineError::InvalidPack(e.to_string()))?;
        pack.validate()?;
        Ok(pack)
    }

    pub fn english() -> Result<Self, EngineError> {
        Self::from_json(ENGLISH_PACK)
    }

    pub fn arabic() -> Result<Self, EngineError> {
        Self::from_json(ARABIC_PACK)
    }

    /// Whether `tag` names this pack, by tag or alias, ignoring case.
    pub fn answers_to(&self, tag: &str) -> bool {
        let wanted = tag.trim().to_lowercase();
        self.tag.to_lowercase() == wanted
            || self.aliases.iter().any(|a| a.to_lowercase() == wanted)
    }

    pub fn level_label(&self, level: RiskLevel) -> &str {
        match level {
            RiskLevel::Low => &self.level_labels.low,
            RiskLevel::Medium => &self.level_labels.medium,
            RiskLevel::High => &self.level_labels.high,
        }
    }

    /// Map a tier token to its canonical level: English tokens in any case,
    /// or this pack's localized label.
    pub fn level_from_label(&self, label: &str) -> Option<RiskLevel> {
        let label = label.trim();
        RiskLevel::from_english(label).or_else(|| {
            RiskLevel::ALL
                .into_iter()
                .find(|level| self.level_label(*level).trim().to_lowercase() == label.to_lowercase())
        })
    }

    /// Whether a trimmed answer is nothing but an affirmative token.
    pub fn is_bare_affirmative(&self, answer: &str) -> bool {
        let cleaned = answer
            .trim()
            .trim_end_matches(['.', '!', ',', '،', '؛'])
            .trim()
            .to_lowercase();
        !cleaned.is_empty() && self.affirmatives.iter().any(|a| a.to_lowercase() == cleaned)
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.tag.trim().is_empty() {
            return Err(EngineError::InvalidPack("locale tag is empty".into()));
        }
        if !self.prompt.template.contains("{responses}") {
            return Err(EngineError::InvalidPack(format!(
                "prompt template for '{}' has no {{responses}} placeholder",
                self.tag
            )));
        }
        let texts = &self.rule_texts;
        let pairs = [
            &texts.reassuring,
            &texts.multiple_high,
            &texts.high_with_moderate,
            &texts.single_high,
            &texts.multiple_moderate,
            &texts.moderate_with_reassuring,
            &texts.single_moderate,
            &texts.no_concern,
            &self.fallback,
        ];
        if pairs
            .iter()
            .any(|p| p.explanation.trim().is_empty() || p.next_steps.trim().is_empty())
        {
            return Err(EngineError::InvalidPack(format!(
                "pack '{}' has an empty explanation or next-steps text",
                self.tag
            )));
        }
        Ok(())
    }
}

/// The set of locales an engine can serve.
#[derive(Debug, Clone, Default)]
pub struct LocaleRegistry {
    packs: Vec<LocalePack>,
}

impl LocaleRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// English and Arabic, the locales the conversation front end ships with.
    pub fn builtin() -> Result<Self, EngineError> {
        let mut registry = Self::empty();
        registry.register(LocalePack::english()?);
        registry.register(LocalePack::arabic()?);
        Ok(registry)
    }

    /// Add a pack, replacing any existing pack with the same tag.
    pub fn register(&mut self, pack: LocalePack) {
        match self.packs.iter_mut().find(|p| p.tag == pack.tag) {
            Some(existing) => *existing = pack,
            None => self.packs.push(pack),
        }
    }

    pub fn packs(&self) -> &[LocalePack] {
        &self.packs
    }

    pub fn resolve(&self, tag: &str) -> Result<&LocalePack, EngineError> {
        if tag.trim().is_empty() {
            return Err(EngineError::EmptyLocale);
        }
        self.packs
            .iter()
            .find(|p| p.answers_to(tag))
            .ok_or_else(|| EngineError::UnsupportedLocale(tag.to_string()))
    }
}

/// Substitute `{name}` placeholders in a pack sentence.
pub(crate) fn render(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |text, (name, value)| {
        text.replace(&format!("{{{name}}}"), value)
    })
}
