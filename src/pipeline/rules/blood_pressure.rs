//! Blood-pressure extraction from free-text answers.
//!
//! Accepts "120/80", "120\80", "120 over 80" (separator words come from the
//! locale pack) and "120 80". A pair is only a reading when it falls in the
//! physiological window, systolic exceeds diastolic and no unit word follows;
//! otherwise scanning resumes at the pair's second number, so "36 150/100"
//! still yields 150/100. With no pair at all, a single standalone number can
//! still count as a systolic value.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::engine::EngineError;
use crate::locale::LocalePack;
use crate::models::RiskLevel;

pub const SYSTOLIC_RANGE: std::ops::RangeInclusive<u16> = 60..=250;
pub const DIASTOLIC_RANGE: std::ops::RangeInclusive<u16> = 40..=150;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodPressureReading {
    pub systolic: u16,
    pub diastolic: u16,
}

impl BloodPressureReading {
    /// `None` when either value is outside the physiological window.
    pub fn new(systolic: u16, diastolic: u16) -> Option<Self> {
        (SYSTOLIC_RANGE.contains(&systolic) && DIASTOLIC_RANGE.contains(&diastolic))
            .then_some(Self { systolic, diastolic })
    }

    /// Tier increment for this reading: +2 high when dangerous,
    /// +1 medium when elevated, nothing otherwise.
    pub fn contribution(&self) -> Option<(RiskLevel, u32)> {
        if self.systolic >= 140 || self.diastolic >= 90 {
            Some((RiskLevel::High, 2))
        } else if (130..140).contains(&self.systolic) || (80..90).contains(&self.diastolic) {
            Some((RiskLevel::Medium, 1))
        } else {
            None
        }
    }

    pub fn category(&self) -> BloodPressureCategory {
        let (s, d) = (self.systolic, self.diastolic);
        if s > 180 || d > 120 {
            BloodPressureCategory::HypertensiveCrisis
        } else if s >= 140 || d >= 90 {
            BloodPressureCategory::HypertensionStage2
        } else if s >= 130 || d >= 80 {
            BloodPressureCategory::HypertensionStage1
        } else if s >= 120 {
            BloodPressureCategory::Elevated
        } else {
            BloodPressureCategory::Normal
        }
    }
}

impl std::fmt::Display for BloodPressureReading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.systolic, self.diastolic)
    }
}

/// Clinical band of a reading. Informational; tier arithmetic uses
/// [`BloodPressureReading::contribution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BloodPressureCategory {
    Normal,
    Elevated,
    HypertensionStage1,
    HypertensionStage2,
    HypertensiveCrisis,
}

/// What the extractor found in the answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PressureSignal {
    Reading(BloodPressureReading),
    Standalone { value: u16 },
}

impl PressureSignal {
    pub fn contribution(&self) -> Option<(RiskLevel, u32)> {
        match self {
            Self::Reading(reading) => reading.contribution(),
            Self::Standalone { value } if *value >= 140 => Some((RiskLevel::High, 1)),
            Self::Standalone { value } if *value >= 130 => Some((RiskLevel::Medium, 1)),
            Self::Standalone { .. } => None,
        }
    }

    pub fn display_value(&self) -> String {
        match self {
            Self::Reading(reading) => reading.to_string(),
            Self::Standalone { value } => value.to_string(),
        }
    }
}

/// Locale-aware pressure extractor, compiled once per locale.
#[derive(Debug)]
pub struct PressureExtractor {
    pair: Regex,
    number: Regex,
    units: Vec<String>,
}

impl PressureExtractor {
    pub fn for_locale(pack: &LocalePack) -> Result<Self, EngineError> {
        // \d is Unicode-aware; digits from scripts the normalizer does not
        // fold fail to parse below and are skipped.
        let mut pair = String::from(r"\b(\d{2,3})(?:[ \t]*[/\\][ \t]*");
        for word in &pack.pressure_separators {
            pair.push_str(r"|[ \t]+");
            pair.push_str(&regex::escape(&word.to_lowercase()));
            pair.push_str(r"[ \t]+");
        }
        pair.push_str(r"|[ \t]+)(\d{2,3})\b");

        let compile = |src: &str| {
            Regex::new(src).map_err(|e| EngineError::InvalidPattern {
                locale: pack.tag.clone(),
                label: "blood pressure".into(),
                message: e.to_string(),
            })
        };

        Ok(Self {
            pair: compile(&pair)?,
            number: compile(r"\b(\d{2,3})\b")?,
            units: pack.non_pressure_units.iter().map(|u| u.to_lowercase()).collect(),
        })
    }

    /// First readable two-number reading, else the first plausible
    /// standalone systolic value.
    pub fn extract(&self, text: &str) -> Option<PressureSignal> {
        self.first_reading(text)
            .map(PressureSignal::Reading)
            .or_else(|| self.first_standalone(text).map(|value| PressureSignal::Standalone { value }))
    }

    fn first_reading(&self, text: &str) -> Option<BloodPressureReading> {
        let mut start = 0;
        while let Some(caps) = self.pair.captures_at(text, start) {
            let (first, second) = (caps.get(1)?, caps.get(2)?);
            if let Some(reading) = self.pair_reading(first.as_str(), second.as_str(), &text[second.end()..]) {
                return Some(reading);
            }
            // The second number may open the next pair.
            start = second.start();
        }
        None
    }

    fn pair_reading(&self, first: &str, second: &str, rest: &str) -> Option<BloodPressureReading> {
        let systolic = parse_number(first)?;
        let diastolic = parse_number(second)?;
        if systolic <= diastolic || self.followed_by_unit(rest) {
            return None;
        }
        BloodPressureReading::new(systolic, diastolic)
    }

    fn first_standalone(&self, text: &str) -> Option<u16> {
        self.number.captures_iter(text).find_map(|caps| {
            let m = caps.get(1)?;
            let value = parse_number(m.as_str())?;
            if !SYSTOLIC_RANGE.contains(&value) || self.followed_by_unit(&text[m.end()..]) {
                return None;
            }
            Some(value)
        })
    }

    fn followed_by_unit(&self, rest: &str) -> bool {
        let token: String = rest
            .trim_start_matches([' ', '\t'])
            .chars()
            .take_while(|c| !c.is_whitespace())
            .collect();
        let token = token.trim_end_matches(['.', ',', '،', ')', ';']);
        !token.is_empty() && self.units.iter().any(|unit| token.starts_with(unit.as_str()))
    }
}

fn parse_number(digits: &str) -> Option<u16> {
    match digits.parse::<u16>() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring unreadable digits in pressure scan");
            None
        }
    }
}
