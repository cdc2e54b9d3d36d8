use serde_json::{Map, Value};

use crate::locale::LocalePack;
use crate::models::RiskAssessment;

use super::ClassifierFailure;

const REQUIRED_FIELDS: [&str; 3] = ["level", "explanation", "next_steps"];

/// Parse model output into a validated record.
///
/// The first well-formed JSON object anywhere in the text is used, so
/// leading or trailing prose and code fences are tolerated. The level may be
/// an English tier in any case or the pack's localized label.
pub fn parse_classification(text: &str, pack: &LocalePack) -> Result<RiskAssessment, ClassifierFailure> {
    let object = first_json_object(text)
        .ok_or_else(|| ClassifierFailure::MalformedResponse("no JSON object found".into()))?;

    let extra: Vec<&str> = object
        .keys()
        .map(String::as_str)
        .filter(|k| !REQUIRED_FIELDS.contains(k))
        .collect();
    if !extra.is_empty() {
        tracing::debug!(?extra, "Ignoring extra fields in classifier response");
    }

    let level_text = required_text(&object, "level")?;
    let explanation = required_text(&object, "explanation")?;
    let next_steps = required_text(&object, "next_steps")?;

    let level = pack.level_from_label(level_text).ok_or_else(|| {
        ClassifierFailure::InvalidClassification(format!("unrecognized level '{level_text}'"))
    })?;

    Ok(RiskAssessment::new(level, explanation.trim(), next_steps.trim()))
}

fn required_text<'a>(object: &'a Map<String, Value>, field: &str) -> Result<&'a str, ClassifierFailure> {
    match object.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s),
        Some(Value::String(_)) => Err(ClassifierFailure::InvalidClassification(format!(
            "field '{field}' is empty"
        ))),
        Some(_) => Err(ClassifierFailure::InvalidClassification(format!(
            "field '{field}' is not text"
        ))),
        None => Err(ClassifierFailure::InvalidClassification(format!(
            "missing field '{field}'"
        ))),
    }
}

/// Try each `{` in turn until one starts a complete JSON object.
fn first_json_object(text: &str) -> Option<Map<String, Value>> {
    text.match_indices('{').find_map(|(start, _)| {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(Value::Object(map))) => Some(map),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskLevel;

    fn english() -> LocalePack {
        LocalePack::english().unwrap()
    }

    #[test]
    fn parses_clean_object() {
        let result = parse_classification(
            r#"{"level": "High", "explanation": "Severe symptoms.", "next_steps": "Go now."}"#,
            &english(),
        )
        .unwrap();
        assert_eq!(result.level, RiskLevel::High);
        assert_eq!(result.explanation, "Severe symptoms.");
        assert_eq!(result.next_steps, "Go now.");
    }

    #[test]
    fn tolerates_surrounding_prose_and_fences() {
        let text = "Sure! Here is my assessment:\n```json\n{\"level\": \"medium\", \"explanation\": \"Elevated reading.\", \"next_steps\": \"Call within 2 days.\"}\n```\nTake care.";
        let result = parse_classification(text, &english()).unwrap();
        assert_eq!(result.level, RiskLevel::Medium);
    }

    #[test]
    fn skips_braces_that_do_not_start_an_object() {
        let text = "Scale {Low..High}: {\"level\": \"LOW\", \"explanation\": \"Fine.\", \"next_steps\": \"Routine care.\"}";
        let result = parse_classification(text, &english()).unwrap();
        assert_eq!(result.level, RiskLevel::Low);
    }

    #[test]
    fn maps_localized_level_label() {
        let arabic = LocalePack::arabic().unwrap();
        let text = r#"{"level": "مرتفع", "explanation": "أعراض شديدة", "next_steps": "اتصلي بالطبيب فوراً"}"#;
        let result = parse_classification(text, &arabic).unwrap();
        assert_eq!(result.level, RiskLevel::High);
    }

    #[test]
    fn prose_only_is_malformed() {
        let err = parse_classification("I think the patient is probably fine.", &english()).unwrap_err();
        assert!(matches!(err, ClassifierFailure::MalformedResponse(_)));
    }

    #[test]
    fn truncated_object_is_malformed() {
        let err = parse_classification(r#"{"level": "High", "explanation": "cut"#, &english()).unwrap_err();
        assert!(matches!(err, ClassifierFailure::MalformedResponse(_)));
    }

    #[test]
    fn missing_field_is_invalid() {
        let err = parse_classification(r#"{"level": "High", "explanation": "x"}"#, &english()).unwrap_err();
        assert!(matches!(err, ClassifierFailure::InvalidClassification(m) if m.contains("next_steps")));
    }

    #[test]
    fn empty_field_is_invalid() {
        let err = parse_classification(
            r#"{"level": "Low", "explanation": "  ", "next_steps": "x"}"#,
            &english(),
        )
        .unwrap_err();
        assert!(matches!(err, ClassifierFailure::InvalidClassification(_)));
    }

    #[test]
    fn non_text_level_is_invalid() {
        let err = parse_classification(
            r#"{"level": 3, "explanation": "x", "next_steps": "y"}"#,
            &english(),
        )
        .unwrap_err();
        assert!(matches!(err, ClassifierFailure::InvalidClassification(_)));
    }

    #[test]
    fn unknown_level_is_invalid() {
        let err = parse_classification(
            r#"{"level": "Critical", "explanation": "x", "next_steps": "y"}"#,
            &english(),
        )
        .unwrap_err();
        assert!(matches!(err, ClassifierFailure::InvalidClassification(m) if m.contains("Critical")));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let result = parse_classification(
            r#"{"level": "Low", "explanation": "x", "next_steps": "y", "confidence": 0.8}"#,
            &english(),
        )
        .unwrap();
        assert_eq!(result.level, RiskLevel::Low);
    }
}
