use crate::locale::{render, LocalePack};
use crate::models::ResponseSet;

use super::client::GenerationRequest;
use super::GenerativeSettings;

/// Lay out every question/answer pair verbatim, in collection order.
pub fn format_responses(pack: &LocalePack, responses: &ResponseSet) -> String {
    responses
        .iter()
        .map(|qa| {
            format!(
                "{} {}\n{} {}",
                pack.prompt.question_prefix, qa.question, pack.prompt.answer_prefix, qa.answer
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_request(
    pack: &LocalePack,
    responses: &ResponseSet,
    settings: &GenerativeSettings,
) -> GenerationRequest {
    let formatted = format_responses(pack, responses);
    GenerationRequest {
        system: pack.prompt.system.clone(),
        prompt: render(&pack.prompt.template, &[("responses", &formatted)]),
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn responses() -> ResponseSet {
        ResponseSet::new()
            .with("Have you experienced headaches or blurry vision this week?", "yes")
            .with("What was your last recorded blood pressure?", "135/85")
    }

    #[test]
    fn embeds_answers_verbatim_in_order() {
        let pack = LocalePack::english().unwrap();
        let request = build_request(&pack, &responses(), &GenerativeSettings::default());
        let first = request.prompt.find("Q: Have you experienced headaches").unwrap();
        let second = request.prompt.find("Q: What was your last recorded").unwrap();
        assert!(first < second);
        assert!(request.prompt.contains("A: 135/85"));
        assert!(!request.prompt.contains("{responses}"));
    }

    #[test]
    fn carries_decision_guidance() {
        let pack = LocalePack::english().unwrap();
        let request = build_request(&pack, &responses(), &GenerativeSettings::default());
        assert!(request.prompt.contains("bare \"yes\""));
        assert!(request.prompt.contains("140/90"));
        assert!(request.prompt.contains("\"next_steps\""));
    }

    #[test]
    fn uses_low_temperature_and_bounded_output() {
        let pack = LocalePack::english().unwrap();
        let settings = GenerativeSettings::default();
        let request = build_request(&pack, &responses(), &settings);
        assert!(request.temperature <= 0.3);
        assert_eq!(request.max_tokens, settings.max_tokens);
        assert_eq!(request.system, pack.prompt.system);
    }

    #[test]
    fn arabic_prompt_uses_localized_prefixes() {
        let pack = LocalePack::arabic().unwrap();
        let set = ResponseSet::new().with("هل لاحظت تورمًا؟", "نعم");
        let request = build_request(&pack, &set, &GenerativeSettings::default());
        assert!(request.prompt.contains("س: هل لاحظت تورمًا؟"));
        assert!(request.prompt.contains("ج: نعم"));
    }
}
