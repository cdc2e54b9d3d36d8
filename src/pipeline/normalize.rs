use crate::models::ResponseSet;

/// Answers prepared for matching.
///
/// `blob` is every answer lowercased and joined with newlines, so no
/// pattern or two-number reading can straddle two answers. `answers` keeps
/// the per-question view for checks that need a single answer's context.
#[derive(Debug, Clone)]
pub struct NormalizedResponses<'a> {
    pub blob: String,
    pub answers: Vec<&'a str>,
}

pub fn normalize(responses: &ResponseSet) -> NormalizedResponses<'_> {
    let answers: Vec<&str> = responses.answers().collect();
    let blob = answers
        .iter()
        .map(|a| fold_digits(&a.to_lowercase()))
        .collect::<Vec<_>>()
        .join("\n");
    NormalizedResponses { blob, answers }
}

/// Map Eastern Arabic-Indic (U+0660..) and Extended Arabic-Indic (U+06F0..)
/// digits to ASCII.
fn fold_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{0660}'..='\u{0669}' => char::from(b'0' + (c as u32 - 0x0660) as u8),
            '\u{06F0}'..='\u{06F9}' => char::from(b'0' + (c as u32 - 0x06F0) as u8),
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_joins_answers() {
        let set = ResponseSet::new()
            .with("Q1", "Severe HEADACHE")
            .with("Q2", "Blurry Vision");
        let normalized = normalize(&set);
        assert_eq!(normalized.blob, "severe headache\nblurry vision");
        assert_eq!(normalized.answers, ["Severe HEADACHE", "Blurry Vision"]);
    }

    #[test]
    fn folds_arabic_indic_digits() {
        let set = ResponseSet::new().with("ضغط الدم", "١٤٢/٩٥");
        assert_eq!(normalize(&set).blob, "142/95");

        let set = ResponseSet::new().with("Q", "۱۳۵");
        assert_eq!(normalize(&set).blob, "135");
    }

    #[test]
    fn empty_set_gives_empty_blob() {
        let set = ResponseSet::new();
        let normalized = normalize(&set);
        assert!(normalized.blob.is_empty());
        assert!(normalized.answers.is_empty());
    }
}
