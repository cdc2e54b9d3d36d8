//! Generative classifier adapter.
//!
//! Sends the verbatim question/answer pairs to an external language model
//! and turns its reply into a validated `RiskAssessment`. Every failure
//! (transport, timeout, unreadable text, invalid tier) collapses into the
//! locale's conservative fallback record; this module never returns an error.

pub mod client;
pub mod parser;
pub mod prompt;

pub use client::{GatewayError, GenerationRequest, LlmClient, MockLlmClient, OpenAiClient};
pub use parser::parse_classification;
pub use prompt::{build_request, format_responses};

use std::time::Duration;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::locale::LocalePack;
use crate::models::{ResponseSet, RiskAssessment, RiskLevel};

pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_MAX_TOKENS: u32 = 500;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Tunables for one generative classification call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerativeSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Upper bound on each gateway attempt.
    pub timeout: Duration,
    /// Retry once on connection errors, HTTP 429 and 5xx.
    pub retry_transient: bool,
}

impl Default for GenerativeSettings {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
            retry_transient: true,
        }
    }
}

/// Why the adapter fell back instead of classifying.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierFailure {
    #[error("Model reply contained no readable JSON object: {0}")]
    MalformedResponse(String),

    #[error("Model reply is not a valid classification: {0}")]
    InvalidClassification(String),

    #[error("Gateway failure: {0}")]
    Transport(#[from] GatewayError),

    #[error("No reply from the gateway within {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerativeOutcome {
    Classified(RiskAssessment),
    Fallback {
        #[serde(serialize_with = "serialize_failure")]
        failure: ClassifierFailure,
        assessment: RiskAssessment,
    },
}

impl GenerativeOutcome {
    pub fn assessment(&self) -> &RiskAssessment {
        match self {
            Self::Classified(assessment) => assessment,
            Self::Fallback { assessment, .. } => assessment,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

fn serialize_failure<S: Serializer>(failure: &ClassifierFailure, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(failure)
}

/// The record used whenever the model cannot be consulted or understood.
pub fn fallback_assessment(pack: &LocalePack) -> RiskAssessment {
    RiskAssessment::new(
        RiskLevel::Low,
        pack.fallback.explanation.clone(),
        pack.fallback.next_steps.clone(),
    )
}

/// Adapter over an injected gateway client.
pub struct GenerativeClassifier<C: LlmClient> {
    client: C,
    settings: GenerativeSettings,
}

impl<C: LlmClient> GenerativeClassifier<C> {
    pub fn new(client: C, settings: GenerativeSettings) -> Self {
        Self { client, settings }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn settings(&self) -> &GenerativeSettings {
        &self.settings
    }

    /// Classify the responses. Infallible: failures become a fallback outcome.
    pub async fn classify(&self, pack: &LocalePack, responses: &ResponseSet) -> GenerativeOutcome {
        match self.try_classify(pack, responses).await {
            Ok(assessment) => {
                tracing::debug!(level = %assessment.level, locale = %pack.tag, "Model classification accepted");
                GenerativeOutcome::Classified(assessment)
            }
            Err(failure) => {
                tracing::warn!(locale = %pack.tag, error = %failure, "Generative classification failed, using fallback");
                GenerativeOutcome::Fallback {
                    failure,
                    assessment: fallback_assessment(pack),
                }
            }
        }
    }

    async fn try_classify(
        &self,
        pack: &LocalePack,
        responses: &ResponseSet,
    ) -> Result<RiskAssessment, ClassifierFailure> {
        let request = build_request(pack, responses, &self.settings);
        let text = self.generate_with_retry(&request).await?;
        parse_classification(&text, pack)
    }

    async fn generate_with_retry(&self, request: &GenerationRequest) -> Result<String, ClassifierFailure> {
        let max_attempts = if self.settings.retry_transient { 2 } else { 1 };
        let mut attempt = 1;
        loop {
            match self.attempt(request).await {
                Err(ClassifierFailure::Transport(err)) if err.is_transient() && attempt < max_attempts => {
                    tracing::warn!(attempt, error = %err, "Transient gateway failure, retrying");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn attempt(&self, request: &GenerationRequest) -> Result<String, ClassifierFailure> {
        match tokio::time::timeout(self.settings.timeout, self.client.generate(request)).await {
            Err(_elapsed) => Err(ClassifierFailure::TimedOut(self.settings.timeout)),
            Ok(Err(GatewayError::Timeout(secs))) => {
                Err(ClassifierFailure::TimedOut(Duration::from_secs(secs)))
            }
            Ok(Err(err)) => Err(ClassifierFailure::Transport(err)),
            Ok(Ok(text)) => Ok(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HIGH_REPLY: &str =
        r#"{"level": "High", "explanation": "Severe headache with visual changes.", "next_steps": "Seek care today."}"#;

    fn english() -> LocalePack {
        LocalePack::english().unwrap()
    }

    fn responses() -> ResponseSet {
        ResponseSet::new().with("Any headaches?", "Severe headache and blurry vision")
    }

    fn quick_settings() -> GenerativeSettings {
        GenerativeSettings {
            timeout: Duration::from_millis(50),
            ..GenerativeSettings::default()
        }
    }

    #[test]
    fn default_settings() {
        let classifier = GenerativeClassifier::new(MockLlmClient::new(HIGH_REPLY), GenerativeSettings::default());
        let settings = classifier.settings();
        assert_eq!(settings.max_tokens, 500);
        assert!(settings.temperature <= 0.3);
        assert_eq!(settings.timeout, DEFAULT_TIMEOUT);
        assert!(settings.retry_transient);
    }

    #[tokio::test]
    async fn well_formed_reply_is_classified() {
        let classifier = GenerativeClassifier::new(MockLlmClient::new(HIGH_REPLY), quick_settings());
        let outcome = classifier.classify(&english(), &responses()).await;
        assert!(!outcome.is_fallback());
        assert_eq!(outcome.assessment().level, RiskLevel::High);
    }

    #[tokio::test]
    async fn prompt_carries_the_answers() {
        let classifier = GenerativeClassifier::new(MockLlmClient::new(HIGH_REPLY), quick_settings());
        classifier.classify(&english(), &responses()).await;
        let requests = classifier.client().requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].prompt.contains("Severe headache and blurry vision"));
    }

    #[tokio::test]
    async fn prose_reply_falls_back_to_low() {
        let classifier =
            GenerativeClassifier::new(MockLlmClient::new("The patient seems fine to me."), quick_settings());
        let outcome = classifier.classify(&english(), &responses()).await;
        match outcome {
            GenerativeOutcome::Fallback { failure, assessment } => {
                assert!(matches!(failure, ClassifierFailure::MalformedResponse(_)));
                assert_eq!(assessment, fallback_assessment(&english()));
                assert!(assessment.is_well_formed());
            }
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_level_falls_back() {
        let reply = r#"{"level": "Severe", "explanation": "x", "next_steps": "y"}"#;
        let classifier = GenerativeClassifier::new(MockLlmClient::new(reply), quick_settings());
        let outcome = classifier.classify(&english(), &responses()).await;
        assert!(matches!(
            outcome,
            GenerativeOutcome::Fallback { failure: ClassifierFailure::InvalidClassification(_), .. }
        ));
        assert_eq!(outcome.assessment().level, RiskLevel::Low);
    }

    #[tokio::test]
    async fn slow_gateway_times_out() {
        let client = MockLlmClient::new(HIGH_REPLY).with_delay(Duration::from_millis(500));
        let classifier = GenerativeClassifier::new(client, quick_settings());
        let outcome = classifier.classify(&english(), &responses()).await;
        assert!(matches!(
            outcome,
            GenerativeOutcome::Fallback { failure: ClassifierFailure::TimedOut(_), .. }
        ));
        // Timeouts are not retried.
        assert_eq!(classifier.client().call_count(), 1);
    }

    #[tokio::test]
    async fn transient_failure_is_retried_once() {
        let client = MockLlmClient::new(HIGH_REPLY)
            .then(Err(GatewayError::Status { status: 503, body: "busy".into() }));
        let classifier = GenerativeClassifier::new(client, quick_settings());
        let outcome = classifier.classify(&english(), &responses()).await;
        assert_eq!(outcome.assessment().level, RiskLevel::High);
        assert_eq!(classifier.client().call_count(), 2);
    }

    #[tokio::test]
    async fn persistent_connection_failure_gives_up_after_retry() {
        let client = MockLlmClient::failing(GatewayError::Connection("http://localhost:1".into()));
        let classifier = GenerativeClassifier::new(client, quick_settings());
        let outcome = classifier.classify(&english(), &responses()).await;
        assert!(matches!(
            outcome,
            GenerativeOutcome::Fallback { failure: ClassifierFailure::Transport(_), .. }
        ));
        assert_eq!(classifier.client().call_count(), 2);
    }

    #[tokio::test]
    async fn retry_can_be_disabled() {
        let client = MockLlmClient::failing(GatewayError::Connection("http://localhost:1".into()));
        let settings = GenerativeSettings {
            retry_transient: false,
            ..quick_settings()
        };
        let classifier = GenerativeClassifier::new(client, settings);
        classifier.classify(&english(), &responses()).await;
        assert_eq!(classifier.client().call_count(), 1);
    }

    #[tokio::test]
    async fn auth_failure_is_not_retried() {
        let client = MockLlmClient::failing(GatewayError::Status { status: 401, body: "bad key".into() });
        let classifier = GenerativeClassifier::new(client, quick_settings());
        let outcome = classifier.classify(&english(), &responses()).await;
        assert!(outcome.is_fallback());
        assert_eq!(classifier.client().call_count(), 1);
    }

    #[tokio::test]
    async fn arabic_fallback_is_localized() {
        let arabic = LocalePack::arabic().unwrap();
        let client = MockLlmClient::failing(GatewayError::EmptyCompletion);
        let classifier = GenerativeClassifier::new(client, quick_settings());
        let outcome = classifier.classify(&arabic, &responses()).await;
        assert_eq!(outcome.assessment().explanation, arabic.fallback.explanation);
    }

    #[test]
    fn fallback_outcome_serializes_failure_as_text() {
        let outcome = GenerativeOutcome::Fallback {
            failure: ClassifierFailure::TimedOut(Duration::from_secs(30)),
            assessment: fallback_assessment(&english()),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "fallback");
        assert!(json["failure"].as_str().unwrap().contains("30s"));
        assert_eq!(json["assessment"]["level"], "Low");
    }
}
