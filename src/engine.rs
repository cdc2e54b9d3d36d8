//! Risk engine entry point.
//!
//! Resolves the locale, runs the rule classifier and the generative adapter
//! side by side, then reconciles the two records. Business-level failures
//! never surface here; only contract violations (missing or unknown locale)
//! are returned as errors.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::locale::{LocalePack, LocaleRegistry};
use crate::models::{ResponseSet, RiskAssessment};
use crate::pipeline::generative::{
    GatewayError, GenerativeClassifier, GenerativeOutcome, GenerativeSettings, LlmClient, OpenAiClient,
};
use crate::pipeline::normalize::normalize;
use crate::pipeline::reconcile::{reconcile, ReconciliationPath};
use crate::pipeline::rules::{RuleAssessment, RuleClassifier};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No locale given")]
    EmptyLocale,

    #[error("Unsupported locale: {0}")]
    UnsupportedLocale(String),

    #[error("Invalid locale pack: {0}")]
    InvalidPack(String),

    #[error("Invalid pattern '{label}' in locale '{locale}': {message}")]
    InvalidPattern {
        locale: String,
        label: String,
        message: String,
    },

    #[error("Gateway setup failed: {0}")]
    Gateway(#[from] GatewayError),
}

/// Full record of one analysis, for audit logging by collaborators.
#[derive(Debug, Clone, Serialize)]
pub struct RiskAnalysis {
    pub analysis_id: Uuid,
    pub assessed_at: DateTime<Utc>,
    pub locale: String,
    pub assessment: RiskAssessment,
    pub rule: RuleAssessment,
    pub generative: GenerativeOutcome,
    pub reconciliation: ReconciliationPath,
}

struct LocaleRuntime {
    pack: Arc<LocalePack>,
    rules: RuleClassifier,
}

/// Safety-biased risk engine. Read-only after construction, so one
/// instance can serve concurrent sessions.
pub struct RiskEngine<C: LlmClient> {
    registry: LocaleRegistry,
    locales: Vec<LocaleRuntime>,
    generative: GenerativeClassifier<C>,
}

impl RiskEngine<OpenAiClient> {
    /// Engine backed by the OpenAI-compatible gateway described by `config`.
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        let client = OpenAiClient::from_config(config)?;
        tracing::info!(model = client.model(), base_url = %config.base_url, "Using OpenAI-compatible gateway");
        Self::new(client, config.generative_settings())
    }
}

impl<C: LlmClient> RiskEngine<C> {
    /// Engine with the built-in locales.
    pub fn new(client: C, settings: GenerativeSettings) -> Result<Self, EngineError> {
        Self::with_registry(client, settings, LocaleRegistry::builtin()?)
    }

    /// Engine serving exactly the locales in `registry`. Every indicator
    /// pattern is compiled here; a bad pattern fails construction.
    pub fn with_registry(
        client: C,
        settings: GenerativeSettings,
        registry: LocaleRegistry,
    ) -> Result<Self, EngineError> {
        let locales = registry
            .packs()
            .iter()
            .map(|pack| {
                let pack = Arc::new(pack.clone());
                Ok(LocaleRuntime {
                    rules: RuleClassifier::new(Arc::clone(&pack))?,
                    pack,
                })
            })
            .collect::<Result<Vec<_>, EngineError>>()?;

        tracing::debug!(locales = locales.len(), "Risk engine ready");
        Ok(Self {
            registry,
            locales,
            generative: GenerativeClassifier::new(client, settings),
        })
    }

    pub fn registry(&self) -> &LocaleRegistry {
        &self.registry
    }

    pub fn client(&self) -> &C {
        self.generative.client()
    }

    /// Classify the responses and return the single final assessment.
    pub async fn analyze_risk(
        &self,
        responses: &ResponseSet,
        locale: &str,
    ) -> Result<RiskAssessment, EngineError> {
        Ok(self.analyze_risk_detailed(responses, locale).await?.assessment)
    }

    /// Same as [`analyze_risk`](Self::analyze_risk), with the intermediate
    /// records attached. Dropping the future cancels any in-flight gateway call.
    pub async fn analyze_risk_detailed(
        &self,
        responses: &ResponseSet,
        locale: &str,
    ) -> Result<RiskAnalysis, EngineError> {
        let runtime = self.runtime_for(locale)?;
        let analysis_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "analyze_risk",
            %analysis_id,
            locale = %runtime.pack.tag,
            answers = responses.len()
        );

        async move {
            let rule_pass = async {
                let normalized = normalize(responses);
                runtime.rules.classify(&normalized)
            };
            let (rule, generative) = tokio::join!(
                rule_pass,
                self.generative.classify(&runtime.pack, responses)
            );

            let (assessment, reconciliation) = reconcile(&rule.assessment, &generative, &runtime.pack);
            tracing::info!(
                rule_level = %rule.assessment.level,
                model_level = %generative.assessment().level,
                model_fallback = generative.is_fallback(),
                final_level = %assessment.level,
                ?reconciliation,
                "Risk assessed"
            );

            Ok(RiskAnalysis {
                analysis_id,
                assessed_at: Utc::now(),
                locale: runtime.pack.tag.clone(),
                assessment,
                rule,
                generative,
                reconciliation,
            })
        }
        .instrument(span)
        .await
    }

    fn runtime_for(&self, locale: &str) -> Result<&LocaleRuntime, EngineError> {
        let pack = self.registry.resolve(locale)?;
        self.locales
            .iter()
            .find(|runtime| runtime.pack.tag == pack.tag)
            .ok_or_else(|| EngineError::UnsupportedLocale(locale.to_string()))
    }
}
