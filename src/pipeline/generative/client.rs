use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::EngineConfig;

/// What the adapter asks the language-model gateway for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
    /// Kept low for run-to-run consistency.
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Language-model gateway is not reachable at {0}")]
    Connection(String),

    #[error("Gateway returned error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Gateway request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Unreadable gateway response: {0}")]
    ResponseParsing(String),

    #[error("Gateway returned no completion")]
    EmptyCompletion,
}

impl GatewayError {
    /// Failures worth a single retry: unreachable host, rate limiting,
    /// server-side errors.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Capability to turn a prompt into raw model text.
///
/// Injected into the generative classifier so tests can run against
/// [`MockLlmClient`] with no network.
pub trait LlmClient: Send + Sync {
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<String, GatewayError>> + Send;
}

// ═══════════════════════════════════════════════════════════
// OpenAI-compatible gateway
// ═══════════════════════════════════════════════════════════

/// Chat-completions client. Works against OpenAI and any server exposing
/// the same `/chat/completions` route (Ollama's `/v1` included).
pub struct OpenAiClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl OpenAiClient {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.to_string(),
            client,
            timeout_secs: timeout.as_secs(),
        })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, GatewayError> {
        Self::new(
            &config.base_url,
            config.api_key.clone(),
            &config.model,
            config.request_timeout,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Request body for `/chat/completions`
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

/// Response body from `/chat/completions`
#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl LlmClient for OpenAiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GatewayError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let mut builder = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_connect() {
                GatewayError::Connection(self.base_url.clone())
            } else if e.is_timeout() {
                GatewayError::Timeout(self.timeout_secs)
            } else {
                GatewayError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::ResponseParsing(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(GatewayError::EmptyCompletion)
    }
}

// ═══════════════════════════════════════════════════════════
// Test double
// ═══════════════════════════════════════════════════════════

/// Scripted LLM client: queued replies first, then the default.
pub struct MockLlmClient {
    scripted: Mutex<VecDeque<Result<String, GatewayError>>>,
    default_reply: Result<String, GatewayError>,
    delay: Option<Duration>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            scripted: Mutex::new(VecDeque::new()),
            default_reply: Ok(response.to_string()),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: GatewayError) -> Self {
        Self {
            default_reply: Err(error),
            ..Self::new("")
        }
    }

    /// Queue a reply served before the default one.
    pub fn then(self, reply: Result<String, GatewayError>) -> Self {
        self.scripted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply);
        self
    }

    /// Sleep before answering, to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl LlmClient for MockLlmClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GatewayError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self
            .scripted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        scripted.unwrap_or_else(|| self.default_reply.clone())
    }
}
