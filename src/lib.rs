pub mod config;
pub mod engine;
pub mod locale;
pub mod models;
pub mod pipeline;

pub use config::EngineConfig;
pub use engine::{EngineError, RiskAnalysis, RiskEngine};
pub use locale::{LocalePack, LocaleRegistry};
pub use models::{ResponseSet, RiskAssessment, RiskLevel};
pub use pipeline::generative::{GenerativeSettings, LlmClient, MockLlmClient, OpenAiClient};

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();
}
