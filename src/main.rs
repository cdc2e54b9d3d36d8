use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

use gravilog_lib::config::{self, EngineConfig};
use gravilog_lib::{EngineError, ResponseSet, RiskEngine};

#[derive(Parser)]
#[command(name = "gravilog", about = "Pregnancy symptom risk assessment")]
#[command(version)]
struct Cli {
    /// Request document `{ "locale": "en", "responses": { "<question>": "<answer>" } }`.
    /// Read from stdin when omitted.
    input: Option<PathBuf>,

    /// Override the request's locale tag.
    #[arg(short, long)]
    locale: Option<String>,

    /// Print the full analysis (rule findings, model outcome, reconciliation path).
    #[arg(short, long)]
    detailed: bool,
}

#[derive(Debug, Deserialize)]
struct AnalysisRequest {
    #[serde(default)]
    locale: String,
    responses: ResponseSet,
}

#[derive(Error, Debug)]
enum CliError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

fn read_input(path: Option<&PathBuf>) -> Result<String, CliError> {
    match path {
        Some(path) => std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.display().to_string(),
            source,
        }),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|source| CliError::Io {
                    path: "<stdin>".into(),
                    source,
                })?;
            Ok(buffer)
        }
    }
}

async fn run(cli: Cli) -> Result<String, CliError> {
    let request: AnalysisRequest = serde_json::from_str(&read_input(cli.input.as_ref())?)?;
    let locale = cli.locale.unwrap_or(request.locale);

    let engine = RiskEngine::from_config(&EngineConfig::from_env())?;
    let analysis = engine
        .analyze_risk_detailed(&request.responses, &locale)
        .await?;

    let output = if cli.detailed {
        serde_json::to_string_pretty(&analysis)?
    } else {
        serde_json::to_string_pretty(&analysis.assessment)?
    };
    Ok(output)
}

#[tokio::main]
async fn main() {
    gravilog_lib::init_tracing();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let cli = Cli::parse();
    match run(cli).await {
        Ok(output) => println!("{output}"),
        Err(err) => {
            tracing::error!(error = %err, "Risk analysis failed");
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
