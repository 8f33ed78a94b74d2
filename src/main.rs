use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use docchat::{
    config::Config,
    generation::GenerationClient,
    pipeline::{ChatRequest, QueryPipeline},
    retrieval::HttpSemanticIndex,
    session::MemorySessionStore,
};

/// Conversational question answering over a private document corpus
#[derive(Debug, Parser)]
#[command(name = "docchat", version, about)]
struct Cli {
    /// One-shot question; reads JSON-line requests from stdin when omitted
    query: Option<String>,

    /// Session identifier for the one-shot question
    #[arg(long, default_value = "default")]
    session: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&config);

    info!(version = env!("CARGO_PKG_VERSION"), "Docchat starting...");

    // Initialize collaborators
    let generator = match GenerationClient::new(&config.generation, config.request.clone()) {
        Ok(c) => {
            info!(base_url = %config.generation.base_url, model = %config.generation.model, "Generation client initialized");
            c
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize generation client");
            return Err(e.into());
        }
    };

    let index = match HttpSemanticIndex::new(&config.retrieval, &config.request) {
        Ok(i) => {
            info!(base_url = %config.retrieval.base_url, "Retrieval client initialized");
            i
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize retrieval client");
            return Err(e.into());
        }
    };

    let pipeline = QueryPipeline::new(
        Arc::new(MemorySessionStore::new()),
        Arc::new(generator),
        Arc::new(index),
        &config.pipeline,
    );

    match cli.query {
        Some(query) => {
            let response = pipeline
                .chat(ChatRequest {
                    query,
                    session_id: cli.session,
                })
                .await?;
            println!("{}", response.answer);
        }
        None => {
            info!("Ready, waiting for JSON-line requests on stdin...");
            run_stdio_loop(&pipeline).await?;
            info!("Shutdown complete");
        }
    }

    Ok(())
}

/// Serve `{"query": ..., "session_id": ...}` requests line by line,
/// writing one JSON response per line to stdout.
async fn run_stdio_loop(pipeline: &QueryPipeline) -> anyhow::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let request: ChatRequest = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                error!(error = %e, "Malformed request line");
                println!(r#"{{"error":"malformed request"}}"#);
                continue;
            }
        };

        match pipeline.chat(request).await {
            Ok(response) => println!("{}", serde_json::to_string(&response)?),
            Err(e) => {
                error!(error = %e, "Request failed");
                println!("{}", serde_json::json!({ "error": e.to_string() }));
            }
        }
    }

    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        docchat::config::LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        docchat::config::LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
