use std::env;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub generation: GenerationConfig,
    pub retrieval: RetrievalConfig,
    pub logging: LoggingConfig,
    pub request: RequestConfig,
    pub pipeline: PipelineConfig,
}

/// Text-generation service configuration (OpenAI-compatible chat completions)
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
}

/// Semantic retrieval service configuration
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    pub base_url: String,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

/// Pipeline tuning parameters
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Turns of history folded into a follow-up rewrite.
    pub history_window: usize,
    /// Paraphrase variants requested from the expander.
    pub max_variants: usize,
    /// Neighbors requested for the standalone query.
    pub primary_k: usize,
    /// Neighbors requested for each subsequent variant.
    pub variant_k: usize,
    /// Ranked documents passed downstream after merging.
    pub document_cap: usize,
    /// Documents sampled as evidence by the relevance gate.
    pub gate_sample: usize,
    /// Per-document preview length for the gate sample.
    pub gate_preview_chars: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let generation = GenerationConfig {
            api_key: env::var("GENERATION_API_KEY").map_err(|_| AppError::Config {
                message: "GENERATION_API_KEY is required".to_string(),
            })?,
            base_url: env::var("GENERATION_BASE_URL")
                .unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string()),
            model: env::var("GENERATION_MODEL")
                .unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string()),
            temperature: env::var("GENERATION_TEMPERATURE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.1),
        };

        let retrieval = RetrievalConfig {
            base_url: env::var("RETRIEVAL_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8100".to_string()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30000),
            max_retries: env::var("MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            retry_delay_ms: env::var("RETRY_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1000),
        };

        Ok(Config {
            generation,
            retrieval,
            logging,
            request,
            pipeline: PipelineConfig::default(),
        })
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30000,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            history_window: 6,
            max_variants: 4,
            primary_k: 15,
            variant_k: 10,
            document_cap: 30,
            gate_sample: 3,
            gate_preview_chars: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_defaults() {
        let p = PipelineConfig::default();
        assert_eq!(p.history_window, 6);
        assert_eq!(p.max_variants, 4);
        assert_eq!(p.primary_k, 15);
        assert_eq!(p.variant_k, 10);
        assert_eq!(p.document_cap, 30);
        assert_eq!(p.gate_sample, 3);
    }

    #[test]
    fn test_request_defaults() {
        let r = RequestConfig::default();
        assert_eq!(r.timeout_ms, 30000);
        assert_eq!(r.max_retries, 3);
    }
}
