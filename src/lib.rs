//! # Docchat
//!
//! Conversational question answering over a private document corpus.
//! Combines semantic retrieval with LLM generation while preserving
//! multi-turn conversational context.
//!
//! ## Pipeline
//!
//! ```text
//! query + history
//!   -> context rewrite (standalone query)
//!   -> intent classification (category, entities, answer shape)
//!   -> query expansion (paraphrase variants)
//!   -> retrieval fan-out (merge, dedup, boost, rank, cap)
//!   -> relevance gate (lenient judgment + deterministic overrides)
//!   -> answer synthesis | out-of-scope decline
//!   -> session append
//! ```
//!
//! Document ingestion, embeddings, and the vector index live in
//! external services; the pipeline talks to them through the
//! [`generation::TextGenerator`] and [`retrieval::SemanticIndex`]
//! traits.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use docchat::{ChatRequest, Config, QueryPipeline};
//! use docchat::generation::GenerationClient;
//! use docchat::retrieval::HttpSemanticIndex;
//! use docchat::session::MemorySessionStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let generator = GenerationClient::new(&config.generation, config.request.clone())?;
//!     let index = HttpSemanticIndex::new(&config.retrieval, &config.request)?;
//!     let pipeline = QueryPipeline::new(
//!         Arc::new(MemorySessionStore::new()),
//!         Arc::new(generator),
//!         Arc::new(index),
//!         &config.pipeline,
//!     );
//!     let response = pipeline
//!         .chat(ChatRequest {
//!             query: "How many branches are there?".to_string(),
//!             session_id: "default".to_string(),
//!         })
//!         .await?;
//!     println!("{}", response.answer);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Configuration management.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// Text-generation service client and trait.
pub mod generation;
/// Query orchestration pipeline stages and orchestrator.
pub mod pipeline;
/// Centralized prompt definitions.
pub mod prompts;
/// Semantic retrieval service client and trait.
pub mod retrieval;
/// Per-conversation session store.
pub mod session;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use pipeline::{ChatRequest, ChatResponse, QueryPipeline};
