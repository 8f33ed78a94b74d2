//! Text-generation service client and types.
//!
//! Every pipeline stage that needs model assistance goes through the
//! [`TextGenerator`] trait so stages can be exercised against mocks.
//! The production implementation is an OpenAI-compatible chat
//! completions client ([`GenerationClient`]).

mod client;
mod types;

pub use client::GenerationClient;
pub use types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, MessageRole, Usage};

use async_trait::async_trait;

use crate::error::GenerationResult;

/// Synchronous (from the pipeline's point of view) text generation.
///
/// Implementations may fail; every call site in the pipeline defines a
/// documented fallback and never lets the failure abort the run.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for the given conversation.
    async fn generate(&self, messages: Vec<ChatMessage>) -> GenerationResult<String>;
}
