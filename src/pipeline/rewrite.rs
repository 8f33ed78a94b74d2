//! Follow-up rewriting against recent conversation history.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::generation::{ChatMessage, TextGenerator};
use crate::prompts::CONTEXT_REWRITE_PROMPT;
use crate::session::Turn;

/// Rewrites a follow-up utterance into a standalone query.
pub struct ContextRewriter {
    generator: Arc<dyn TextGenerator>,
    /// Most recent turns folded into the transcript.
    history_window: usize,
}

impl ContextRewriter {
    /// Create a new rewriter
    pub fn new(generator: Arc<dyn TextGenerator>, history_window: usize) -> Self {
        Self {
            generator,
            history_window,
        }
    }

    /// Rewrite `query` to be standalone given the session history.
    ///
    /// Skipped entirely when fewer than 2 prior turns exist; one full
    /// user/assistant exchange is enough context to rewrite against.
    /// A failed generation call falls back silently to the original
    /// utterance; this stage never aborts the pipeline.
    pub async fn rewrite(&self, query: &str, history: &[Turn]) -> String {
        if history.len() < 2 {
            debug!("No context needed - first query or short history");
            return query.to_string();
        }

        let window = if history.len() > self.history_window {
            &history[history.len() - self.history_window..]
        } else {
            history
        };

        let transcript: Vec<String> = window
            .iter()
            .map(|turn| format!("{}: {}", turn.role, turn.content))
            .collect();

        let messages = vec![
            ChatMessage::system(CONTEXT_REWRITE_PROMPT),
            ChatMessage::user(format!(
                "Conversation History:\n{}\n\nCurrent Question: {}",
                transcript.join("\n"),
                query
            )),
        ];

        match self.generator.generate(messages).await {
            Ok(rewritten) => {
                let rewritten = rewritten.trim().to_string();
                debug!(original = %query, standalone = %rewritten, "Query rewritten");
                rewritten
            }
            Err(e) => {
                warn!(error = %e, "Context rewrite failed, using original query");
                query.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::generation::MockTextGenerator;

    fn turns(n: usize) -> Vec<Turn> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    Turn::user(format!("question {}", i))
                } else {
                    Turn::assistant(format!("answer {}", i))
                }
            })
            .collect()
    }

    #[tokio::test]
    async fn test_short_history_skips_rewrite() {
        let mut generator = MockTextGenerator::new();
        generator.expect_generate().never();

        let rewriter = ContextRewriter::new(Arc::new(generator), 6);
        let out = rewriter.rewrite("What are its hours?", &turns(1)).await;
        assert_eq!(out, "What are its hours?");

        let mut generator = MockTextGenerator::new();
        generator.expect_generate().never();
        let rewriter = ContextRewriter::new(Arc::new(generator), 6);
        let out = rewriter.rewrite("What are its hours?", &[]).await;
        assert_eq!(out, "What are its hours?");
    }

    #[tokio::test]
    async fn test_one_full_exchange_invokes_rewrite() {
        // A single prior user/assistant exchange is already a follow-up
        // situation; the rewriter must run.
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|_| Ok("What are the Chennai branch working hours?\n".to_string()));

        let rewriter = ContextRewriter::new(Arc::new(generator), 6);
        let history = vec![
            Turn::user("Where is the Chennai branch?"),
            Turn::assistant("The Chennai branch is at 12 Mount Road."),
        ];
        let out = rewriter.rewrite("What are its working hours?", &history).await;
        assert_eq!(out, "What are the Chennai branch working hours?");
    }

    #[tokio::test]
    async fn test_transcript_bounded_to_window() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .withf(|messages| {
                let user_msg = &messages[1].content;
                // 10 turns of history, window of 6: turn 3 must be
                // outside the transcript, turn 4 inside.
                !user_msg.contains("question 2") && user_msg.contains("answer 5")
            })
            .times(1)
            .returning(|_| Ok("standalone".to_string()));

        let rewriter = ContextRewriter::new(Arc::new(generator), 6);
        rewriter.rewrite("follow-up", &turns(10)).await;
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_original() {
        let mut generator = MockTextGenerator::new();
        generator.expect_generate().returning(|_| {
            Err(GenerationError::Timeout { timeout_ms: 1000 })
        });

        let rewriter = ContextRewriter::new(Arc::new(generator), 6);
        let out = rewriter.rewrite("What about fees?", &turns(4)).await;
        assert_eq!(out, "What about fees?");
    }
}
