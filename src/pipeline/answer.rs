//! Answer synthesis from retrieved context, plus the fixed
//! out-of-scope decline.

use std::sync::Arc;

use tracing::{debug, error, info};

use super::intent::AnswerShape;
use super::retrieve::RetrievedDocument;
use crate::generation::{ChatMessage, TextGenerator};
use crate::prompts::{ENUMERATION_ANSWER_PROMPT, NARRATIVE_ANSWER_PROMPT};

/// Returned when the final generation call fails after a passing gate.
pub const SYNTHESIS_FALLBACK_MESSAGE: &str =
    "I apologize, but I encountered an error generating the response. Please try again.";

/// Returned when the gate rejects the retrieved set. Deterministic,
/// always the same text, no external call.
pub const OUT_OF_SCOPE_MESSAGE: &str = "I don't have information about that in my knowledge base. \
I can only answer questions about the documents that have been uploaded. \
Please ask questions related to the available documents, such as:\n\
- Company information\n\
- Branch locations\n\
- Products and services\n\
- Policies and procedures";

/// Produces the final answer text from the retrieved context.
pub struct AnswerSynthesizer {
    generator: Arc<dyn TextGenerator>,
}

impl AnswerSynthesizer {
    /// Create a new synthesizer
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Synthesize an answer from all retained documents.
    ///
    /// Count/list shapes use the exhaustive enumeration template;
    /// everything else uses the narrative template. A failed generation
    /// call returns the fixed apology rather than propagating.
    pub async fn synthesize(
        &self,
        query: &str,
        documents: &[RetrievedDocument],
        shape: AnswerShape,
    ) -> String {
        let context = context_block(documents);

        let system_prompt = if shape.wants_enumeration() {
            debug!(shape = ?shape, "Using enumeration answer template");
            ENUMERATION_ANSWER_PROMPT
        } else {
            debug!(shape = ?shape, "Using narrative answer template");
            NARRATIVE_ANSWER_PROMPT
        };

        let messages = vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(format!(
                "Context:\n{}\n\nQuestion: {}",
                context, query
            )),
        ];

        match self.generator.generate(messages).await {
            Ok(answer) => {
                info!(chars = answer.len(), "Answer generated");
                answer
            }
            Err(e) => {
                error!(error = %e, "Answer synthesis failed");
                SYNTHESIS_FALLBACK_MESSAGE.to_string()
            }
        }
    }
}

/// Concatenate documents into a `[Source i]`-labeled context block.
fn context_block(documents: &[RetrievedDocument]) -> String {
    documents
        .iter()
        .enumerate()
        .map(|(i, doc)| format!("[Source {}]\n{}", i + 1, doc.text))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}
