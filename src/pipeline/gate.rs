//! Relevance gate: decides whether the retrieved evidence can support
//! an answer.
//!
//! The model judgment is lenient by prompt, and a deterministic
//! override layer runs on top of it. The override is one-directional:
//! it can flip a "no" to "yes" on high-precision categories where the
//! generative judgment is unreliable, never the reverse. On service
//! failure the gate fails open toward attempting an answer.

use std::sync::Arc;

use tracing::{info, warn};

use super::retrieve::RetrievedDocument;
use crate::generation::{ChatMessage, TextGenerator};
use crate::prompts::RELEVANCE_CHECK_PROMPT;

/// Query words suggesting a contact/reachability question.
const CONTACT_KEYWORDS: &[&str] = &["email", "contact", "phone", "support", "call", "reach"];
/// Query words suggesting a location/branch question.
const LOCATION_KEYWORDS: &[&str] = &["branch", "office", "location", "address", "where"];
/// Query words suggesting a general information request.
const INFO_KEYWORDS: &[&str] = &["information", "details", "tell me", "what is", "how many"];

/// Gate over the retrieved document set.
pub struct RelevanceGate {
    generator: Arc<dyn TextGenerator>,
    /// Documents sampled as evidence for the judgment.
    sample_size: usize,
    /// Per-document preview length in characters.
    preview_chars: usize,
}

impl RelevanceGate {
    /// Create a new gate
    pub fn new(generator: Arc<dyn TextGenerator>, sample_size: usize, preview_chars: usize) -> Self {
        Self {
            generator,
            sample_size,
            preview_chars,
        }
    }

    /// Judge whether `documents` can support an answer to `query`.
    ///
    /// No documents at all is unconditionally `false`. A failed
    /// generation call defaults to `true` rather than silently refusing.
    pub async fn judge(&self, query: &str, documents: &[RetrievedDocument]) -> bool {
        if documents.is_empty() {
            warn!("No documents to check relevance");
            return false;
        }

        let sample = self.evidence_sample(documents);

        let messages = vec![
            ChatMessage::system(RELEVANCE_CHECK_PROMPT),
            ChatMessage::user(format!(
                "Question: {}\n\nDocuments (showing {} samples):\n{}",
                query,
                documents.len().min(self.sample_size),
                sample
            )),
        ];

        let mut relevant = match self.generator.generate(messages).await {
            Ok(response) => response.to_lowercase().contains("yes"),
            Err(e) => {
                warn!(error = %e, "Relevance check failed, defaulting to relevant");
                return true;
            }
        };

        if !relevant {
            relevant = override_judgment(query, documents, self.sample_size);
        }

        info!(relevant, "Gate decision");
        relevant
    }

    /// Build the labeled evidence sample from the top-ranked documents.
    fn evidence_sample(&self, documents: &[RetrievedDocument]) -> String {
        documents
            .iter()
            .take(self.sample_size)
            .enumerate()
            .map(|(i, doc)| {
                format!(
                    "Document {} (from {}):\n{}",
                    i + 1,
                    doc.source,
                    preview(&doc.text, self.preview_chars)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n---\n\n")
    }
}

/// Deterministic safety net against false negatives.
///
/// Runs only on a "no" judgment and can only force it to "yes":
/// contact questions with contact evidence, location questions with
/// location evidence, and general information requests with any
/// evidence at all.
fn override_judgment(query: &str, documents: &[RetrievedDocument], sample_size: usize) -> bool {
    let query_lower = query.to_lowercase();

    let asking_for_contact = CONTACT_KEYWORDS.iter().any(|kw| query_lower.contains(kw));
    let asking_for_location = LOCATION_KEYWORDS.iter().any(|kw| query_lower.contains(kw));
    let asking_for_info = INFO_KEYWORDS.iter().any(|kw| query_lower.contains(kw));

    let evidence: String = documents
        .iter()
        .take(sample_size)
        .map(|d| d.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let has_contact_info =
        evidence.contains('@') || evidence.contains("email") || evidence.contains("phone");
    let has_location_info = evidence.contains("branch")
        || evidence.contains("office")
        || evidence.contains("location");

    if asking_for_contact && has_contact_info {
        warn!("Override: query asks for contact, documents have contact info");
        return true;
    }
    if asking_for_location && has_location_info {
        warn!("Override: query asks for locations, documents have location info");
        return true;
    }
    if asking_for_info {
        warn!("Override: query asks for information, documents exist");
        return true;
    }

    warn!("Relevance judgment was no, no override applied");
    false
}

/// Character-bounded preview, safe on multi-byte text.
fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::generation::MockTextGenerator;
    use crate::retrieval::ChunkType;

    fn doc(text: &str) -> RetrievedDocument {
        RetrievedDocument {
            text: text.to_string(),
            source: "corpus.pdf".to_string(),
            chunk_id: 0,
            chunk_type: ChunkType::Content,
            distance: 0.3,
            boost: 0.0,
        }
    }

    fn gate_saying(answer: &'static str) -> RelevanceGate {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .returning(move |_| Ok(answer.to_string()));
        RelevanceGate::new(Arc::new(generator), 3, 1000)
    }

    #[tokio::test]
    async fn test_no_documents_is_unconditionally_false() {
        let mut generator = MockTextGenerator::new();
        generator.expect_generate().never();

        let gate = RelevanceGate::new(Arc::new(generator), 3, 1000);
        assert!(!gate.judge("how many branches?", &[]).await);
    }

    #[tokio::test]
    async fn test_yes_judgment_passes() {
        let gate = gate_saying("YES");
        assert!(gate.judge("what products exist?", &[doc("loan products")]).await);
    }

    #[tokio::test]
    async fn test_yes_substring_match_is_case_insensitive() {
        let gate = gate_saying("Yes, the documents cover this.");
        assert!(gate.judge("anything about loans?", &[doc("loans")]).await);
    }

    #[tokio::test]
    async fn test_unparseable_judgment_is_no() {
        let gate = gate_saying("maybe");
        // Query avoids every override keyword.
        assert!(!gate.judge("do you sell cars?", &[doc("banking services")]).await);
    }

    #[tokio::test]
    async fn test_contact_override_flips_no_to_yes() {
        let gate = gate_saying("NO");
        let docs = [doc("Write to helpdesk@example.com for assistance")];
        assert!(gate.judge("What is the customer support email?", &docs).await);
    }

    #[tokio::test]
    async fn test_location_override_flips_no_to_yes() {
        let gate = gate_saying("NO");
        let docs = [doc("Our branch network spans twelve cities")];
        assert!(gate.judge("Where is the nearest branch?", &docs).await);
    }

    #[tokio::test]
    async fn test_info_override_needs_only_evidence() {
        let gate = gate_saying("NO");
        let docs = [doc("quarterly revenue figures")];
        assert!(gate.judge("Tell me about the company results", &docs).await);
    }

    #[tokio::test]
    async fn test_no_override_when_nothing_matches() {
        let gate = gate_saying("NO");
        let docs = [doc("loan eligibility criteria")];
        assert!(!gate.judge("Can you write a poem?", &docs).await);
    }

    #[tokio::test]
    async fn test_override_never_flips_yes_to_no() {
        // A yes stays yes even for queries no override rule matches.
        let gate = gate_saying("YES");
        let docs = [doc("loan eligibility criteria")];
        assert!(gate.judge("Can you write a poem?", &docs).await);
    }

    #[tokio::test]
    async fn test_service_failure_fails_open() {
        let mut generator = MockTextGenerator::new();
        generator.expect_generate().returning(|_| {
            Err(GenerationError::Unavailable {
                message: "down".to_string(),
                retries: 3,
            })
        });

        let gate = RelevanceGate::new(Arc::new(generator), 3, 1000);
        assert!(gate.judge("anything", &[doc("some evidence")]).await);
    }

    #[test]
    fn test_preview_is_char_safe() {
        assert_eq!(preview("héllo wörld", 5), "héllo");
        assert_eq!(preview("short", 100), "short");
    }

    #[test]
    fn test_override_only_samples_top_documents() {
        // Contact evidence beyond the sample window must not trigger
        // the contact override.
        let docs = [
            doc("nothing here"),
            doc("still nothing"),
            doc("nothing again"),
            doc("helpdesk@example.com"),
        ];
        assert!(!override_judgment("support email please", &docs, 3));
    }
}
