//! Query orchestration pipeline.
//!
//! A linear-with-one-branch state machine that turns a raw user
//! utterance plus conversation history into a grounded answer with
//! cited sources: context rewriting, intent classification, query
//! expansion, retrieval fan-out, a relevance gate, and answer-shape
//! routed synthesis. Data flows forward only; no stage re-enters an
//! earlier stage.

mod answer;
mod expand;
mod gate;
mod intent;
mod retrieve;
mod rewrite;

pub use answer::{AnswerSynthesizer, OUT_OF_SCOPE_MESSAGE, SYNTHESIS_FALLBACK_MESSAGE};
pub use expand::QueryExpander;
pub use gate::RelevanceGate;
pub use intent::{AnswerShape, Intent, IntentClassifier, IntentSignals};
pub use retrieve::{RetrievalEngine, RetrievedDocument};
pub use rewrite::ContextRewriter;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::error::{AppError, AppResult};
use crate::generation::TextGenerator;
use crate::retrieval::SemanticIndex;
use crate::session::{SessionStore, Turn};

/// Pipeline entry request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user utterance; must be non-empty after trimming.
    pub query: String,
    /// Opaque conversation identifier.
    pub session_id: String,
}

/// Pipeline entry response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Final answer text.
    pub answer: String,
    /// Source labels in rank order; may repeat across documents
    /// sharing a source, empty when out of scope.
    pub sources: Vec<String>,
    /// Echo of the request's session identifier.
    pub session_id: String,
}

/// Working record threaded through one pipeline run, discarded after
/// the resulting turns are appended.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    /// Raw user utterance.
    pub raw_query: String,
    /// History snapshot taken at the start of the run.
    pub history: Vec<Turn>,
    /// Rewritten standalone query.
    pub standalone_query: String,
    /// Classifier output: intent, entities, answer shape.
    pub signals: IntentSignals,
    /// Ordered query variants, standalone first.
    pub variants: Vec<String>,
    /// Ranked, capped document list.
    pub documents: Vec<RetrievedDocument>,
    /// Gate decision; false until judged.
    pub relevant: bool,
    /// Final answer text.
    pub answer: String,
}

/// Pipeline stages. One conditional edge, after the gate; both
/// branches terminate in `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Contextualize,
    ClassifyIntent,
    Expand,
    Retrieve,
    CheckRelevance,
    Generate,
    OutOfScope,
    Done,
}

/// Drives the stages in fixed order and appends the resulting turns to
/// the session.
pub struct QueryPipeline {
    store: Arc<dyn SessionStore>,
    rewriter: ContextRewriter,
    classifier: IntentClassifier,
    expander: QueryExpander,
    retriever: RetrievalEngine,
    gate: RelevanceGate,
    synthesizer: AnswerSynthesizer,
    /// Per-session run locks: at most one concurrent run per session
    /// identifier. Runs across different sessions are independent.
    run_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl QueryPipeline {
    /// Assemble the pipeline from its collaborators
    pub fn new(
        store: Arc<dyn SessionStore>,
        generator: Arc<dyn TextGenerator>,
        index: Arc<dyn SemanticIndex>,
        settings: &PipelineConfig,
    ) -> Self {
        Self {
            store,
            rewriter: ContextRewriter::new(Arc::clone(&generator), settings.history_window),
            classifier: IntentClassifier::new(Arc::clone(&generator)),
            expander: QueryExpander::new(Arc::clone(&generator), settings.max_variants),
            retriever: RetrievalEngine::new(
                index,
                settings.primary_k,
                settings.variant_k,
                settings.document_cap,
            ),
            gate: RelevanceGate::new(
                Arc::clone(&generator),
                settings.gate_sample,
                settings.gate_preview_chars,
            ),
            synthesizer: AnswerSynthesizer::new(generator),
            run_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Run one pipeline pass for a chat request.
    ///
    /// Rejects empty or whitespace-only queries before the pipeline
    /// runs. On completion the user turn and the assistant turn are
    /// appended to the session, creating it if needed.
    pub async fn chat(&self, request: ChatRequest) -> AppResult<ChatResponse> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(AppError::Validation {
                field: "query".to_string(),
                reason: "Query cannot be empty".to_string(),
            });
        }

        let session_lock = self.session_lock(&request.session_id).await;
        let _guard = session_lock.lock().await;

        let history = self.store.history(&request.session_id).await?;

        info!(
            session_id = %request.session_id,
            history_turns = history.len(),
            "Pipeline run starting"
        );

        let state = self.run(query, history).await;

        let sources: Vec<String> = if state.relevant {
            state.documents.iter().map(|d| d.source.clone()).collect()
        } else {
            Vec::new()
        };

        self.store
            .append(&request.session_id, Turn::user(query))
            .await?;
        self.store
            .append(
                &request.session_id,
                Turn::assistant(&state.answer).with_sources(sources.clone()),
            )
            .await?;

        Ok(ChatResponse {
            answer: state.answer,
            sources,
            session_id: request.session_id,
        })
    }

    /// Drive the stage machine to completion.
    async fn run(&self, query: &str, history: Vec<Turn>) -> PipelineState {
        let mut state = PipelineState {
            raw_query: query.to_string(),
            history,
            ..Default::default()
        };

        let mut stage = Stage::Contextualize;

        while stage != Stage::Done {
            debug!(stage = ?stage, "Entering stage");
            stage = match stage {
                Stage::Contextualize => {
                    state.standalone_query =
                        self.rewriter.rewrite(&state.raw_query, &state.history).await;
                    Stage::ClassifyIntent
                }
                Stage::ClassifyIntent => {
                    state.signals = self.classifier.classify(&state.standalone_query).await;
                    Stage::Expand
                }
                Stage::Expand => {
                    state.variants = self
                        .expander
                        .expand(&state.standalone_query, state.signals.intent)
                        .await;
                    Stage::Retrieve
                }
                Stage::Retrieve => {
                    state.documents = self
                        .retriever
                        .retrieve(&state.variants, state.signals.intent)
                        .await;
                    Stage::CheckRelevance
                }
                Stage::CheckRelevance => {
                    state.relevant = self
                        .gate
                        .judge(&state.standalone_query, &state.documents)
                        .await;
                    if state.relevant {
                        Stage::Generate
                    } else {
                        Stage::OutOfScope
                    }
                }
                Stage::Generate => {
                    state.answer = self
                        .synthesizer
                        .synthesize(
                            &state.standalone_query,
                            &state.documents,
                            state.signals.shape,
                        )
                        .await;
                    Stage::Done
                }
                Stage::OutOfScope => {
                    state.answer = OUT_OF_SCOPE_MESSAGE.to_string();
                    Stage::Done
                }
                Stage::Done => Stage::Done,
            };
        }

        state
    }

    /// Fetch or create the per-session run lock.
    async fn session_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.run_locks.lock().await;
        Arc::clone(
            locks
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }
}
