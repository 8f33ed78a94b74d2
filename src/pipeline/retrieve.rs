//! Retrieval fan-out: one index search per query variant, merged,
//! deduplicated, boosted by intent, and ranked.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::intent::Intent;
use crate::retrieval::{ChunkType, ScoredChunk, SemanticIndex};

/// Boost per distinct intent keyword found in a document.
const KEYWORD_BOOST: f64 = 0.03;
/// Upper bound of the keyword component of the boost.
const KEYWORD_BOOST_CAP: f64 = 0.15;
/// Flat bonus for structured-summary chunks.
const SUMMARY_BOOST: f64 = 0.10;

/// A retrieved document after merging and boosting. Immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDocument {
    /// Document text content.
    pub text: String,
    /// Source document label.
    pub source: String,
    /// Chunk position within its source.
    pub chunk_id: u32,
    /// Content-type flag from ingestion.
    pub chunk_type: ChunkType,
    /// Raw similarity distance (lower = more similar).
    pub distance: f64,
    /// Intent-driven relevance boost, in `[0.0, 0.25]`.
    pub boost: f64,
}

impl RetrievedDocument {
    fn from_chunk(chunk: ScoredChunk, intent: Intent) -> Self {
        let boost = relevance_boost(&chunk, intent);
        Self {
            text: chunk.text,
            source: chunk.metadata.source,
            chunk_id: chunk.metadata.chunk_id,
            chunk_type: chunk.metadata.chunk_type,
            distance: chunk.distance,
            boost,
        }
    }

    /// Final ranking key: raw distance minus boost, lower is better.
    pub fn adjusted_score(&self) -> f64 {
        self.distance - self.boost
    }
}

/// Compute the relevance boost for a candidate chunk.
///
/// 0.03 per distinct intent keyword found as a case-insensitive
/// substring, capped at 0.15, plus a flat 0.10 for structured-summary
/// chunks. The boost reorders results toward intent-matching and
/// summary content without altering the underlying similarity metric.
fn relevance_boost(chunk: &ScoredChunk, intent: Intent) -> f64 {
    let text_lower = chunk.text.to_lowercase();

    let matches = intent
        .keywords()
        .iter()
        .filter(|kw| text_lower.contains(*kw))
        .count();

    let mut boost = (matches as f64 * KEYWORD_BOOST).min(KEYWORD_BOOST_CAP);

    if chunk.metadata.chunk_type == ChunkType::StructuredSummary {
        boost += SUMMARY_BOOST;
    }

    boost
}

/// Issues one search per variant and produces the ranked, capped
/// document list.
pub struct RetrievalEngine {
    index: Arc<dyn SemanticIndex>,
    /// Neighbors requested for the standalone query.
    primary_k: usize,
    /// Neighbors requested for each subsequent variant.
    variant_k: usize,
    /// Ranked documents kept after merging.
    document_cap: usize,
}

impl RetrievalEngine {
    /// Create a new retrieval engine
    pub fn new(
        index: Arc<dyn SemanticIndex>,
        primary_k: usize,
        variant_k: usize,
        document_cap: usize,
    ) -> Self {
        Self {
            index,
            primary_k,
            variant_k,
            document_cap,
        }
    }

    /// Retrieve for every variant in order, merge, dedup, boost, rank.
    ///
    /// The first variant is the standalone query and gets deeper
    /// coverage. Duplicate texts are dropped on first-occurrence-wins
    /// terms, even when a later retrieval scored them better. A failed
    /// search for one variant degrades to an empty result for that
    /// variant only.
    pub async fn retrieve(&self, variants: &[String], intent: Intent) -> Vec<RetrievedDocument> {
        let mut merged: Vec<RetrievedDocument> = Vec::new();
        let mut seen_texts: HashSet<String> = HashSet::new();

        for (i, variant) in variants.iter().enumerate() {
            let k = if i == 0 { self.primary_k } else { self.variant_k };

            let chunks = match self.index.search(variant, k).await {
                Ok(chunks) => chunks,
                Err(e) => {
                    warn!(variant = %variant, error = %e, "Search failed for variant");
                    Vec::new()
                }
            };

            debug!(
                variant = i + 1,
                total = variants.len(),
                results = chunks.len(),
                "Variant searched"
            );

            for chunk in chunks {
                if seen_texts.contains(&chunk.text) {
                    continue;
                }
                seen_texts.insert(chunk.text.clone());
                merged.push(RetrievedDocument::from_chunk(chunk, intent));
            }
        }

        merged.sort_by(|a, b| {
            a.adjusted_score()
                .partial_cmp(&b.adjusted_score())
                .unwrap_or(Ordering::Equal)
        });
        merged.truncate(self.document_cap);

        let summaries = merged
            .iter()
            .filter(|d| d.chunk_type == ChunkType::StructuredSummary)
            .count();
        info!(
            unique = merged.len(),
            structured_summaries = summaries,
            intent = ?intent,
            "Retrieval fan-out complete"
        );

        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RetrievalError;
    use crate::retrieval::{ChunkMetadata, MockSemanticIndex};

    fn chunk(text: &str, distance: f64) -> ScoredChunk {
        ScoredChunk {
            text: text.to_string(),
            metadata: ChunkMetadata {
                source: "corpus.pdf".to_string(),
                chunk_id: 0,
                chunk_type: ChunkType::Content,
            },
            distance,
        }
    }

    fn summary_chunk(text: &str, distance: f64) -> ScoredChunk {
        let mut c = chunk(text, distance);
        c.metadata.chunk_type = ChunkType::StructuredSummary;
        c
    }

    fn engine(index: MockSemanticIndex) -> RetrievalEngine {
        RetrievalEngine::new(Arc::new(index), 15, 10, 30)
    }

    #[test]
    fn test_boost_accumulates_per_distinct_keyword() {
        let c = chunk("Visit our branch office at this location", 0.2);
        let boost = relevance_boost(&c, Intent::Location);
        // branch, office, location, visit = 4 keywords
        assert!((boost - 0.12).abs() < 1e-9);
    }

    #[test]
    fn test_keyword_boost_capped() {
        let c = chunk("branch office location address visit center", 0.2);
        assert!((relevance_boost(&c, Intent::Location) - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_summary_bonus_stacks_up_to_bound() {
        let c = summary_chunk("branch office location address visit center", 0.2);
        let boost = relevance_boost(&c, Intent::Location);
        assert!((boost - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_general_intent_gets_no_keyword_boost() {
        let c = chunk("branch office location", 0.2);
        assert_eq!(relevance_boost(&c, Intent::General), 0.0);
    }

    #[test]
    fn test_boost_bound_holds_for_arbitrary_text() {
        let texts = [
            "phone email contact support helpline phone email",
            "",
            "rate price cost fee charge interest apr rate rate",
        ];
        for (text, intent) in texts
            .iter()
            .flat_map(|t| [Intent::Contact, Intent::Pricing, Intent::General].map(|i| (*t, i)))
        {
            let boost = relevance_boost(&summary_chunk(text, 0.5), intent);
            assert!((0.0..=0.25).contains(&boost), "boost {} out of bound", boost);
        }
    }

    #[tokio::test]
    async fn test_dedup_first_occurrence_wins() {
        let mut index = MockSemanticIndex::new();
        index
            .expect_search()
            .withf(|q, _| q == "original")
            .returning(|_, _| Ok(vec![chunk("shared text", 0.40), chunk("only first", 0.30)]));
        index
            .expect_search()
            .withf(|q, _| q == "variant")
            .returning(|_, _| {
                // Better distance for the duplicate, still dropped.
                Ok(vec![chunk("shared text", 0.10), chunk("only second", 0.20)])
            });

        let docs = engine(index)
            .retrieve(&["original".to_string(), "variant".to_string()], Intent::General)
            .await;

        assert_eq!(docs.len(), 3);
        let shared: Vec<_> = docs.iter().filter(|d| d.text == "shared text").collect();
        assert_eq!(shared.len(), 1);
        assert!((shared[0].distance - 0.40).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_k_depends_on_variant_position() {
        let mut index = MockSemanticIndex::new();
        index
            .expect_search()
            .withf(|q, k| q == "first" && *k == 15)
            .times(1)
            .returning(|_, _| Ok(vec![]));
        index
            .expect_search()
            .withf(|q, k| q == "second" && *k == 10)
            .times(1)
            .returning(|_, _| Ok(vec![]));

        engine(index)
            .retrieve(&["first".to_string(), "second".to_string()], Intent::General)
            .await;
    }

    #[tokio::test]
    async fn test_cap_applied_after_merge() {
        let mut index = MockSemanticIndex::new();
        index.expect_search().returning(|_, _| {
            Ok((0..40).map(|i| chunk(&format!("doc {}", i), 0.01 * i as f64)).collect())
        });

        let docs = engine(index)
            .retrieve(&["a".to_string()], Intent::General)
            .await;
        assert_eq!(docs.len(), 30);
    }

    #[tokio::test]
    async fn test_sorted_by_adjusted_score() {
        let mut index = MockSemanticIndex::new();
        index.expect_search().returning(|_, _| {
            Ok(vec![
                chunk("no keywords here at all", 0.20),
                summary_chunk("branch office location summary", 0.20),
                chunk("middle doc", 0.15),
            ])
        });

        let docs = engine(index)
            .retrieve(&["q".to_string()], Intent::Location)
            .await;

        for pair in docs.windows(2) {
            assert!(pair[0].adjusted_score() <= pair[1].adjusted_score());
        }
    }

    #[tokio::test]
    async fn test_boosted_summary_outranks_plain_doc_at_equal_distance() {
        let mut index = MockSemanticIndex::new();
        index.expect_search().returning(|_, _| {
            Ok(vec![
                chunk("nothing relevant in this text", 0.20),
                summary_chunk(
                    "branch office location address visit center summary",
                    0.20,
                ),
            ])
        });

        let docs = engine(index)
            .retrieve(&["q".to_string()], Intent::Location)
            .await;

        assert_eq!(docs[0].chunk_type, ChunkType::StructuredSummary);
        assert!((docs[0].adjusted_score() - (-0.05)).abs() < 1e-9);
        assert!((docs[1].adjusted_score() - 0.20).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_failed_variant_degrades_to_empty() {
        let mut index = MockSemanticIndex::new();
        index
            .expect_search()
            .withf(|q, _| q == "good")
            .returning(|_, _| Ok(vec![chunk("found", 0.1)]));
        index
            .expect_search()
            .withf(|q, _| q == "bad")
            .returning(|_, _| {
                Err(RetrievalError::InvalidResponse {
                    message: "boom".to_string(),
                })
            });

        let docs = engine(index)
            .retrieve(&["good".to_string(), "bad".to_string()], Intent::General)
            .await;
        assert_eq!(docs.len(), 1);
    }
}
