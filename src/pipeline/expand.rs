//! Query expansion into paraphrase variants for retrieval fan-out.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use super::intent::Intent;
use crate::generation::{ChatMessage, TextGenerator};
use crate::prompts::QUERY_EXPANSION_PROMPT;

/// Variants shorter than this (after trimming enumeration markers) are
/// discarded as noise.
const MIN_VARIANT_LEN: usize = 10;

/// Generates alternative phrasings of the standalone query.
pub struct QueryExpander {
    generator: Arc<dyn TextGenerator>,
    /// Maximum paraphrase variants kept in addition to the original.
    max_variants: usize,
}

impl QueryExpander {
    /// Create a new expander
    pub fn new(generator: Arc<dyn TextGenerator>, max_variants: usize) -> Self {
        Self {
            generator,
            max_variants,
        }
    }

    /// Expand the standalone query into an ordered variant list.
    ///
    /// The standalone query is always first; at most `max_variants`
    /// parsed paraphrases follow, deduplicated case-insensitively in
    /// first-seen order. A failed generation call degrades to the
    /// single-element list `[query]`.
    pub async fn expand(&self, query: &str, intent: Intent) -> Vec<String> {
        let messages = vec![
            ChatMessage::system(QUERY_EXPANSION_PROMPT),
            ChatMessage::user(format!(
                "Original Question: {}\nUser Intent: {:?}",
                query, intent
            )),
        ];

        let variants = match self.generator.generate(messages).await {
            Ok(response) => parse_variants(&response, self.max_variants),
            Err(e) => {
                warn!(error = %e, "Query expansion failed, using original query only");
                Vec::new()
            }
        };

        let mut all = Vec::with_capacity(variants.len() + 1);
        all.push(query.to_string());
        all.extend(variants);

        let deduped = dedup_case_insensitive(all);
        debug!(count = deduped.len(), "Query variants ready");
        deduped
    }
}

/// Parse paraphrase lines from the expander response.
///
/// Leading enumeration markers (digits, dots, dashes, spaces) are
/// stripped; lines at or under the minimum length are dropped; at most
/// `max` lines are kept.
fn parse_variants(response: &str, max: usize) -> Vec<String> {
    response
        .lines()
        .map(|line| line.trim_start_matches(['0', '1', '2', '3', '4', '5', '6', '7', '8', '9', '.', '-', ' ']).trim())
        .filter(|line| line.len() > MIN_VARIANT_LEN)
        .take(max)
        .map(|line| line.to_string())
        .collect()
}

/// Deduplicate preserving first-seen order, comparing lowercased text.
fn dedup_case_insensitive(queries: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(queries.len());
    for q in queries {
        if seen.insert(q.to_lowercase()) {
            unique.push(q);
        }
    }
    unique
}
