//! Intent classification for the standalone query.
//!
//! The model response is untrusted free text; parsing is line-oriented
//! and total, with a documented default for every field that is missing
//! or malformed. A failed generation call degrades to all defaults and
//! never blocks retrieval.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::generation::{ChatMessage, TextGenerator};
use crate::prompts::INTENT_CLASSIFIER_PROMPT;

/// Closed set of query intent categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Branches, addresses, offices, where to visit.
    Location,
    /// Loans, services, products, offerings.
    Product,
    /// Who qualifies, requirements, criteria.
    Eligibility,
    /// How to do something, application steps.
    Process,
    /// Rates, costs, fees, charges.
    Pricing,
    /// Phone, email, customer support.
    Contact,
    /// Company information, history, overview.
    Company,
    /// General questions; the parsing default.
    #[default]
    General,
}

impl Intent {
    /// Parse a classifier label. Unrecognized labels map to `General`.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_uppercase().as_str() {
            "LOCATION_INFO" => Intent::Location,
            "PRODUCT_INFO" => Intent::Product,
            "ELIGIBILITY" => Intent::Eligibility,
            "PROCESS" => Intent::Process,
            "PRICING" => Intent::Pricing,
            "CONTACT" => Intent::Contact,
            "COMPANY_INFO" => Intent::Company,
            _ => Intent::General,
        }
    }

    /// Topical keywords used by the retrieval engine for relevance
    /// boosting (never filtering). `General` contributes none.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Intent::Location => &["branch", "office", "location", "address", "visit", "center"],
            Intent::Product => &["loan", "service", "product", "offer", "finance"],
            Intent::Eligibility => &[
                "eligibility",
                "qualify",
                "requirement",
                "criteria",
                "condition",
            ],
            Intent::Process => &["application", "apply", "process", "step", "how to", "procedure"],
            Intent::Pricing => &["rate", "price", "cost", "fee", "charge", "interest", "apr"],
            Intent::Contact => &["phone", "email", "contact", "support", "helpline"],
            Intent::Company => &["company", "about", "overview", "history", "mission"],
            Intent::General => &[],
        }
    }
}

/// Expected answer shape, used to route synthesis templates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerShape {
    /// An exact number is expected.
    Count,
    /// An exhaustive enumeration is expected.
    List,
    /// A specific detail is expected.
    Specific,
    /// A narrative explanation; the parsing default.
    #[default]
    Explanation,
}

impl AnswerShape {
    /// Parse an answer-shape label. Unrecognized labels map to
    /// `Explanation`.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "count" => AnswerShape::Count,
            "list" => AnswerShape::List,
            "specific" => AnswerShape::Specific,
            _ => AnswerShape::Explanation,
        }
    }

    /// Whether synthesis should use the exhaustive enumeration template.
    pub fn wants_enumeration(&self) -> bool {
        matches!(self, AnswerShape::Count | AnswerShape::List)
    }
}

/// Parsed classifier output carried through the pipeline state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntentSignals {
    /// Primary intent category.
    pub intent: Intent,
    /// Free-text entities extracted from the query.
    pub entities: Vec<String>,
    /// Expected answer shape.
    pub shape: AnswerShape,
}

impl IntentSignals {
    /// Parse the classifier's line-oriented response.
    ///
    /// Expected lines are `INTENT:`, `ENTITIES:`, and `ANSWER_TYPE:`;
    /// any field not found keeps its default (`General`, empty,
    /// `Explanation`). Total over arbitrary input.
    pub fn parse(response: &str) -> Self {
        let mut signals = IntentSignals::default();

        for line in response.lines() {
            let line = line.trim();
            if let Some(value) = line.strip_prefix("INTENT:") {
                signals.intent = Intent::parse(value);
            } else if let Some(value) = line.strip_prefix("ENTITIES:") {
                signals.entities = value
                    .split(',')
                    .map(|e| e.trim().to_string())
                    .filter(|e| !e.is_empty() && !e.eq_ignore_ascii_case("none"))
                    .collect();
            } else if let Some(value) = line.strip_prefix("ANSWER_TYPE:") {
                signals.shape = AnswerShape::parse(value);
            }
        }

        signals
    }
}

/// Labels the standalone query with intent, entities, and answer shape.
pub struct IntentClassifier {
    generator: Arc<dyn TextGenerator>,
}

impl IntentClassifier {
    /// Create a new classifier
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Classify the standalone query. Best-effort: a failed generation
    /// call returns all defaults rather than blocking retrieval.
    pub async fn classify(&self, query: &str) -> IntentSignals {
        let messages = vec![
            ChatMessage::system(INTENT_CLASSIFIER_PROMPT),
            ChatMessage::user(format!("Question: {}", query)),
        ];

        match self.generator.generate(messages).await {
            Ok(response) => {
                let signals = IntentSignals::parse(&response);
                debug!(
                    intent = ?signals.intent,
                    shape = ?signals.shape,
                    entities = signals.entities.len(),
                    "Intent classified"
                );
                signals
            }
            Err(e) => {
                warn!(error = %e, "Intent classification failed, using defaults");
                IntentSignals::default()
            }
        }
    }
}
