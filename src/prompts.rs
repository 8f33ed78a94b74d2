//! Centralized prompt definitions for pipeline stages
//!
//! This module contains all system prompts sent to the text-generation
//! service. Centralizing prompts makes them easier to maintain, test,
//! and version.

/// System prompt for rewriting a follow-up question into a standalone query.
///
/// The user message carries the recent conversation transcript and the
/// current question.
pub const CONTEXT_REWRITE_PROMPT: &str = r#"Given the conversation history, rewrite the current question to be standalone with full context.

Fold in any referenced context: resolve pronouns, implicit subjects, and
references to earlier answers. Respond with the rewritten question only,
no explanation or commentary."#;

/// System prompt for intent classification.
///
/// The response is parsed line by line; every field has a documented
/// default when missing (see `pipeline::intent`).
pub const INTENT_CLASSIFIER_PROMPT: &str = r#"Classify the user's intent and extract key information.

Classify into ONE primary category:
- LOCATION_INFO: Questions about branches, addresses, offices, where to visit
- PRODUCT_INFO: Questions about loans, services, products, offerings
- ELIGIBILITY: Questions about who qualifies, requirements, criteria
- PROCESS: Questions about how to do something, application steps
- PRICING: Questions about rates, costs, fees, charges
- CONTACT: Questions about phone, email, customer support
- COMPANY_INFO: General company information, history, overview
- FAQ: General questions, help

Also extract:
- Key entities mentioned (city names, product names, numbers)
- What type of answer is needed (count, list, specific detail, explanation)

Format your response EXACTLY as:
INTENT: [category]
ENTITIES: [comma-separated list]
ANSWER_TYPE: [count/list/specific/explanation]"#;

/// System prompt for generating query paraphrase variants.
pub const QUERY_EXPANSION_PROMPT: &str = r#"You are a query reformulation expert. Generate 4 alternative phrasings of the question.

Generate variations that:
1. Use synonyms (office->branch, cost->price, get->apply for)
2. Rephrase structure (How many X? -> Total number of X, List all X)
3. Be more specific (add relevant domain terms)
4. Use different question formats

Provide exactly 4 variations, one per line, without numbering."#;

/// System prompt for the lenient relevance judgment.
///
/// The response is reduced to a boolean by a case-insensitive "yes"
/// substring match; a deterministic override layer runs on top of it
/// (see `pipeline::gate`).
pub const RELEVANCE_CHECK_PROMPT: &str = r#"You are a relevance checker. Determine if the documents can help answer the question.

IMPORTANT RULES - BE LENIENT:

1. If documents contain CONTACT INFORMATION (emails, phones) and the user asks for "contact", "email", "phone", "support" -> Answer YES

2. If documents contain COMPANY INFORMATION and the user asks about the company -> Answer YES

3. If documents contain LOCATION/BRANCH data and the user asks about locations -> Answer YES

4. If documents contain METRICS/STATISTICS and the user asks about metrics/numbers -> Answer YES

5. If documents contain ANY information that could partially answer the question -> Answer YES

6. Only answer NO if the documents are COMPLETELY UNRELATED to the topic
(e.g., the user asks about cars but the documents are about banking)

Answer with ONE WORD ONLY (YES or NO)."#;

/// System prompt for count/list answers that must enumerate exhaustively.
pub const ENUMERATION_ANSWER_PROMPT: &str = r#"You are a helpful AI assistant. Answer based ONLY on the provided context.

IMPORTANT INSTRUCTIONS:
- Answer naturally without mentioning "according to documents" or "sources"
- If asked "how many", count ALL items carefully and provide the exact number
- If asked to list, enumerate ALL items found
- Be comprehensive and specific
- Use a natural conversational tone"#;

/// System prompt for narrative answers to specific or explanatory questions.
pub const NARRATIVE_ANSWER_PROMPT: &str = r#"You are a helpful AI assistant. Answer based ONLY on the provided context.

IMPORTANT:
- Answer naturally in a conversational tone
- Strictly answer the asked question alone, do not add unrelated information
- Don't mention sources or documents
- Provide clear, complete information
- If the information is in the context, answer confidently"#;
