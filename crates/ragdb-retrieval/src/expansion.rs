//! Query expansion through the language model.
//!
//! One query becomes four variants, each behind a fixed line label. A
//! malformed or partial reply never fails the request: missing slots
//! are padded with the original query and a warning is logged.

use std::sync::Arc;

use ragdb_core::traits::LanguageModel;
use ragdb_core::Result;

/// Fixed line prefixes, in slot order.
pub const VARIANT_LABELS: [&str; 4] = ["SPECIFIC:", "BROADER:", "KEYWORDS:", "CONTEXTUAL:"];

pub struct QueryExpander {
    language_model: Arc<dyn LanguageModel>,
    /// Working language of the knowledge base; variants are requested
    /// in this language regardless of the query's language.
    language: String,
}

impl QueryExpander {
    pub fn new(language_model: Arc<dyn LanguageModel>, language: impl Into<String>) -> Self {
        Self { language_model, language: language.into() }
    }

    /// Always returns exactly four variants. Collaborator failures
    /// propagate; parsing shortfalls degrade to padding.
    pub async fn expand(&self, query: &str, context: Option<&str>) -> Result<Vec<String>> {
        let prompt = build_prompt(query, context, &self.language);
        let reply = self.language_model.complete(&prompt).await?;
        let (variants, missing) = parse_variants(&reply, query);
        if missing > 0 {
            tracing::warn!(
                missing,
                "expansion reply incomplete, padding missing variants with the original query"
            );
        }
        Ok(variants)
    }
}

pub fn build_prompt(query: &str, context: Option<&str>, language: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "You rewrite a search query into four alternative phrasings to broaden \
         retrieval over a knowledge base.\n\n",
    );
    if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
        prompt.push_str("Conversation so far:\n");
        prompt.push_str(context.trim());
        prompt.push_str("\n\n");
    }
    prompt.push_str(&format!("Query: {query}\n\n"));
    prompt.push_str(&format!(
        "Reply with exactly four lines and nothing else, every line written in {language} \
         regardless of the query's language:\n\
         SPECIFIC: <a narrower, more precise phrasing>\n\
         BROADER: <a wider phrasing covering the surrounding topic>\n\
         KEYWORDS: <the key terms only, space separated>\n\
         CONTEXTUAL: <a phrasing that folds in the conversation context>\n"
    ));
    prompt
}

/// Fill the four labeled slots from the reply; unfilled slots fall back
/// to the original query. Returns the variants and how many slots were
/// padded.
pub fn parse_variants(reply: &str, original: &str) -> (Vec<String>, usize) {
    let mut slots: [Option<String>; 4] = [None, None, None, None];
    for line in reply.lines() {
        let line = line.trim().trim_start_matches(['-', '*']).trim_start();
        for (i, label) in VARIANT_LABELS.iter().enumerate() {
            if slots[i].is_some() {
                continue;
            }
            if let Some(rest) = line.strip_prefix(label) {
                let rest = rest.trim();
                if !rest.is_empty() {
                    slots[i] = Some(rest.to_string());
                }
            }
        }
    }
    let missing = slots.iter().filter(|s| s.is_none()).count();
    let variants = slots
        .into_iter()
        .map(|s| s.unwrap_or_else(|| original.to_string()))
        .collect();
    (variants, missing)
}
