//! Expansion + fan-out + rerank.
//!
//! The original query is expanded into four variants; each variant is
//! searched independently with the same oversampling as the rerank
//! strategy; results are merged first-occurrence-wins and the merged
//! pool is reranked against the original query.

use std::sync::Arc;

use async_trait::async_trait;

use ragdb_core::traits::{EmbeddingClient, Reranker, VectorStore};
use ragdb_core::types::{Candidate, Message, RankedResult, SearchFilters};
use ragdb_core::Result;

use crate::expansion::QueryExpander;
use crate::merge::merge_candidates;
use crate::query::{format_context, latest_query};
use crate::{oversample_limit, rank_and_truncate, validate_request, SearchStrategy};

/// How many recent turns feed the expansion context.
const CONTEXT_TURNS: usize = 5;

pub struct AdvancedSearch {
    embedder: Arc<dyn EmbeddingClient>,
    store: Arc<dyn VectorStore>,
    reranker: Arc<dyn Reranker>,
    expander: QueryExpander,
}

impl AdvancedSearch {
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        store: Arc<dyn VectorStore>,
        reranker: Arc<dyn Reranker>,
        expander: QueryExpander,
    ) -> Self {
        Self { embedder, store, reranker, expander }
    }
}

#[async_trait]
impl SearchStrategy for AdvancedSearch {
    async fn search(
        &self,
        history: &[Message],
        top_k: usize,
        filters: Option<&SearchFilters>,
    ) -> Result<Vec<RankedResult>> {
        let query = latest_query(history);
        validate_request(&query, top_k)?;

        // The turn holding the query is excluded so the context does
        // not repeat it.
        let context = format_context(history, CONTEXT_TURNS, 1);
        let context = (!context.is_empty()).then_some(context.as_str());
        let variants = self.expander.expand(&query, context).await?;
        let fetch = oversample_limit(top_k);
        tracing::debug!(top_k, fetch, variants = variants.len(), "advanced search");

        // Variants are searched one at a time; merging only starts
        // after every variant has returned.
        let mut batches: Vec<Vec<Candidate>> = Vec::with_capacity(variants.len());
        for variant in &variants {
            let vector = self.embedder.embed(variant).await?;
            batches.push(self.store.query(&vector, fetch, filters).await?);
        }

        let merged = merge_candidates(batches);
        if merged.is_empty() {
            return Ok(Vec::new());
        }

        // Reranking judges relevance to the original query, not to any
        // variant.
        let documents: Vec<String> = merged.iter().map(|c| c.chunk.text.clone()).collect();
        let scores = self.reranker.rerank(&query, &documents, None).await?;
        rank_and_truncate(merged, scores, top_k)
    }
}
