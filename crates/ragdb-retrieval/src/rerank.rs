//! Two-stage search: oversample by vector similarity, re-score with the
//! cross-encoder, keep the best `top_k`.

use std::sync::Arc;

use async_trait::async_trait;

use ragdb_core::traits::{EmbeddingClient, Reranker, VectorStore};
use ragdb_core::types::{Message, RankedResult, SearchFilters};
use ragdb_core::Result;

use crate::query::latest_query;
use crate::{oversample_limit, rank_and_truncate, validate_request, SearchStrategy};

pub struct RerankSearch {
    embedder: Arc<dyn EmbeddingClient>,
    store: Arc<dyn VectorStore>,
    reranker: Arc<dyn Reranker>,
}

impl RerankSearch {
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        store: Arc<dyn VectorStore>,
        reranker: Arc<dyn Reranker>,
    ) -> Self {
        Self { embedder, store, reranker }
    }
}

#[async_trait]
impl SearchStrategy for RerankSearch {
    async fn search(
        &self,
        history: &[Message],
        top_k: usize,
        filters: Option<&SearchFilters>,
    ) -> Result<Vec<RankedResult>> {
        let query = latest_query(history);
        validate_request(&query, top_k)?;
        let fetch = oversample_limit(top_k);
        tracing::debug!(top_k, fetch, "rerank search");

        let vector = self.embedder.embed(&query).await?;
        let candidates = self.store.query(&vector, fetch, filters).await?;
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let documents: Vec<String> = candidates.iter().map(|c| c.chunk.text.clone()).collect();
        let scores = self.reranker.rerank(&query, &documents, None).await?;
        rank_and_truncate(candidates, scores, top_k)
    }
}
