//! Direct vector search, no reranking.

use std::sync::Arc;

use async_trait::async_trait;

use ragdb_core::traits::{EmbeddingClient, VectorStore};
use ragdb_core::types::{Message, RankedResult, SearchFilters};
use ragdb_core::Result;

use crate::query::latest_query;
use crate::{validate_request, SearchStrategy};

pub struct SimpleSearch {
    embedder: Arc<dyn EmbeddingClient>,
    store: Arc<dyn VectorStore>,
}

impl SimpleSearch {
    pub fn new(embedder: Arc<dyn EmbeddingClient>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }
}

#[async_trait]
impl SearchStrategy for SimpleSearch {
    async fn search(
        &self,
        history: &[Message],
        top_k: usize,
        filters: Option<&SearchFilters>,
    ) -> Result<Vec<RankedResult>> {
        let query = latest_query(history);
        validate_request(&query, top_k)?;
        tracing::debug!(top_k, "simple search");

        let vector = self.embedder.embed(&query).await?;
        let candidates = self.store.query(&vector, top_k, filters).await?;

        // Store order is already descending similarity.
        Ok(candidates
            .into_iter()
            .map(|candidate| RankedResult::from_candidate(candidate, None))
            .collect())
    }
}
