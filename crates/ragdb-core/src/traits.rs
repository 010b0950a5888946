//! Collaborator contracts consumed by the retrieval strategies.
//!
//! All calls are async so a strategy can suspend at every external call
//! boundary; dropping the returned future cancels the in-flight work and
//! no partial result set is ever observable.

use crate::error::Result;
use crate::types::{Candidate, SearchFilters};
use async_trait::async_trait;

/// Converts text to a fixed-dimension vector. `dim()` must match the
/// store's indexed dimension for the deployment.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    fn dim(&self) -> usize;
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Similarity search over indexed chunks. Results are ordered by
/// ascending distance; `similarity_score` is `1 - cosine_distance`.
/// `filters` restricts by metadata, OR-combined when several are set.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn query(
        &self,
        vector: &[f32],
        limit: usize,
        filters: Option<&SearchFilters>,
    ) -> Result<Vec<Candidate>>;
}

/// Scores (query, document) pairs with a cross-encoder style model.
/// Output length and order match `documents` exactly; each score is in
/// [0, 1] with higher meaning more relevant.
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        instruction: Option<&str>,
    ) -> Result<Vec<f32>>;
}

/// Plain completion interface to the language model used for query
/// expansion. The engine owns prompt construction and reply parsing.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}
