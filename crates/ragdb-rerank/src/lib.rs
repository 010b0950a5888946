//! Cross-encoder reranker.
//!
//! Scores (query, document) pairs with a causal LM prompted for a
//! yes/no relevance judgment; the relevance score is the softmax
//! probability of "yes" against "no" at the last position. The model is
//! loaded lazily on first use and cached for the life of the process.

#![deny(warnings)]
#![deny(unused_imports)]

pub mod model;
pub mod prompt;
pub mod scoring;

use std::sync::Arc;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use tokio::sync::OnceCell;

use ragdb_core::config::RerankerConfig;
use ragdb_core::traits::Reranker;
use ragdb_core::{Error, Result};

pub use model::CrossEncoder;

type RerankerFactory = dyn Fn() -> AnyResult<Arc<dyn Reranker>> + Send + Sync + 'static;

/// Once-only lazy wrapper around a reranker backend. Concurrent first
/// callers share a single load instead of racing a check-then-assign.
pub struct LazyReranker {
    factory: Box<RerankerFactory>,
    cell: OnceCell<Arc<dyn Reranker>>,
}

impl LazyReranker {
    pub fn new(
        factory: impl Fn() -> AnyResult<Arc<dyn Reranker>> + Send + Sync + 'static,
    ) -> Self {
        Self { factory: Box::new(factory), cell: OnceCell::new() }
    }

    async fn inner(&self) -> Result<&Arc<dyn Reranker>> {
        self.cell
            .get_or_try_init(|| async {
                (self.factory)().map_err(|e| Error::collaborator("reranker", e))
            })
            .await
    }
}

#[async_trait]
impl Reranker for LazyReranker {
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        instruction: Option<&str>,
    ) -> Result<Vec<f32>> {
        self.inner().await?.rerank(query, documents, instruction).await
    }
}

/// Default reranker wiring: a lazily loaded [`CrossEncoder`].
pub fn default_reranker(config: &RerankerConfig) -> Arc<dyn Reranker> {
    let cfg = config.clone();
    Arc::new(LazyReranker::new(move || {
        Ok(Arc::new(CrossEncoder::load(&cfg)?) as Arc<dyn Reranker>)
    }))
}
