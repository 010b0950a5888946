//! Strategy construction and dependency validation. No I/O happens
//! here; collaborators are only wired, never called.

use std::sync::Arc;

use ragdb_core::traits::{EmbeddingClient, LanguageModel, Reranker, VectorStore};
use ragdb_core::types::StrategyKind;
use ragdb_core::{Error, Result};

use crate::expansion::QueryExpander;
use crate::{AdvancedSearch, RerankSearch, SearchStrategy, SimpleSearch};

/// Everything a deployment may hand to the factory. `simple` needs the
/// embedder and the store; `rerank` additionally a reranker; `advanced`
/// additionally a reranker and a language model.
pub struct Collaborators {
    pub embedder: Arc<dyn EmbeddingClient>,
    pub store: Arc<dyn VectorStore>,
    pub reranker: Option<Arc<dyn Reranker>>,
    pub language_model: Option<Arc<dyn LanguageModel>>,
}

pub fn build_strategy(
    kind: StrategyKind,
    collaborators: Collaborators,
    expansion_language: &str,
) -> Result<Arc<dyn SearchStrategy>> {
    let Collaborators { embedder, store, reranker, language_model } = collaborators;
    match kind {
        StrategyKind::Simple => Ok(Arc::new(SimpleSearch::new(embedder, store))),
        StrategyKind::Rerank => {
            let reranker = reranker.ok_or_else(|| missing(kind, "reranker"))?;
            Ok(Arc::new(RerankSearch::new(embedder, store, reranker)))
        }
        StrategyKind::Advanced => {
            let reranker = reranker.ok_or_else(|| missing(kind, "reranker"))?;
            let language_model =
                language_model.ok_or_else(|| missing(kind, "language model"))?;
            let expander = QueryExpander::new(language_model, expansion_language);
            Ok(Arc::new(AdvancedSearch::new(embedder, store, reranker, expander)))
        }
    }
}

fn missing(kind: StrategyKind, dependency: &str) -> Error {
    Error::Config(format!("strategy '{kind}' requires a {dependency}, but none was configured"))
}
