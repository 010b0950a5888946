//! Multi-strategy retrieval engine.
//!
//! Three escalating strategies turn a conversation history into a
//! ranked chunk list: `SimpleSearch` (one vector query), `RerankSearch`
//! (oversample then cross-encode), `AdvancedSearch` (query expansion,
//! fan-out, dedup, cross-encode). The factory wires one of them from
//! configuration and validates that the needed collaborators are
//! present.

#![deny(warnings)]
#![deny(unused_imports)]

pub mod advanced;
pub mod expansion;
pub mod factory;
pub mod merge;
pub mod query;
pub mod rerank;
pub mod simple;

use async_trait::async_trait;

use ragdb_core::types::{Candidate, Message, RankedResult, SearchFilters};
use ragdb_core::{Error, Result};

pub use advanced::AdvancedSearch;
pub use factory::{build_strategy, Collaborators};
pub use rerank::RerankSearch;
pub use simple::SimpleSearch;

/// Rerank/advanced fetch this many times `top_k` candidates per query
/// variant before reranking. Fixed policy, not a per-call knob.
pub const OVERSAMPLE_FACTOR: usize = 4;

/// One retrieval strategy, fixed per deployment.
#[async_trait]
pub trait SearchStrategy: Send + Sync {
    async fn search(
        &self,
        history: &[Message],
        top_k: usize,
        filters: Option<&SearchFilters>,
    ) -> Result<Vec<RankedResult>>;
}

impl std::fmt::Debug for dyn SearchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn SearchStrategy")
    }
}

/// Request validation shared by all strategies. Runs before any
/// collaborator call.
pub(crate) fn validate_request(query: &str, top_k: usize) -> Result<()> {
    if query.trim().is_empty() {
        return Err(Error::Validation("extracted query is empty".into()));
    }
    if top_k == 0 {
        return Err(Error::Validation("top_k must be > 0".into()));
    }
    Ok(())
}

pub(crate) fn oversample_limit(top_k: usize) -> usize {
    top_k * OVERSAMPLE_FACTOR
}

/// Attach rerank scores, stable-sort descending, truncate to `top_k`.
/// Ties keep arrival order. A score count mismatch means the reranker
/// broke its contract.
pub(crate) fn rank_and_truncate(
    candidates: Vec<Candidate>,
    scores: Vec<f32>,
    top_k: usize,
) -> Result<Vec<RankedResult>> {
    if scores.len() != candidates.len() {
        return Err(Error::collaborator(
            "reranker",
            anyhow::anyhow!(
                "score count {} does not match document count {}",
                scores.len(),
                candidates.len()
            ),
        ));
    }
    let mut results: Vec<RankedResult> = candidates
        .into_iter()
        .zip(scores)
        .map(|(candidate, score)| RankedResult::from_candidate(candidate, Some(score)))
        .collect();
    results.sort_by(|a, b| {
        b.rerank_score
            .partial_cmp(&a.rerank_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(top_k);
    Ok(results)
}
