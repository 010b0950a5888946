use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use ragdb_core::traits::Reranker;
use ragdb_core::Result;
use ragdb_rerank::prompt::{format_pair, DEFAULT_INSTRUCTION};
use ragdb_rerank::scoring::relevance_from_logits;
use ragdb_rerank::LazyReranker;

struct ConstantReranker(f32);

#[async_trait]
impl Reranker for ConstantReranker {
    async fn rerank(&self, _query: &str, documents: &[String], _instruction: Option<&str>) -> Result<Vec<f32>> {
        Ok(vec![self.0; documents.len()])
    }
}

#[tokio::test]
async fn lazy_reranker_loads_once_under_contention() {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = loads.clone();
    let lazy = Arc::new(LazyReranker::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(ConstantReranker(0.5)) as Arc<dyn Reranker>)
    }));

    let docs: Vec<String> = (0..3).map(|i| format!("doc {i}")).collect();
    let mut handles = Vec::new();
    for _ in 0..8 {
        let client = lazy.clone();
        let docs = docs.clone();
        handles.push(tokio::spawn(async move {
            client.rerank("q", &docs, None).await.expect("rerank")
        }));
    }
    for handle in handles {
        let scores = handle.await.expect("join");
        assert_eq!(scores, vec![0.5, 0.5, 0.5]);
    }
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn lazy_reranker_surfaces_load_failure() {
    let lazy = LazyReranker::new(|| anyhow::bail!("weights missing"));
    let err = lazy
        .rerank("q", &["d".to_string()], None)
        .await
        .expect_err("load failure propagates");
    assert!(err.to_string().contains("reranker"));
}

#[test]
fn score_output_order_matches_input_order() {
    // The tensor path reads [no, yes] pairs row by row; the pure scoring
    // function must keep the ordering of the extracted logits.
    let logit_pairs = [(0.1f32, 2.0f32), (3.0, -1.0), (0.0, 0.0)];
    let scores: Vec<f32> = logit_pairs
        .iter()
        .map(|(no, yes)| relevance_from_logits(*no, *yes))
        .collect();
    assert!(scores[0] > 0.5);
    assert!(scores[1] < 0.5);
    assert!((scores[2] - 0.5).abs() < 1e-6);
}

#[test]
fn pair_template_matches_contract() {
    let body = format_pair(None, "Q", "D");
    assert_eq!(body, format!("<Instruct>: {DEFAULT_INSTRUCTION}\n<Query>: Q\n<Document>: D"));
}
