use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ragdb_core::traits::EmbeddingClient;
use ragdb_embed::{FakeEmbedder, LazyEmbedder};

#[tokio::test]
async fn fake_embedder_shapes_and_determinism() {
    let embedder = FakeEmbedder::new(1024);
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).await.expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 1024, "embedding dim is 1024");

    // Norm approximately 1.0
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Deterministic for same input
    for (a, b) in v1.iter().zip(v2.iter()) {
        assert!((a - b).abs() <= 1e-6);
    }
}

#[tokio::test]
async fn fake_embedder_distinguishes_texts() {
    let embedder = FakeEmbedder::new(256);
    let a = embedder.embed("wild garlic foraging").await.expect("embed");
    let b = embedder.embed("diesel engine repair").await.expect("embed");
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    assert!(dot < 0.99, "unrelated texts should not collapse to the same vector");
}

#[tokio::test]
async fn lazy_embedder_initializes_exactly_once() {
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = loads.clone();
    let lazy = Arc::new(LazyEmbedder::new(64, move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(FakeEmbedder::new(64)) as Arc<dyn EmbeddingClient>)
    }));

    assert_eq!(lazy.dim(), 64);
    assert_eq!(loads.load(Ordering::SeqCst), 0, "no load before first use");

    let mut handles = Vec::new();
    for i in 0..8 {
        let client = lazy.clone();
        handles.push(tokio::spawn(async move {
            client.embed(&format!("query {i}")).await.expect("embed")
        }));
    }
    for handle in handles {
        let v = handle.await.expect("join");
        assert_eq!(v.len(), 64);
    }

    assert_eq!(loads.load(Ordering::SeqCst), 1, "concurrent first use loads once");
}

#[tokio::test]
async fn lazy_embedder_propagates_factory_failure() {
    let lazy = LazyEmbedder::new(8, || anyhow::bail!("model directory missing"));
    let err = lazy.embed("anything").await.expect_err("factory failure surfaces");
    assert!(err.to_string().contains("embedding model"));
}
