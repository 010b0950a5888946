//! Local embedding backend.
//!
//! `BgeEmbedder` runs a BGE-M3 (XLM-RoBERTa) model through candle with
//! masked-mean pooling and L2 normalization. `FakeEmbedder` is a
//! deterministic hashed stand-in for tests and offline development.
//! `LazyEmbedder` defers model loading to first use behind a once-only
//! guard so concurrent first callers share a single load.

#![deny(warnings)]
#![deny(unused_imports)]

pub mod device;
pub mod pool;
pub mod tokenize;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result as AnyResult};
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;
use tokio::sync::OnceCell;

use ragdb_core::config::EmbeddingConfig;
use ragdb_core::traits::EmbeddingClient;
use ragdb_core::{Error, Result};

use crate::device::select_device;
use crate::pool::masked_mean_normalize;
use crate::tokenize::encode_padded;

const COLLABORATOR: &str = "embedding model";

pub struct BgeEmbedder {
    model: XLMRobertaModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
}

impl BgeEmbedder {
    pub fn load(config: &EmbeddingConfig) -> AnyResult<Self> {
        let device = select_device();
        let model_dir = resolve_model_dir(&config.model_dir)?;
        tracing::info!(dir = %model_dir.display(), "loading embedding model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("failed to load tokenizer from {}: {e}", tokenizer_path.display()))?;

        let config_path = model_dir.join("config.json");
        let model_config: XLMRobertaConfig =
            serde_json::from_str(&std::fs::read_to_string(&config_path)?)
                .with_context(|| format!("failed to parse {}", config_path.display()))?;

        let vb = load_weights(&model_dir, &device)?;
        let model = XLMRobertaModel::new(&model_config, vb)?;
        tracing::info!("embedding model ready");

        Ok(Self {
            model,
            tokenizer,
            device,
            dim: config.dimension,
            max_len: config.max_length,
        })
    }

    fn encode_texts(&self, texts: &[String]) -> AnyResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let (input_ids, attention_mask) =
            encode_padded(&self.tokenizer, texts, self.max_len, &self.device)?;
        let token_type_ids =
            Tensor::zeros((texts.len(), self.max_len), DType::I64, &self.device)?;
        let hidden = self
            .model
            .forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = masked_mean_normalize(&hidden, &attention_mask)?;
        let rows: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        for row in &rows {
            if row.len() != self.dim {
                return Err(anyhow!(
                    "embedding dimension mismatch: model produced {}, configured {}",
                    row.len(),
                    self.dim
                ));
            }
        }
        Ok(rows)
    }
}

#[async_trait]
impl EmbeddingClient for BgeEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut rows = self.embed_batch(&[text.to_string()]).await?;
        Ok(rows.remove(0))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.encode_texts(texts).map_err(|e| Error::collaborator(COLLABORATOR, e))
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> AnyResult<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        // Safety: the file is memory-mapped and must not change while loaded.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, device)? };
        return Ok(vb);
    }
    let weights_path = model_dir.join("pytorch_model.bin");
    let weights = candle_core::pickle::read_all(&weights_path)
        .with_context(|| format!("failed to read weights from {}", weights_path.display()))?;
    let weights_map: std::collections::HashMap<String, Tensor> = weights.into_iter().collect();
    Ok(VarBuilder::from_tensors(weights_map, DType::F32, device))
}

fn resolve_model_dir(configured: &str) -> AnyResult<PathBuf> {
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") {
        let p = PathBuf::from(&dir);
        if p.exists() {
            return Ok(p);
        }
    }
    let p = PathBuf::from(configured);
    if p.exists() {
        return Ok(p);
    }
    Err(anyhow!("could not locate embedding model directory '{configured}'"))
}

/// Deterministic hashed embedder. Each whitespace token bumps one bucket
/// chosen by its xxHash; rows are L2-normalized. Useful wherever loading
/// the real model is too heavy.
pub struct FakeEmbedder {
    dim: usize,
}

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn hash_text(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;

        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

#[async_trait]
impl EmbeddingClient for FakeEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.hash_text(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.hash_text(t)).collect())
    }
}

type EmbedderFactory =
    dyn Fn() -> AnyResult<Arc<dyn EmbeddingClient>> + Send + Sync + 'static;

/// Defers construction of the real embedder until the first call.
///
/// The inner `OnceCell` guarantees exactly one initialization even when
/// several in-flight requests hit an uninitialized client at once; the
/// losers of the race await the winner's load instead of loading again.
pub struct LazyEmbedder {
    dim: usize,
    factory: Box<EmbedderFactory>,
    cell: OnceCell<Arc<dyn EmbeddingClient>>,
}

impl LazyEmbedder {
    pub fn new(
        dim: usize,
        factory: impl Fn() -> AnyResult<Arc<dyn EmbeddingClient>> + Send + Sync + 'static,
    ) -> Self {
        Self { dim, factory: Box::new(factory), cell: OnceCell::new() }
    }

    async fn inner(&self) -> Result<&Arc<dyn EmbeddingClient>> {
        self.cell
            .get_or_try_init(|| async {
                (self.factory)().map_err(|e| Error::collaborator(COLLABORATOR, e))
            })
            .await
    }
}

#[async_trait]
impl EmbeddingClient for LazyEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.inner().await?.embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.inner().await?.embed_batch(texts).await
    }
}

/// Default embedder wiring: the fake embedder when
/// `APP_USE_FAKE_EMBEDDINGS` is set, otherwise a lazily loaded BGE-M3.
pub fn default_embedder(config: &EmbeddingConfig) -> Arc<dyn EmbeddingClient> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if use_fake {
        tracing::info!("using fake embedder");
        return Arc::new(FakeEmbedder::new(config.dimension));
    }
    let cfg = config.clone();
    Arc::new(LazyEmbedder::new(config.dimension, move || {
        Ok(Arc::new(BgeEmbedder::load(&cfg)?) as Arc<dyn EmbeddingClient>)
    }))
}
