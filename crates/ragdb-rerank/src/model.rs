//! Candle-backed cross-encoder.
//!
//! A causal LM judges each (query, document) pair; only the logits of
//! the fixed "yes" and "no" tokens at the last position are used. Rows
//! in a batch are left-padded so the last position holds real content
//! for every row. The padded positions are still attended by the model
//! (the backbone only applies a causal mask), which matches the
//! reference scorer's behavior on padded bodies.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result as AnyResult};
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::qwen2::{Config as Qwen2Config, ModelForCausalLM};
use tokenizers::Tokenizer;

use ragdb_core::config::RerankerConfig;
use ragdb_core::traits::Reranker;
use ragdb_core::{Error, Result};
use ragdb_embed::device::select_device;

use crate::prompt::{format_pair, PREFIX, SUFFIX};
use crate::scoring::relevance_from_logits;

const COLLABORATOR: &str = "reranker";

pub struct CrossEncoder {
    model: Mutex<ModelForCausalLM>,
    tokenizer: Tokenizer,
    device: Device,
    yes_id: u32,
    no_id: u32,
    pad_id: u32,
    prefix_ids: Vec<u32>,
    suffix_ids: Vec<u32>,
    max_len: usize,
    batch_size: usize,
}

impl CrossEncoder {
    pub fn load(config: &RerankerConfig) -> AnyResult<Self> {
        let device = select_device();
        let model_dir = resolve_model_dir(&config.model_dir)?;
        tracing::info!(dir = %model_dir.display(), "loading reranker model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("failed to load tokenizer from {}: {e}", tokenizer_path.display()))?;

        let config_path = model_dir.join("config.json");
        let model_config: Qwen2Config =
            serde_json::from_str(&std::fs::read_to_string(&config_path)?)
                .with_context(|| format!("failed to parse {}", config_path.display()))?;

        let weights = collect_safetensors(&model_dir)?;
        // Safety: the files are memory-mapped and must not change while loaded.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&weights, DType::F32, &device)? };
        let model = ModelForCausalLM::new(&model_config, vb)?;

        let yes_id = single_token_id(&tokenizer, "yes")?;
        let no_id = single_token_id(&tokenizer, "no")?;
        let pad_id = tokenizer.token_to_id("<|endoftext|>").unwrap_or(0);
        let prefix_ids = encode_raw(&tokenizer, PREFIX)?;
        let suffix_ids = encode_raw(&tokenizer, SUFFIX)?;
        tracing::info!("reranker model ready");

        Ok(Self {
            model: Mutex::new(model),
            tokenizer,
            device,
            yes_id,
            no_id,
            pad_id,
            prefix_ids,
            suffix_ids,
            max_len: config.max_length,
            batch_size: config.batch_size,
        })
    }

    /// prefix + truncated body + suffix, so the full row always fits the
    /// model context window.
    fn encode_pair(&self, query: &str, document: &str, instruction: Option<&str>) -> AnyResult<Vec<u32>> {
        let body = format_pair(instruction, query, document);
        let mut body_ids = encode_raw(&self.tokenizer, &body)?;
        let frame = self.prefix_ids.len() + self.suffix_ids.len();
        let budget = self.max_len.saturating_sub(frame).max(1);
        body_ids.truncate(budget);

        let mut row = Vec::with_capacity(frame + body_ids.len());
        row.extend_from_slice(&self.prefix_ids);
        row.extend_from_slice(&body_ids);
        row.extend_from_slice(&self.suffix_ids);
        Ok(row)
    }

    /// One forward pass for one batch of rows; yes/no logits are read at
    /// the last position only.
    fn score_rows(&self, rows: &[Vec<u32>]) -> AnyResult<Vec<f32>> {
        let (flat, width) = left_pad(rows, self.pad_id);
        let input_ids = Tensor::from_iter(flat, &self.device)?.reshape((rows.len(), width))?;

        let mut model = self
            .model
            .lock()
            .map_err(|_| anyhow!("reranker model mutex poisoned"))?;
        model.clear_kv_cache();
        let logits = model.forward(&input_ids, 0)?; // [B, 1, vocab]
        drop(model);

        let last = logits.squeeze(1)?;
        let no = last.narrow(1, self.no_id as usize, 1)?;
        let yes = last.narrow(1, self.yes_id as usize, 1)?;
        let pairs: Vec<Vec<f32>> = Tensor::cat(&[no, yes], 1)?
            .to_dtype(DType::F32)?
            .to_device(&Device::Cpu)?
            .to_vec2()?;

        Ok(pairs.iter().map(|p| relevance_from_logits(p[0], p[1])).collect())
    }

    fn score_all(&self, query: &str, documents: &[String], instruction: Option<&str>) -> AnyResult<Vec<f32>> {
        let mut rows = Vec::with_capacity(documents.len());
        for document in documents {
            rows.push(self.encode_pair(query, document, instruction)?);
        }
        let mut scores = Vec::with_capacity(rows.len());
        for batch in rows.chunks(self.batch_size) {
            scores.extend(self.score_rows(batch)?);
        }
        Ok(scores)
    }
}

#[async_trait]
impl Reranker for CrossEncoder {
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        instruction: Option<&str>,
    ) -> Result<Vec<f32>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        self.score_all(query, documents, instruction)
            .map_err(|e| Error::collaborator(COLLABORATOR, e))
    }
}

/// Left-pad every row to the batch max and flatten row-major. Returns
/// the flat ids and the padded width.
fn left_pad(rows: &[Vec<u32>], pad_id: u32) -> (Vec<u32>, usize) {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut flat = Vec::with_capacity(rows.len() * width);
    for row in rows {
        flat.extend(std::iter::repeat(pad_id).take(width - row.len()));
        flat.extend_from_slice(row);
    }
    (flat, width)
}

fn encode_raw(tokenizer: &Tokenizer, text: &str) -> AnyResult<Vec<u32>> {
    let enc = tokenizer
        .encode(text, false)
        .map_err(|e| anyhow!("tokenization failed: {e}"))?;
    Ok(enc.get_ids().to_vec())
}

fn single_token_id(tokenizer: &Tokenizer, text: &str) -> AnyResult<u32> {
    let ids = encode_raw(tokenizer, text)?;
    ids.first()
        .copied()
        .ok_or_else(|| anyhow!("tokenizer produced no ids for '{text}'"))
}

fn collect_safetensors(model_dir: &Path) -> AnyResult<Vec<PathBuf>> {
    let single = model_dir.join("model.safetensors");
    if single.exists() {
        return Ok(vec![single]);
    }
    // Sharded checkpoints list their files in the index manifest.
    let index_path = model_dir.join("model.safetensors.index.json");
    if index_path.exists() {
        let index: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&index_path)?)?;
        let weight_map = index["weight_map"]
            .as_object()
            .ok_or_else(|| anyhow!("malformed index in {}", index_path.display()))?;
        let mut files: Vec<String> = weight_map
            .values()
            .filter_map(|v| v.as_str().map(String::from))
            .collect::<std::collections::HashSet<_>>()
            .into_iter()
            .collect();
        files.sort();
        return Ok(files.into_iter().map(|f| model_dir.join(f)).collect());
    }
    Err(anyhow!("no safetensors weights found in {}", model_dir.display()))
}

fn resolve_model_dir(configured: &str) -> AnyResult<PathBuf> {
    if let Ok(dir) = std::env::var("APP_RERANKER_DIR") {
        let p = PathBuf::from(&dir);
        if p.exists() {
            return Ok(p);
        }
    }
    let p = PathBuf::from(configured);
    if p.exists() {
        return Ok(p);
    }
    Err(anyhow!("could not locate reranker model directory '{configured}'"))
}

#[cfg(test)]
mod tests {
    use super::left_pad;

    #[test]
    fn left_pad_aligns_last_positions() {
        let rows = vec![vec![7, 8, 9], vec![1], vec![4, 5]];
        let (flat, width) = left_pad(&rows, 0);
        assert_eq!(width, 3);
        assert_eq!(flat, vec![7, 8, 9, 0, 0, 1, 0, 4, 5]);
        // Last element of each padded row is the row's own last token.
        assert_eq!(flat[2], 9);
        assert_eq!(flat[5], 1);
        assert_eq!(flat[8], 5);
    }

    #[test]
    fn left_pad_empty_batch() {
        let (flat, width) = left_pad(&[], 0);
        assert!(flat.is_empty());
        assert_eq!(width, 0);
    }
}
