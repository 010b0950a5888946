use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// Pad token id used by XLM-RoBERTa style vocabularies.
const PAD_ID: u32 = 1;

/// Encode a batch of texts into `[B, max_len]` id and attention-mask
/// tensors. Sequences longer than `max_len` are truncated, shorter ones
/// padded with the pad token and a zeroed mask.
pub fn encode_padded(
    tokenizer: &Tokenizer,
    texts: &[String],
    max_len: usize,
    device: &Device,
) -> Result<(Tensor, Tensor)> {
    let mut all_ids: Vec<u32> = Vec::with_capacity(texts.len() * max_len);
    let mut all_masks: Vec<u32> = Vec::with_capacity(texts.len() * max_len);

    for text in texts {
        let enc = tokenizer
            .encode(text.as_str(), true)
            .map_err(|e| anyhow!("tokenization failed: {e}"))?;
        let mut ids = enc.get_ids().to_vec();
        let mut mask = enc.get_attention_mask().to_vec();
        if ids.len() > max_len {
            ids.truncate(max_len);
            mask.truncate(max_len);
        }
        if ids.len() < max_len {
            let pad = max_len - ids.len();
            ids.extend(std::iter::repeat(PAD_ID).take(pad));
            mask.extend(std::iter::repeat(0).take(pad));
        }
        all_ids.extend(ids);
        all_masks.extend(mask);
    }

    let shape = (texts.len(), max_len);
    let input_ids = Tensor::from_iter(all_ids, device)?.reshape(shape)?;
    let attention_mask = Tensor::from_iter(all_masks, device)?.reshape(shape)?;
    Ok((input_ids, attention_mask))
}
