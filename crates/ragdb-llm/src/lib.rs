//! OpenAI-compatible completion client.
//!
//! Works against any endpoint that speaks the `/chat/completions`
//! format (local llama.cpp/Ollama servers included); providers differ
//! only by base URL and API key. Used by the query expander.

#![deny(warnings)]
#![deny(unused_imports)]

use anyhow::{anyhow, Result as AnyResult};
use async_trait::async_trait;
use serde_json::{json, Value};

use ragdb_core::config::ExpansionConfig;
use ragdb_core::traits::LanguageModel;
use ragdb_core::{Error, Result};

const COLLABORATOR: &str = "language model";

pub struct OpenAiCompatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiCompatClient {
    pub fn new(config: &ExpansionConfig) -> Self {
        let api_key = if config.api_key.is_empty() {
            std::env::var("APP_EXPANSION_API_KEY").unwrap_or_default()
        } else {
            config.api_key.clone()
        };
        Self {
            client: reqwest::Client::new(),
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        }
    }

    async fn chat(&self, prompt: &str) -> AnyResult<String> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0.3,
        });

        let url = format!("{}/chat/completions", self.base_url);
        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);
        if !self.api_key.is_empty() {
            request = request.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| anyhow!("connection to {url} failed: {e}"))?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("API error {status}: {text}"));
        }

        let payload: Value = response.json().await?;
        extract_content(&payload)
    }
}

#[async_trait]
impl LanguageModel for OpenAiCompatClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        tracing::debug!(model = %self.model, "completion request");
        self.chat(prompt).await.map_err(|e| Error::collaborator(COLLABORATOR, e))
    }
}

/// Pull `choices[0].message.content` out of a chat-completions reply.
fn extract_content(payload: &Value) -> AnyResult<String> {
    payload["choices"]
        .get(0)
        .and_then(|choice| choice["message"]["content"].as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("no completion content in response"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_choice_content() {
        let payload = json!({
            "choices": [
                { "message": { "role": "assistant", "content": "SPECIFIC: a\nBROADER: b" } }
            ]
        });
        assert_eq!(extract_content(&payload).expect("content"), "SPECIFIC: a\nBROADER: b");
    }

    #[test]
    fn missing_choices_is_an_error() {
        assert!(extract_content(&json!({})).is_err());
        assert!(extract_content(&json!({ "choices": [] })).is_err());
        assert!(extract_content(&json!({ "choices": [{ "message": {} }] })).is_err());
    }
}
