//! Configuration loader.
//!
//! Uses Figment to merge defaults + `config.toml` + `config.<env>.toml`
//! (by `RUST_ENV`) + `APP_*` environment variables into one typed
//! `EngineConfig`. Strategy selection lives here and is handed to the
//! factory explicitly; there is no process-wide mutable settings object.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{Error, Result};
use crate::types::StrategyKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub reranker: RerankerConfig,
    pub store: StoreConfig,
    pub expansion: ExpansionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub strategy: StrategyKind,
    pub default_top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub model_dir: String,
    pub dimension: usize,
    pub max_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankerConfig {
    pub model_dir: String,
    pub batch_size: usize,
    pub max_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub uri: String,
    pub table: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpansionConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    /// Working language of the knowledge base. Query variants are
    /// requested in this language regardless of the input language.
    pub language: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retrieval: RetrievalConfig { strategy: StrategyKind::Simple, default_top_k: 5 },
            embedding: EmbeddingConfig {
                model_dir: "models/bge-m3".to_string(),
                dimension: 1024,
                max_length: 512,
            },
            reranker: RerankerConfig {
                model_dir: "models/reranker".to_string(),
                batch_size: 8,
                max_length: 4096,
            },
            store: StoreConfig {
                uri: "data/lancedb".to_string(),
                table: "chunks".to_string(),
            },
            expansion: ExpansionConfig {
                endpoint: "http://127.0.0.1:11434/v1".to_string(),
                api_key: String::new(),
                model: "llama3".to_string(),
                language: "English".to_string(),
            },
        }
    }
}

impl EngineConfig {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(EngineConfig::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config: EngineConfig = figment
            .extract()
            .map_err(|e| Error::Config(format!("failed to load configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.retrieval.default_top_k == 0 {
            return Err(Error::Config("retrieval.default_top_k must be > 0".into()));
        }
        if self.embedding.dimension == 0 {
            return Err(Error::Config("embedding.dimension must be > 0".into()));
        }
        if self.reranker.batch_size == 0 {
            return Err(Error::Config("reranker.batch_size must be > 0".into()));
        }
        Ok(())
    }
}
