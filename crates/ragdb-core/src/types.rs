//! Domain types shared by the retrieval strategies and their collaborators.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type ChunkId = String;

/// An indexed unit of retrievable knowledge.
///
/// Chunks are owned by the external store; the engine only reads them.
/// Structural metadata (chapter/section/subsection titles, summary,
/// token count) is optional and carried through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub source_document: String,
    #[serde(default)]
    pub chapter_title: Option<String>,
    #[serde(default)]
    pub section_title: Option<String>,
    #[serde(default)]
    pub subsection_title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub token_count: Option<u32>,
}

/// A chunk returned by one vector-store query, with the similarity score
/// that particular call attached. The same chunk id may appear in several
/// candidate lists before merging.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub chunk: Chunk,
    pub similarity_score: f32,
}

/// Final output item of a strategy call.
///
/// `rerank_score` is `None` for the simple strategy and set for
/// rerank/advanced. A result list never contains two items with the same
/// chunk id and never exceeds the requested `top_k`.
#[derive(Debug, Clone, Serialize)]
pub struct RankedResult {
    #[serde(flatten)]
    pub chunk: Chunk,
    pub similarity_score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rerank_score: Option<f32>,
}

impl RankedResult {
    pub fn from_candidate(candidate: Candidate, rerank_score: Option<f32>) -> Self {
        Self {
            chunk: candidate.chunk,
            similarity_score: candidate.similarity_score,
            rerank_score,
        }
    }
}

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Assistant,
    System,
}

/// One turn of a conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn human(content: impl Into<String>) -> Self {
        Self { role: Role::Human, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }
}

/// Metadata restrictions for a store query. When more than one field is
/// set the store combines them with OR semantics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub source_document: Option<String>,
    #[serde(default)]
    pub chapter_title: Option<String>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.source_document.is_none() && self.chapter_title.is_none()
    }
}

/// Which retrieval strategy a deployment runs. Fixed per deployment and
/// selected through configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Simple,
    Rerank,
    Advanced,
}

impl StrategyKind {
    pub const VALID_NAMES: [&'static str; 3] = ["simple", "rerank", "advanced"];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Simple => "simple",
            StrategyKind::Rerank => "rerank",
            StrategyKind::Advanced => "advanced",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(StrategyKind::Simple),
            "rerank" => Ok(StrategyKind::Rerank),
            "advanced" => Ok(StrategyKind::Advanced),
            other => Err(crate::Error::Config(format!(
                "unknown strategy '{}', valid options: {}",
                other,
                Self::VALID_NAMES.join(", ")
            ))),
        }
    }
}
