//! LanceDB read-path adapter.
//!
//! Implements the `VectorStore` contract on top of a LanceDB table of
//! chunks. Similarity is `1 - cosine_distance`; rows come back in
//! ascending distance order. Indexing and schema provisioning belong to
//! a separate pipeline; this crate only reads.

#![deny(warnings)]
#![deny(unused_imports)]

pub mod filter;

use anyhow::{anyhow, Result as AnyResult};
use arrow_array::{Array, Float32Array, Int32Array, RecordBatch, StringArray};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection};

use ragdb_core::config::StoreConfig;
use ragdb_core::traits::VectorStore;
use ragdb_core::types::{Candidate, Chunk, SearchFilters};
use ragdb_core::{Error, Result};

use crate::filter::filter_expr;

const COLLABORATOR: &str = "vector store";

pub struct ChunkStore {
    db: Connection,
    table_name: String,
}

impl ChunkStore {
    pub async fn connect(config: &StoreConfig) -> AnyResult<Self> {
        let db = connect(&config.uri).execute().await?;
        Ok(Self { db, table_name: config.table.clone() })
    }

    async fn run_query(
        &self,
        vector: &[f32],
        limit: usize,
        filters: Option<&SearchFilters>,
    ) -> AnyResult<Vec<Candidate>> {
        let table = self.db.open_table(&self.table_name).execute().await?;
        let mut query = table.vector_search(vector.to_vec())?.limit(limit);
        if let Some(predicate) = filters.and_then(filter_expr) {
            tracing::debug!(%predicate, "filtered store query");
            query = query.only_if(predicate);
        }

        let mut stream = query.execute().await?;
        let mut candidates = Vec::new();
        while let Some(batch) = stream.try_next().await? {
            for row in 0..batch.num_rows() {
                candidates.push(decode_row(&batch, row)?);
            }
        }
        Ok(candidates)
    }
}

#[async_trait]
impl VectorStore for ChunkStore {
    async fn query(
        &self,
        vector: &[f32],
        limit: usize,
        filters: Option<&SearchFilters>,
    ) -> Result<Vec<Candidate>> {
        self.run_query(vector, limit, filters)
            .await
            .map_err(|e| Error::collaborator(COLLABORATOR, e))
    }
}

fn decode_row(batch: &RecordBatch, row: usize) -> AnyResult<Candidate> {
    let chunk = Chunk {
        id: required_str(batch, "id", row)?,
        text: required_str(batch, "text", row)?,
        source_document: required_str(batch, "source_document", row)?,
        chapter_title: optional_str(batch, "chapter_title", row),
        section_title: optional_str(batch, "section_title", row),
        subsection_title: optional_str(batch, "subsection_title", row),
        summary: optional_str(batch, "summary", row),
        token_count: optional_u32(batch, "token_count", row),
    };
    Ok(Candidate { chunk, similarity_score: similarity(batch, row) })
}

fn required_str(batch: &RecordBatch, name: &str, row: usize) -> AnyResult<String> {
    let column = batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("column '{name}' missing or not a string column"))?;
    Ok(column.value(row).to_string())
}

fn optional_str(batch: &RecordBatch, name: &str, row: usize) -> Option<String> {
    let column = batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())?;
    if column.is_null(row) {
        return None;
    }
    let value = column.value(row);
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn optional_u32(batch: &RecordBatch, name: &str, row: usize) -> Option<u32> {
    let column = batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<Int32Array>())?;
    if column.is_null(row) {
        return None;
    }
    u32::try_from(column.value(row)).ok()
}

/// `1 - cosine_distance` from whichever distance column the engine
/// version emits; a raw `_score` column is passed through as-is.
fn similarity(batch: &RecordBatch, row: usize) -> f32 {
    let float_col = |name: &str| {
        batch
            .column_by_name(name)
            .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
            .map(|c| c.value(row))
    };
    if let Some(distance) = float_col("_distance") {
        return 1.0 - distance;
    }
    if let Some(distance) = float_col("distance") {
        return 1.0 - distance;
    }
    if let Some(score) = float_col("_score") {
        return score;
    }
    0.5
}
