//! Persistence writer and existence checker.
//!
//! Structured fields live in `cv_records`, keyed by the content
//! fingerprint: insert on first ingestion, and on conflict update only
//! filename and timestamp; extracted fields keep first-write semantics.
//! Chunk embeddings live in `cv_chunks`; a failed embedding pass degrades
//! to a warning on the outcome instead of failing the record write that
//! already succeeded.

use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::chunk::split_text;
use crate::config::ChunkingConfig;
use crate::embedding::{vec_to_blob, Embedder};
use crate::error::AgentError;
use crate::models::{CvFields, ExistingRecord, StoreOutcome};

/// Look up a fingerprint; `Some` carries the record's identity and filename.
pub async fn find_by_fingerprint(
    pool: &SqlitePool,
    fingerprint: &str,
) -> Result<Option<ExistingRecord>, AgentError> {
    let row: Option<(String, String)> =
        sqlx::query_as("SELECT id, filename FROM cv_records WHERE fingerprint = ?")
            .bind(fingerprint)
            .fetch_optional(pool)
            .await
            .map_err(|e| AgentError::StorageUnavailable(e.to_string()))?;

    Ok(row.map(|(id, filename)| ExistingRecord { id, filename }))
}

/// Persist one resume: upsert the structured record, then chunk and embed
/// the full text. Embedding failure is non-fatal: the structured half
/// still reports success, with a warning on the outcome.
pub async fn persist(
    pool: &SqlitePool,
    embedder: &dyn Embedder,
    chunking: &ChunkingConfig,
    fields: &CvFields,
    fingerprint: &str,
    filename: &str,
    full_text: &str,
) -> Result<StoreOutcome, AgentError> {
    let record_id = upsert_record(pool, fields, fingerprint, filename, full_text).await?;

    let chunks = split_text(full_text, chunking.chunk_size, chunking.chunk_overlap);
    let (chunks_stored, warning) = if chunks.is_empty() {
        (0, None)
    } else {
        match store_chunks(pool, embedder, fingerprint, filename, &chunks).await {
            Ok(count) => (count, None),
            Err(e) => {
                tracing::warn!(error = %e, fingerprint, "embedding pass failed; structured record kept");
                (0, Some(AgentError::Embedding(e.to_string()).to_string()))
            }
        }
    };

    Ok(StoreOutcome {
        record_id,
        chunks_stored,
        json_stored: true,
        warning,
    })
}

/// Insert-or-update keyed by fingerprint. On conflict only filename and
/// timestamp move; structured fields and full text are never overwritten.
async fn upsert_record(
    pool: &SqlitePool,
    fields: &CvFields,
    fingerprint: &str,
    filename: &str,
    full_text: &str,
) -> Result<String, AgentError> {
    let now = chrono::Utc::now().timestamp();
    let record_id = Uuid::new_v4().to_string();

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AgentError::StorageUnavailable(e.to_string()))?;

    let id: String = sqlx::query_scalar(
        r#"
        INSERT INTO cv_records
            (id, fingerprint, filename, ingested_at, name, email, phone, address,
             experiences, formations, competences, languages, summary, full_text)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(fingerprint) DO UPDATE SET
            filename = excluded.filename,
            ingested_at = excluded.ingested_at
        RETURNING id
        "#,
    )
    .bind(&record_id)
    .bind(fingerprint)
    .bind(filename)
    .bind(now)
    .bind(&fields.name)
    .bind(&fields.email)
    .bind(&fields.phone)
    .bind(&fields.address)
    .bind(json!(fields.experiences).to_string())
    .bind(json!(fields.formations).to_string())
    .bind(json!(fields.competences).to_string())
    .bind(json!(fields.languages).to_string())
    .bind(&fields.summary)
    .bind(full_text)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| AgentError::StorageUnavailable(e.to_string()))?;

    // Keep the keyword index in step with the record.
    sqlx::query("DELETE FROM cv_fts WHERE fingerprint = ?")
        .bind(fingerprint)
        .execute(&mut *tx)
        .await
        .map_err(|e| AgentError::StorageUnavailable(e.to_string()))?;
    sqlx::query("INSERT INTO cv_fts (fingerprint, full_text) VALUES (?, ?)")
        .bind(fingerprint)
        .bind(full_text)
        .execute(&mut *tx)
        .await
        .map_err(|e| AgentError::StorageUnavailable(e.to_string()))?;

    tx.commit()
        .await
        .map_err(|e| AgentError::StorageUnavailable(e.to_string()))?;

    Ok(id)
}

/// Embed chunks and write them in one transaction, one row per chunk,
/// keyed `{fingerprint}_{chunk_index}`.
async fn store_chunks(
    pool: &SqlitePool,
    embedder: &dyn Embedder,
    fingerprint: &str,
    filename: &str,
    chunks: &[String],
) -> anyhow::Result<u64> {
    let vectors = embedder.embed(chunks).await?;
    if vectors.len() != chunks.len() {
        anyhow::bail!(
            "embedder returned {} vectors for {} chunks",
            vectors.len(),
            chunks.len()
        );
    }

    let mut tx = pool.begin().await?;
    for (index, (text, vector)) in chunks.iter().zip(vectors.iter()).enumerate() {
        let chunk_id = format!("{}_{}", fingerprint, index);
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO cv_chunks
                (id, fingerprint, chunk_index, filename, text, embedding, model, dims)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&chunk_id)
        .bind(fingerprint)
        .bind(index as i64)
        .bind(filename)
        .bind(text)
        .bind(vec_to_blob(vector))
        .bind(embedder.model_name())
        .bind(embedder.dims() as i64)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    Ok(chunks.len() as u64)
}

/// One semantic-search hit.
#[derive(Debug, Clone)]
pub struct SemanticHit {
    pub fingerprint: String,
    pub filename: String,
    pub chunk_index: i64,
    pub score: f32,
    pub snippet: String,
}

/// Rank stored chunks against `query` by cosine similarity.
///
/// Loads every chunk vector and scores in process, which is fine at
/// resume-base scale where the corpus is thousands of chunks.
pub async fn semantic_search(
    pool: &SqlitePool,
    embedder: &dyn Embedder,
    query: &str,
    limit: usize,
) -> anyhow::Result<Vec<SemanticHit>> {
    let query_vec = embedder
        .embed(&[query.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Empty embedding response"))?;

    let rows: Vec<(String, String, i64, String, Vec<u8>)> = sqlx::query_as(
        "SELECT fingerprint, filename, chunk_index, text, embedding FROM cv_chunks",
    )
    .fetch_all(pool)
    .await?;

    let mut hits: Vec<SemanticHit> = rows
        .into_iter()
        .map(|(fingerprint, filename, chunk_index, text, blob)| {
            let score =
                crate::embedding::cosine_similarity(&query_vec, &crate::embedding::blob_to_vec(&blob));
            let snippet: String = text.chars().take(160).collect();
            SemanticHit {
                fingerprint,
                filename,
                chunk_index,
                score,
                snippet,
            }
        })
        .collect();

    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    hits.truncate(limit);
    Ok(hits)
}
