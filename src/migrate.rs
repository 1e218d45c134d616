use anyhow::Result;
use sqlx::SqlitePool;

/// Create the schema. Idempotent; safe to run on every startup.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // Structured records, one per unique content fingerprint. The
    // uniqueness constraint is what makes concurrent ingestion of the
    // same document converge on a single row.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cv_records (
            id TEXT PRIMARY KEY,
            fingerprint TEXT NOT NULL UNIQUE,
            filename TEXT NOT NULL,
            ingested_at INTEGER NOT NULL,
            name TEXT NOT NULL DEFAULT '',
            email TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            address TEXT NOT NULL DEFAULT '',
            experiences TEXT NOT NULL DEFAULT '[]',
            formations TEXT NOT NULL DEFAULT '[]',
            competences TEXT NOT NULL DEFAULT '[]',
            languages TEXT NOT NULL DEFAULT '[]',
            summary TEXT NOT NULL DEFAULT '',
            full_text TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Embedded chunks, keyed "{fingerprint}_{chunk_index}".
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cv_chunks (
            id TEXT PRIMARY KEY,
            fingerprint TEXT NOT NULL,
            chunk_index INTEGER NOT NULL,
            filename TEXT NOT NULL,
            text TEXT NOT NULL,
            embedding BLOB NOT NULL,
            model TEXT NOT NULL,
            dims INTEGER NOT NULL,
            UNIQUE(fingerprint, chunk_index),
            FOREIGN KEY (fingerprint) REFERENCES cv_records(fingerprint) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // FTS5 virtual table over the full resume text for keyword search.
    // FTS5 CREATE is not idempotent natively, so check first.
    let fts_exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='cv_fts'",
    )
    .fetch_one(pool)
    .await?;

    if !fts_exists {
        sqlx::query(
            r#"
            CREATE VIRTUAL TABLE cv_fts USING fts5(
                fingerprint UNINDEXED,
                full_text
            )
            "#,
        )
        .execute(pool)
        .await?;
    }

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_cv_records_name ON cv_records(name)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_cv_chunks_fingerprint ON cv_chunks(fingerprint)")
        .execute(pool)
        .await?;

    Ok(())
}
