//! Database schema management for the Postgres store backend.
//!
//! Ensures the `data` table and its stream index exist before any session
//! opens a handle. Applied once on startup by [`super::PgConnector::connect`].

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create the schema (idempotent).
///
/// `ts` is nullable and defaults to `now()`: inserts without a device
/// timestamp are stamped by the database clock. Safe to call on every
/// startup; no-op if objects already exist.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS data (
            id     BIGSERIAL        PRIMARY KEY,
            sid    BIGINT           NOT NULL,
            subid  BIGINT           NOT NULL,
            ts     TIMESTAMPTZ      NULL DEFAULT now(),
            value  DOUBLE PRECISION NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Every range scan filters on the stream and orders by time
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_data_stream_ts
            ON data (sid, subid, ts);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
