//! Postgres store backend (sqlx).
//!
//! Each session gets its own small pool, opened on accept and closed on
//! disconnect.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};

use super::{schema, NewRow, RangeScan, SampleStore, Stamp, StoreConnector};
use crate::error::StoreError;
use crate::models::DataPoint;

// ---

/// Opens a per-session [`PgStore`] against one database.
#[derive(Debug, Clone)]
pub struct PgConnector {
    db_url: String,
    pool_max: u32,
}

impl PgConnector {
    // ---
    /// Check the database is reachable, create the schema, and return a
    /// connector for per-session handles.
    pub async fn connect(db_url: &str, pool_max: u32) -> Result<Self> {
        // ---
        tracing::info!("Bootstrapping database schema");

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(db_url)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

        schema::create_schema(&pool).await?;
        pool.close().await;

        tracing::info!("Database schema ready");

        Ok(Self {
            db_url: db_url.to_string(),
            pool_max,
        })
    }
}

#[async_trait]
impl StoreConnector for PgConnector {
    async fn open(&self) -> Result<Arc<dyn SampleStore>, StoreError> {
        // ---
        let pool = PgPoolOptions::new()
            .max_connections(self.pool_max)
            .connect(&self.db_url)
            .await?;
        Ok(Arc::new(PgStore { pool }))
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

/// One session's database handle.
#[derive(Debug)]
pub struct PgStore {
    pool: PgPool,
}

#[async_trait]
impl SampleStore for PgStore {
    async fn insert(&self, row: NewRow) -> Result<(), StoreError> {
        // ---
        match row.stamp {
            Stamp::Explicit(ts) => {
                sqlx::query("INSERT INTO data (sid, subid, ts, value) VALUES ($1, $2, $3, $4)")
                    .bind(row.sensor_id)
                    .bind(row.sub_channel_id)
                    .bind(ts)
                    .bind(row.value)
                    .execute(&self.pool)
                    .await?;
            }
            Stamp::StoreAssigned => {
                sqlx::query("INSERT INTO data (sid, subid, value) VALUES ($1, $2, $3)")
                    .bind(row.sensor_id)
                    .bind(row.sub_channel_id)
                    .bind(row.value)
                    .execute(&self.pool)
                    .await?;
            }
        }
        Ok(())
    }

    async fn select_range(&self, scan: &RangeScan) -> Result<Vec<DataPoint>, StoreError> {
        // ---
        let mut qb = build_range_query(scan);
        let rows = qb
            .build_query_as::<DataPoint>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Build the parameterized scan for `scan`.
fn build_range_query(scan: &RangeScan) -> QueryBuilder<'static, Postgres> {
    // ---
    let mut qb = QueryBuilder::new("SELECT ts, value FROM data WHERE sid = ");
    qb.push_bind(scan.sensor_id);
    qb.push(" AND subid = ");
    qb.push_bind(scan.sub_channel_id);

    match scan.window {
        Some(window) => {
            qb.push(" AND ts >= ");
            qb.push_bind(window.from);
            if let Some(to) = window.to {
                qb.push(" AND ts < ");
                qb.push_bind(to);
            }
        }
        None => {
            qb.push(" AND ts IS NOT NULL");
        }
    }

    qb.push(" ORDER BY ts LIMIT ");
    qb.push_bind(i64::from(scan.limit));
    qb
}
