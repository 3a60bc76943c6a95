//! In-memory store backend, used for local runs without a database and by
//! the test suites.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{NewRow, RangeScan, SampleStore, Stamp, StoreConnector};
use crate::error::StoreError;
use crate::models::DataPoint;

// ---

type StreamKey = (i64, i64);
type Table = BTreeMap<StreamKey, Vec<DataPoint>>;

/// Connector handing out handles onto one shared in-memory table.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    table: Arc<RwLock<Table>>,
}

impl MemoryConnector {
    // ---
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreConnector for MemoryConnector {
    async fn open(&self) -> Result<Arc<dyn SampleStore>, StoreError> {
        // ---
        Ok(Arc::new(MemoryStore {
            table: Arc::clone(&self.table),
            closed: AtomicBool::new(false),
        }))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// One session's handle onto the in-memory table.
#[derive(Debug)]
pub struct MemoryStore {
    table: Arc<RwLock<Table>>,
    closed: AtomicBool,
}

impl MemoryStore {
    // ---
    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl SampleStore for MemoryStore {
    async fn insert(&self, row: NewRow) -> Result<(), StoreError> {
        // ---
        self.ensure_open()?;

        let ts: DateTime<Utc> = match row.stamp {
            Stamp::Explicit(ts) => ts,
            Stamp::StoreAssigned => Utc::now(),
        };

        let mut table = self.table.write().await;
        let points = table
            .entry((row.sensor_id, row.sub_channel_id))
            .or_default();
        // Keep each stream sorted; equal timestamps stay in arrival order.
        let at = points.partition_point(|p| p.ts <= ts);
        points.insert(
            at,
            DataPoint {
                ts,
                value: row.value,
            },
        );
        Ok(())
    }

    async fn select_range(&self, scan: &RangeScan) -> Result<Vec<DataPoint>, StoreError> {
        // ---
        self.ensure_open()?;

        let table = self.table.read().await;
        let Some(points) = table.get(&(scan.sensor_id, scan.sub_channel_id)) else {
            return Ok(Vec::new());
        };

        Ok(points
            .iter()
            .filter(|p| scan.window.map_or(true, |w| w.contains(p.ts)))
            .take(scan.limit as usize)
            .copied()
            .collect())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
