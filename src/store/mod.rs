//! Backing store boundary.
//!
//! The gateway only needs two things from a store: insert a row with an
//! explicit or store-assigned timestamp, and run an ordered, limited range
//! scan over one `(sid, subid)` stream. Each session opens its own handle
//! through a [`StoreConnector`] and closes it exactly once on teardown.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::DataPoint;

mod memory;
mod postgres;
mod schema;

#[cfg(test)]
pub(crate) mod testing;

pub use memory::{MemoryConnector, MemoryStore};
pub use postgres::{PgConnector, PgStore};

// ---

/// Where a row's timestamp comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stamp {
    /// Device-supplied instant.
    Explicit(DateTime<Utc>),
    /// The store stamps the row with its own clock at write time.
    StoreAssigned,
}

/// A row to insert.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewRow {
    pub sensor_id: i64,
    pub sub_channel_id: i64,
    pub stamp: Stamp,
    pub value: f64,
}

/// Half-open `[from, to)` window; `to == None` leaves the end open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: Option<DateTime<Utc>>,
}

impl TimeWindow {
    // ---
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.from && self.to.map_or(true, |to| ts < to)
    }
}

/// A bounded, ascending scan over one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeScan {
    pub sensor_id: i64,
    pub sub_channel_id: i64,
    pub window: Option<TimeWindow>,
    pub limit: u32,
}

/// A store handle owned by one session.
#[async_trait]
pub trait SampleStore: Send + Sync {
    /// Insert one row.
    async fn insert(&self, row: NewRow) -> Result<(), StoreError>;

    /// Rows matching `scan`, ascending by time, at most `scan.limit` of them.
    async fn select_range(&self, scan: &RangeScan) -> Result<Vec<DataPoint>, StoreError>;

    /// Release the handle. Later calls fail with [`StoreError::Closed`].
    async fn close(&self);
}

/// Opens per-session store handles.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn open(&self) -> Result<Arc<dyn SampleStore>, StoreError>;

    /// Backend name, reported by `/health`.
    fn backend(&self) -> &'static str;
}
