//! Recording store for unit tests: remembers every call and can be told
//! to fail.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{NewRow, RangeScan, SampleStore};
use crate::error::StoreError;
use crate::models::DataPoint;

// ---

#[derive(Default)]
pub struct RecordingStore {
    pub inserts: Mutex<Vec<NewRow>>,
    pub scans: Mutex<Vec<RangeScan>>,
    pub rows: Vec<DataPoint>,
    pub fail: bool,
}

impl RecordingStore {
    // ---
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_rows(rows: Vec<DataPoint>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn inserted(&self) -> Vec<NewRow> {
        self.inserts.lock().unwrap().clone()
    }

    pub fn scanned(&self) -> Vec<RangeScan> {
        self.scans.lock().unwrap().clone()
    }

    pub fn interactions(&self) -> usize {
        self.inserted().len() + self.scanned().len()
    }
}

#[async_trait]
impl SampleStore for RecordingStore {
    async fn insert(&self, row: NewRow) -> Result<(), StoreError> {
        // ---
        self.inserts.lock().unwrap().push(row);
        if self.fail {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    async fn select_range(&self, scan: &RangeScan) -> Result<Vec<DataPoint>, StoreError> {
        // ---
        self.scans.lock().unwrap().push(*scan);
        if self.fail {
            return Err(StoreError::Closed);
        }
        Ok(self.rows.iter().take(scan.limit as usize).copied().collect())
    }

    async fn close(&self) {}
}
