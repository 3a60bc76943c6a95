//! Ingestion writer: persists one canonical sample.
//!
//! A device timestamp is used only when it is a plausible clock reading
//! (see [`timestamp::MIN_PLAUSIBLE_EPOCH_SECS`]); otherwise the store stamps
//! the row itself. Writes are attempted once and never retried.

use crate::error::PersistenceError;
use crate::models::CanonicalSample;
use crate::store::{NewRow, SampleStore, Stamp};
use crate::timestamp;

// ---

/// Write `sample`, returning the timestamp path that was taken.
pub async fn write(
    store: &dyn SampleStore,
    sample: CanonicalSample,
) -> Result<Stamp, PersistenceError> {
    // ---
    let stamp = match timestamp::plausible(sample.timestamp) {
        Some(raw) => Stamp::Explicit(timestamp::decode(raw)?),
        None => Stamp::StoreAssigned,
    };

    let row = NewRow {
        sensor_id: sample.sensor_id,
        sub_channel_id: sample.sub_channel_id,
        stamp,
        value: sample.value,
    };

    store
        .insert(row)
        .await
        .map_err(|source| PersistenceError::Write {
            sensor_id: sample.sensor_id,
            sub_channel_id: sample.sub_channel_id,
            source,
        })?;

    Ok(stamp)
}
