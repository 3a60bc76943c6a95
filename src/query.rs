//! Range query engine for `Sensor.GetData`.
//!
//! Results are ascending by time and silently capped at the limit: a reply
//! with exactly `limit` entries may or may not have been truncated.

use crate::error::QueryError;
use crate::models::{DataEntry, GetDataParams, GetDataResult};
use crate::store::{RangeScan, SampleStore, TimeWindow};
use crate::timestamp;

// ---

/// Row limit applied when the request omits `limit` or sends `0`.
pub const DEFAULT_LIMIT: u32 = 100;

/// Translate request params into a store scan.
///
/// A time window applies only when `ts_from` is supplied and positive. A
/// missing or non-positive `ts_to` leaves the window open-ended.
pub fn plan(req: &GetDataParams) -> Result<RangeScan, QueryError> {
    // ---
    let limit = match req.limit {
        None | Some(0) => DEFAULT_LIMIT,
        Some(n) => u32::try_from(n).map_err(|_| QueryError::InvalidLimit(n))?,
    };

    let window = match req.ts_from.filter(|from| *from > 0.0) {
        Some(from) => Some(TimeWindow {
            from: timestamp::decode(from)?,
            to: req
                .ts_to
                .filter(|to| *to > 0.0)
                .map(timestamp::decode)
                .transpose()?,
        }),
        None => None,
    };

    Ok(RangeScan {
        sensor_id: req.sid,
        sub_channel_id: req.subid,
        window,
        limit,
    })
}

/// Run a range query and shape the rows into a reply body.
pub async fn query(
    store: &dyn SampleStore,
    req: &GetDataParams,
) -> Result<GetDataResult, QueryError> {
    // ---
    let scan = plan(req)?;
    let points = store.select_range(&scan).await?;

    let data = points
        .into_iter()
        .map(|p| DataEntry {
            ts: timestamp::encode(p.ts),
            v: p.value,
        })
        .collect();

    Ok(GetDataResult { data })
}
