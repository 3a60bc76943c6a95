//! Sample normalizer: maps inbound payload shapes onto [`CanonicalSample`].

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ParseError;
use crate::models::{CanonicalSample, DataParams, ReportTempParams};

// ---

/// Sub-channel carrying temperature readings of a combined report.
pub const SUB_CHANNEL_TEMPERATURE: i64 = 0;

/// Sub-channel carrying relative humidity readings of a combined report.
pub const SUB_CHANNEL_HUMIDITY: i64 = 1;

/// Expand a combined report into zero, one or two samples.
pub fn normalize_report(report: &ReportTempParams) -> Vec<CanonicalSample> {
    // ---
    let channels = [
        (SUB_CHANNEL_TEMPERATURE, report.temp),
        (SUB_CHANNEL_HUMIDITY, report.rh),
    ];

    channels
        .into_iter()
        .filter_map(|(sub_channel_id, value)| {
            value.map(|value| CanonicalSample {
                sensor_id: report.sid,
                sub_channel_id,
                timestamp: report.ts,
                value,
            })
        })
        .collect()
}

/// Field-for-field mapping of a plain data payload.
pub fn normalize_plain(payload: &DataParams) -> CanonicalSample {
    // ---
    CanonicalSample {
        sensor_id: payload.sid,
        sub_channel_id: payload.subid,
        timestamp: payload.ts,
        value: payload.v,
    }
}

/// Decode raw `params` into the shape expected by `method`.
pub fn parse_params<T: DeserializeOwned>(
    method: &'static str,
    params: Value,
) -> Result<T, ParseError> {
    // ---
    serde_json::from_value(params).map_err(|source| ParseError::Params { method, source })
}
