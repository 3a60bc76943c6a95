//! Data models for the sensor gateway: wire params, canonical samples and
//! stored points.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---

/// Params of `Sensor.Data` / `MyHome.Data.Add`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataParams {
    // ---
    pub sid: i64,
    #[serde(default)]
    pub subid: i64,
    #[serde(default)]
    pub ts: Option<f64>,
    pub v: f64,
}

/// Params of `Sensor.ReportTemp`, a combined temperature/humidity report.
///
/// `subid` is accepted for compatibility but ignored: temperature always
/// lands on sub-channel 0 and humidity on sub-channel 1.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReportTempParams {
    // ---
    pub sid: i64,
    #[serde(default)]
    pub subid: i64,
    #[serde(default)]
    pub ts: Option<f64>,
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde(default)]
    pub rh: Option<f64>,
}

/// Params of `Sensor.GetData`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GetDataParams {
    // ---
    pub sid: i64,
    #[serde(default)]
    pub subid: i64,
    #[serde(default)]
    pub ts_from: Option<f64>,
    #[serde(default)]
    pub ts_to: Option<f64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// One normalized measurement, ready for the ingestion writer.
///
/// `timestamp` is the wire value exactly as the device sent it; `None`
/// means the device did not send one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanonicalSample {
    // ---
    pub sensor_id: i64,
    pub sub_channel_id: i64,
    pub timestamp: Option<f64>,
    pub value: f64,
}

/// A stored `(ts, value)` pair returned by a range scan.
#[derive(Debug, Clone, Copy, PartialEq, sqlx::FromRow)]
pub struct DataPoint {
    // ---
    pub ts: DateTime<Utc>,
    pub value: f64,
}

/// One entry of a `Sensor.GetData` result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataEntry {
    pub ts: f64,
    pub v: f64,
}

/// Result body of `Sensor.GetData`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetDataResult {
    pub data: Vec<DataEntry>,
}
