//! Error taxonomy for the gateway.
//!
//! Fire-and-forget calls only ever log these; request/response calls turn
//! them into an [`RpcError`] reply body.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---

/// JSON-RPC code for an unknown method name.
pub const CODE_METHOD_NOT_FOUND: i64 = -32601;

/// Code for every handler failure, including params that do not parse.
pub const CODE_GENERIC: i64 = -1;

/// Malformed or type-mismatched inbound payload.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("invalid {method} params: {source}")]
    Params {
        method: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("timestamp {0} is out of range")]
    Timestamp(f64),
}

/// Failure reported by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store closed")]
    Closed,
}

/// A sample could not be persisted. Never retried.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to write sample {sensor_id}/{sub_channel_id}: {source}")]
    Write {
        sensor_id: i64,
        sub_channel_id: i64,
        #[source]
        source: StoreError,
    },
}

/// A range query could not be built or executed.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("invalid limit {0}")]
    InvalidLimit(i64),

    #[error("query error: {0}")]
    Store(#[from] StoreError),
}

/// Structured error body of a reply envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    // ---
    pub fn method_not_found() -> Self {
        Self {
            code: CODE_METHOD_NOT_FOUND,
            message: "Method not found".to_string(),
        }
    }
}

impl From<QueryError> for RpcError {
    fn from(err: QueryError) -> Self {
        Self {
            code: CODE_GENERIC,
            message: err.to_string(),
        }
    }
}
