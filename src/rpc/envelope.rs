//! Request and reply envelopes exchanged over the RPC channel.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ParseError, RpcError};

// ---

/// Inbound call: `{id, method, params}`.
///
/// `args` is accepted in place of `params`, and a missing `id` reads as
/// `null`. The `id` is echoed back verbatim in the reply.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Request {
    // ---
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default, alias = "args")]
    pub params: Value,
}

impl Request {
    // ---
    pub fn parse(frame: &[u8]) -> Result<Self, ParseError> {
        serde_json::from_slice(frame).map_err(ParseError::Envelope)
    }
}

/// Outbound reply: `{id, result}` or `{id, error: {code, message}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    // ---
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    // ---
    pub fn result(id: Value, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, error: RpcError) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }
}
