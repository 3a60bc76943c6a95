//! Method dispatcher: routes a parsed call to the ingestion or query path.
//!
//! Routing is a static table from method name to a [`Route`]. One-way
//! methods never produce a reply; their failures go to the log only.
//! Request/response methods always produce exactly one reply.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::envelope::{Request, Response};
use crate::error::{QueryError, RpcError, CODE_GENERIC};
use crate::ingest;
use crate::models::{DataParams, GetDataParams, ReportTempParams};
use crate::normalize::{normalize_plain, normalize_report, parse_params};
use crate::query;
use crate::store::SampleStore;

// ---

/// Fire-and-forget methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneWay {
    /// Combined temperature/humidity report.
    ReportTemp,
    /// Single generic sample.
    AddData,
}

impl OneWay {
    // ---
    pub fn name(self) -> &'static str {
        match self {
            OneWay::ReportTemp => "Sensor.ReportTemp",
            OneWay::AddData => "Sensor.Data",
        }
    }
}

/// Request/response methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwoWay {
    GetData,
}

impl TwoWay {
    // ---
    pub fn name(self) -> &'static str {
        match self {
            TwoWay::GetData => "Sensor.GetData",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    OneWay(OneWay),
    Call(TwoWay),
}

impl Route {
    // ---
    /// Resolve a method name (case-sensitive, exact).
    pub fn resolve(method: &str) -> Option<Route> {
        match method {
            "Sensor.ReportTemp" => Some(Route::OneWay(OneWay::ReportTemp)),
            "MyHome.Data.Add" | "Sensor.Data" => Some(Route::OneWay(OneWay::AddData)),
            "Sensor.GetData" => Some(Route::Call(TwoWay::GetData)),
            _ => None,
        }
    }
}

/// Per-session dispatcher. Shared by the session's in-flight call tasks.
pub struct Dispatcher {
    peer: String,
    store: Arc<dyn SampleStore>,
}

impl Dispatcher {
    // ---
    pub fn new(peer: impl Into<String>, store: Arc<dyn SampleStore>) -> Self {
        Self {
            peer: peer.into(),
            store,
        }
    }

    /// Handle one call; `None` means no reply is sent.
    pub async fn dispatch(&self, req: Request) -> Option<Response> {
        // ---
        debug!(peer = %self.peer, method = %req.method, id = %req.id, "call");

        match Route::resolve(&req.method) {
            Some(Route::OneWay(method)) => {
                self.notify(method, req.params).await;
                None
            }
            Some(Route::Call(method)) => {
                let reply = match self.call(method, req.params).await {
                    Ok(result) => Response::result(req.id, result),
                    Err(err) => Response::error(req.id, err),
                };
                Some(reply)
            }
            None => {
                warn!(peer = %self.peer, method = %req.method, "Method not found");
                Some(Response::error(req.id, RpcError::method_not_found()))
            }
        }
    }

    /// Run a one-way method. Errors are logged and otherwise swallowed.
    pub async fn notify(&self, method: OneWay, params: Value) {
        // ---
        let samples = match method {
            OneWay::ReportTemp => {
                parse_params::<ReportTempParams>(method.name(), params).map(|r| normalize_report(&r))
            }
            OneWay::AddData => {
                parse_params::<DataParams>(method.name(), params).map(|p| vec![normalize_plain(&p)])
            }
        };

        let samples = match samples {
            Ok(samples) => samples,
            Err(err) => {
                error!(peer = %self.peer, "{}", err);
                return;
            }
        };

        for sample in samples {
            info!(peer = %self.peer, ?sample, "sensor data");
            if let Err(err) = ingest::write(self.store.as_ref(), sample).await {
                error!(peer = %self.peer, "{}", err);
            }
        }
    }

    /// Run a request/response method.
    pub async fn call(&self, method: TwoWay, params: Value) -> Result<Value, RpcError> {
        // ---
        match method {
            TwoWay::GetData => {
                let req: GetDataParams =
                    parse_params(method.name(), params).map_err(QueryError::from)?;

                let result = query::query(self.store.as_ref(), &req)
                    .await
                    .inspect_err(|err| error!(peer = %self.peer, ?req, "{}", err))?;

                info!(peer = %self.peer, ?req, points = result.data.len(), "get data");

                serde_json::to_value(result).map_err(|e| RpcError {
                    code: CODE_GENERIC,
                    message: e.to_string(),
                })
            }
        }
    }
}
