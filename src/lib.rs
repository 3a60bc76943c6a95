//! Sensor time-series ingestion and query gateway.
//!
//! Devices connect to `/rpc` over a WebSocket, push measurements with the
//! one-way `Sensor.ReportTemp` / `Sensor.Data` calls and read history back
//! with `Sensor.GetData`. Each connection gets its own [`rpc::Session`] with
//! a private store handle.
//!
//! The binary in `main.rs` wires configuration, tracing and the listener;
//! everything else lives here so integration tests can mount the router
//! in-process.
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;

pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod query;
pub mod routes;
pub mod rpc;
pub mod store;
pub mod timestamp;

pub use config::{Config, StoreBackend};
pub use models::{CanonicalSample, DataEntry, GetDataResult};

use store::{MemoryConnector, PgConnector, StoreConnector};

// ---

/// Build the store connector selected by `cfg`.
pub async fn connector(cfg: &Config) -> Result<Arc<dyn StoreConnector>> {
    // ---
    let connector: Arc<dyn StoreConnector> = match &cfg.store {
        StoreBackend::Postgres { db_url } => {
            Arc::new(PgConnector::connect(db_url, cfg.db_pool_max).await?)
        }
        StoreBackend::Memory => Arc::new(MemoryConnector::new()),
    };
    Ok(connector)
}

/// Serve the gateway on `listener` until the process exits.
pub async fn serve(
    listener: TcpListener,
    connector: Arc<dyn StoreConnector>,
    cfg: Config,
) -> Result<()> {
    // ---
    let app = routes::router(connector, cfg);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
