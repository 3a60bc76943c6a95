use std::sync::Arc;

use axum::Router;

use crate::store::StoreConnector;
use crate::Config;

mod health;
mod root;
mod rpc;

// ---

/// State shared by every route: the store connector and the loaded config.
pub type AppState = (Arc<dyn StoreConnector>, Config);

pub fn router(connector: Arc<dyn StoreConnector>, config: Config) -> Router {
    // ---
    Router::new()
        .merge(rpc::router())
        .merge(health::router())
        .merge(root::router())
        .with_state((connector, config))
}
