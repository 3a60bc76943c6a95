//! `GET /rpc`: upgrades to a WebSocket and runs one [`Session`] on it.

use std::net::SocketAddr;

use axum::{
    extract::{ws::WebSocket, ConnectInfo, State, WebSocketUpgrade},
    http::HeaderMap,
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::error;

use super::AppState;
use crate::rpc::Session;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/rpc", get(handler))
}

async fn handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // ---
    let real_ip = if state.1.trust_real_ip {
        headers.get("x-real-ip").and_then(|v| v.to_str().ok())
    } else {
        None
    };
    let peer = peer_label(addr, real_ip);

    ws.on_upgrade(move |socket| accept(socket, state, peer))
}

async fn accept(socket: WebSocket, (connector, _): AppState, peer: String) {
    // ---
    let session = match Session::open(connector.as_ref(), peer.clone()).await {
        Ok(session) => session,
        Err(e) => {
            // Dropping the socket closes the connection.
            error!("{}: error connecting to store: {}", peer, e);
            return;
        }
    };
    session.run(socket).await;
}

/// Display identity of a peer: its address, plus the proxy-reported real IP.
fn peer_label(addr: SocketAddr, real_ip: Option<&str>) -> String {
    // ---
    match real_ip {
        Some(ip) => format!("{} ({})", addr, ip),
        None => addr.to_string(),
    }
}
