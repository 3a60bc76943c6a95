//! Per-connection session.
//!
//! A session owns one store handle for its whole life: opened on accept,
//! closed exactly once after the socket goes away and every in-flight call
//! has finished. Calls on one connection run concurrently, so replies may
//! leave in a different order than the calls arrived.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use super::dispatcher::Dispatcher;
use super::envelope::{Request, Response};
use crate::store::{SampleStore, StoreConnector};

// ---

/// Outbound reply queue depth per connection.
const REPLY_QUEUE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Store handle open, not yet reading calls.
    Connected,
    /// Reading and dispatching calls.
    Active,
    /// Terminal; no further calls are accepted.
    Disconnected,
}

pub struct Session {
    id: String,
    peer: String,
    store: Arc<dyn SampleStore>,
    state: SessionState,
}

impl Session {
    // ---
    /// Open a session for `peer`, acquiring its store handle.
    pub async fn open(
        connector: &dyn StoreConnector,
        peer: String,
    ) -> Result<Self, crate::error::StoreError> {
        // ---
        let store = connector.open().await?;
        Ok(Self {
            id: Uuid::new_v4().to_string()[..8].to_string(),
            peer,
            store,
            state: SessionState::Connected,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Serve `socket` until the peer disconnects, then release the store.
    pub async fn run(mut self, socket: WebSocket) {
        // ---
        let span = tracing::info_span!("session", id = %self.id, peer = %self.peer);
        async move {
            info!("Connected");
            self.serve(socket).await;
            self.close().await;
            info!("Disconnected");
        }
        .instrument(span)
        .await
    }

    async fn serve(&mut self, socket: WebSocket) {
        // ---
        let (mut ws_tx, mut ws_rx) = socket.split();
        let (tx, mut rx) = mpsc::channel::<Response>(REPLY_QUEUE);

        let writer = tokio::spawn(
            async move {
                while let Some(reply) = rx.recv().await {
                    let json = match serde_json::to_string(&reply) {
                        Ok(json) => json,
                        Err(e) => {
                            error!("Failed to serialize reply: {}", e);
                            continue;
                        }
                    };
                    if ws_tx.send(Message::Text(json.into())).await.is_err() {
                        debug!("WebSocket send failed, dropping replies");
                        break;
                    }
                }
                let _ = ws_tx.close().await;
            }
            .in_current_span(),
        );

        let dispatcher = Arc::new(Dispatcher::new(self.peer.clone(), Arc::clone(&self.store)));
        let mut in_flight = JoinSet::new();
        self.state = SessionState::Active;

        loop {
            tokio::select! {
                frame = ws_rx.next() => {
                    let payload = match frame {
                        Some(Ok(Message::Text(text))) => text.as_str().as_bytes().to_vec(),
                        Some(Ok(Message::Binary(bytes))) => bytes.to_vec(),
                        Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Err(e)) => {
                            warn!("WebSocket error: {}", e);
                            break;
                        }
                    };
                    self.accept(&payload, &dispatcher, &tx, &mut in_flight);
                }
                Some(done) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = done {
                        error!("Call handler failed: {}", e);
                    }
                }
            }
        }

        self.state = SessionState::Disconnected;

        // In-flight calls finish before the store is released.
        while let Some(done) = in_flight.join_next().await {
            if let Err(e) = done {
                error!("Call handler failed: {}", e);
            }
        }

        drop(tx);
        if let Err(e) = writer.await {
            error!("Reply writer failed: {}", e);
        }
    }

    /// Parse one frame and spawn its handler.
    fn accept(
        &self,
        payload: &[u8],
        dispatcher: &Arc<Dispatcher>,
        tx: &mpsc::Sender<Response>,
        in_flight: &mut JoinSet<()>,
    ) {
        // ---
        let req = match Request::parse(payload) {
            Ok(req) => req,
            Err(e) => {
                warn!("Dropping frame: {}", e);
                return;
            }
        };

        let dispatcher = Arc::clone(dispatcher);
        let tx = tx.clone();
        in_flight.spawn(
            async move {
                if let Some(reply) = dispatcher.dispatch(req).await {
                    // The writer is gone only if the socket already closed.
                    let _ = tx.send(reply).await;
                }
            }
            .in_current_span(),
        );
    }

    async fn close(&self) {
        // ---
        self.store.close().await;
        debug!("Store handle released");
    }
}
