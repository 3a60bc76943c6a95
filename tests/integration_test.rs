use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use sensorflow_gateway::error::StoreError;
use sensorflow_gateway::models::DataPoint;
use sensorflow_gateway::store::{
    MemoryConnector, NewRow, RangeScan, SampleStore, StoreConnector,
};
use sensorflow_gateway::Config;

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ---

/// Boot the gateway on an ephemeral port with the in-memory backend.
async fn spawn_gateway() -> Result<String> {
    spawn_gateway_with(Arc::new(MemoryConnector::new())).await
}

async fn spawn_gateway_with(connector: Arc<dyn StoreConnector>) -> Result<String> {
    // ---
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let cfg = Config {
        listen_addr: addr,
        ..Config::default()
    };
    tokio::spawn(sensorflow_gateway::serve(listener, connector, cfg));
    Ok(format!("{}", addr))
}

async fn connect(addr: &str) -> Result<Ws> {
    let (ws, _) = connect_async(format!("ws://{}/rpc", addr)).await?;
    Ok(ws)
}

async fn send(ws: &mut Ws, frame: Value) -> Result<()> {
    ws.send(Message::text(frame.to_string())).await?;
    Ok(())
}

/// Next text frame as JSON, failing after a short timeout.
async fn recv(ws: &mut Ws) -> Result<Value> {
    // ---
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await?
            .ok_or_else(|| anyhow!("socket closed"))??;
        if let Message::Text(text) = msg {
            return Ok(serde_json::from_str(text.as_str())?);
        }
    }
}

/// Query until `expected` points are visible; one-way writes race queries.
async fn get_data_until(ws: &mut Ws, params: Value, expected: usize) -> Result<Value> {
    // ---
    for attempt in 0..50 {
        send(ws, json!({"id": attempt, "method": "Sensor.GetData", "params": params.clone()})).await?;
        let reply = recv(ws).await?;
        assert_eq!(reply["id"], json!(attempt));
        if reply["result"]["data"].as_array().map_or(0, Vec::len) >= expected {
            return Ok(reply);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    Err(anyhow!("data never reached {} points", expected))
}

#[tokio::test]
async fn health_and_root_respond() -> Result<()> {
    // ---
    let addr = spawn_gateway().await?;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(format!("http://{}/health", addr))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(health, json!({"status": "ok", "store": "memory"}));

    let root = client
        .get(format!("http://{}/", addr))
        .send()
        .await?
        .text()
        .await?;
    assert_eq!(root, "Nothing to see here, please move along.\r\n");

    Ok(())
}

#[tokio::test]
async fn ingest_then_query_over_websocket() -> Result<()> {
    // ---
    let addr = spawn_gateway().await?;
    let mut ws = connect(&addr).await?;

    for i in 0..3 {
        send(
            &mut ws,
            json!({
                "id": 100 + i,
                "method": "Sensor.Data",
                "params": {"sid": 1, "subid": 0, "ts": 1_600_000_000.0 + i as f64, "v": i as f64}
            }),
        )
        .await?;
    }
    send(
        &mut ws,
        json!({
            "id": 200,
            "method": "Sensor.ReportTemp",
            "params": {"sid": 2, "ts": 1_600_000_000.5, "temp": 21.5, "rh": 40.0}
        }),
    )
    .await?;

    let reply = get_data_until(&mut ws, json!({"sid": 1, "subid": 0}), 3).await?;
    assert_eq!(
        reply["result"]["data"],
        json!([
            {"ts": 1600000000.0, "v": 0.0},
            {"ts": 1600000001.0, "v": 1.0},
            {"ts": 1600000002.0, "v": 2.0}
        ])
    );

    let window = json!({"sid": 1, "subid": 0, "ts_from": 1600000001.0, "ts_to": 1600000002.0});
    let reply = get_data_until(&mut ws, window, 1).await?;
    assert_eq!(reply["result"]["data"], json!([{"ts": 1600000001.0, "v": 1.0}]));

    let humidity = get_data_until(&mut ws, json!({"sid": 2, "subid": 1}), 1).await?;
    assert_eq!(
        humidity["result"]["data"],
        json!([{"ts": 1600000000.5, "v": 40.0}])
    );

    Ok(())
}

#[tokio::test]
async fn data_is_visible_to_other_sessions() -> Result<()> {
    // ---
    let addr = spawn_gateway().await?;
    let mut writer = connect(&addr).await?;
    send(
        &mut writer,
        json!({"id": 1, "method": "MyHome.Data.Add", "params": {"sid": 5, "v": 7.5}}),
    )
    .await?;

    let mut reader = connect(&addr).await?;
    let reply = get_data_until(&mut reader, json!({"sid": 5, "subid": 0}), 1).await?;
    assert_eq!(reply["result"]["data"][0]["v"], json!(7.5));

    Ok(())
}

#[tokio::test]
async fn unknown_method_gets_error_reply() -> Result<()> {
    // ---
    let addr = spawn_gateway().await?;
    let mut ws = connect(&addr).await?;

    send(&mut ws, json!({"id": "abc", "method": "Sensor.Reboot", "params": {}})).await?;
    let reply = recv(&mut ws).await?;
    assert_eq!(
        reply,
        json!({"id": "abc", "error": {"code": -32601, "message": "Method not found"}})
    );

    Ok(())
}

#[tokio::test]
async fn malformed_calls_do_not_end_the_session() -> Result<()> {
    // ---
    let addr = spawn_gateway().await?;
    let mut ws = connect(&addr).await?;

    ws.send(Message::text("{not json")).await?;
    send(
        &mut ws,
        json!({"id": 1, "method": "Sensor.Data", "params": {"sid": "x", "v": 1.0}}),
    )
    .await?;
    send(
        &mut ws,
        json!({"id": 2, "method": "Sensor.Data", "params": {"sid": 9, "v": 3.0}}),
    )
    .await?;

    // Neither malformed call replied, so the first frame back is the query's.
    let reply = get_data_until(&mut ws, json!({"sid": 9}), 1).await?;
    assert_eq!(reply["result"]["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(reply["result"]["data"][0]["v"], json!(3.0));

    Ok(())
}

/// Store whose inserts panic; counts how often handles are opened and closed.
#[derive(Default)]
struct PanickingConnector {
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

struct PanickingStore {
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl StoreConnector for PanickingConnector {
    async fn open(&self) -> Result<Arc<dyn SampleStore>, StoreError> {
        // ---
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(PanickingStore {
            closes: Arc::clone(&self.closes),
        }))
    }

    fn backend(&self) -> &'static str {
        "panicking"
    }
}

#[async_trait]
impl SampleStore for PanickingStore {
    async fn insert(&self, _row: NewRow) -> Result<(), StoreError> {
        panic!("insert blew up")
    }

    async fn select_range(&self, _scan: &RangeScan) -> Result<Vec<DataPoint>, StoreError> {
        Ok(Vec::new())
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn store_released_once_after_handler_panic() -> Result<()> {
    // ---
    let connector = Arc::new(PanickingConnector::default());
    let opens = Arc::clone(&connector.opens);
    let closes = Arc::clone(&connector.closes);
    let addr = spawn_gateway_with(connector).await?;
    let mut ws = connect(&addr).await?;

    send(
        &mut ws,
        json!({"id": 1, "method": "Sensor.Data", "params": {"sid": 1, "v": 1.0}}),
    )
    .await?;

    // The panicking call does not take the session down.
    send(&mut ws, json!({"id": 2, "method": "Sensor.GetData", "params": {"sid": 1}})).await?;
    let reply = recv(&mut ws).await?;
    assert_eq!(reply, json!({"id": 2, "result": {"data": []}}));
    assert_eq!(closes.load(Ordering::SeqCst), 0);

    ws.close(None).await?;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while closes.load(Ordering::SeqCst) == 0 {
        assert!(tokio::time::Instant::now() < deadline, "store never closed");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(opens.load(Ordering::SeqCst), 1);
    assert_eq!(closes.load(Ordering::SeqCst), 1);

    Ok(())
}
