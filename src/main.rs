//! Application entry point for the `sensorflow-gateway` service.
//!
//! This binary orchestrates the full startup sequence for the sensor RPC
//! gateway, including:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Building the store connector (creating the database schema if needed)
//! - Mounting all routes via the `routes` gateway (EMBP pattern)
//! - Binding the listener and serving WebSocket sessions
//!
//! # Environment Variables
//! - `DATABASE_URL` (**required** for postgres) – PostgreSQL connection string
//! - `STORE_BACKEND` (optional) – `postgres` or `memory` (default: postgres)
//! - `LISTEN_ADDR` (optional) – bind address (default: 127.0.0.1:8910)
//! - `GATEWAY_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `GATEWAY_SPAN_EVENTS` (optional) – span event mode for tracing
use std::env;

use dotenvy::dotenv;
use is_terminal::IsTerminal;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use anyhow::Result;

use sensorflow_gateway::config;

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let connector = sensorflow_gateway::connector(&cfg).await?;
    tracing::info!("Store backend: {}", connector.backend());

    let listener = tokio::net::TcpListener::bind(cfg.listen_addr).await?;
    tracing::info!("Serving at {}", cfg.listen_addr);

    sensorflow_gateway::serve(listener, connector, cfg).await
}

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `GATEWAY_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by `RUST_LOG`, else the `GATEWAY_LOG_LEVEL` env var
///
/// Call once at startup, before any logging macros are invoked.
fn init_tracing() {
    // ---
    let span_events = match env::var("GATEWAY_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("GATEWAY_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},sqlx::query=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
