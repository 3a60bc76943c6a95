//! `GET /` placeholder for anyone who opens the gateway in a browser.

use axum::{routing::get, Router};

async fn root() -> &'static str {
    "Nothing to see here, please move along.\r\n"
}

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/", get(root))
}
