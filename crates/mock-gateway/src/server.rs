use crate::bucket::TokenBucket;
use crate::config::GatewayConfig;
use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::header::HeaderName;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::net::TcpListener;
use tracing::debug;

static RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
static RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");

#[derive(Clone)]
struct GatewayState {
    bucket: Arc<Mutex<TokenBucket>>,
}

impl GatewayState {
    /// (admitted, tokens left, capacity)
    fn admit(&self) -> (bool, u64, u64) {
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        let admitted = bucket.try_acquire();
        (admitted, bucket.remaining(), bucket.capacity())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HelloResponse {
    message: &'static str,
    timestamp: String,
    request_id: String,
}

#[derive(Serialize)]
struct ThrottledResponse {
    status: u16,
    message: &'static str,
}

pub fn router(config: &GatewayConfig) -> Router {
    let state = GatewayState {
        bucket: Arc::new(Mutex::new(TokenBucket::new(
            config.rate_per_sec,
            config.burst,
        ))),
    };

    Router::new()
        .route(&config.route, get(hello))
        .with_state(state)
}

async fn hello(State(state): State<GatewayState>) -> Response {
    let (admitted, remaining, limit) = state.admit();

    let mut response = if admitted {
        Json(HelloResponse {
            message: "Hello from Lambda!",
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id: uuid::Uuid::new_v4().simple().to_string(),
        })
        .into_response()
    } else {
        debug!("Throttled request, bucket empty");
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ThrottledResponse {
                status: StatusCode::TOO_MANY_REQUESTS.as_u16(),
                message: "Too many requests, please try again later.",
            }),
        )
            .into_response()
    };

    let headers = response.headers_mut();
    headers.insert(&RATELIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(&RATELIMIT_REMAINING, HeaderValue::from(remaining));
    response
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, config: GatewayConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(&config))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Gateway server failed")
}
