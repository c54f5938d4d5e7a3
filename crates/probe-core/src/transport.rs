use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use thiserror::Error;

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
    /// Time until the status line and headers arrived, excluding the body
    /// read. `None` when the transport does not measure it.
    pub time_to_headers: Option<Duration>,
}

/// A GET that did not produce a readable response. `status` is set when the
/// failure happened after a status line was received.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub status: Option<u16>,
    pub message: String,
    /// Set alongside `status` when the headers arrived before the failure.
    pub time_to_headers: Option<Duration>,
}

impl TransportError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            time_to_headers: None,
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
            time_to_headers: None,
        }
    }

    fn after_headers(status: u16, message: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            time_to_headers: Some(elapsed),
            ..Self::with_status(status, message)
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self {
            status: err.status().map(|s| s.as_u16()),
            message: error_chain(&err),
            time_to_headers: None,
        }
    }
}

/// reqwest's Display stops at the outermost layer; the cause (refused,
/// dns, timeout) lives in the source chain.
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + Send + 'a>>;

/// Connection context shared by every request of one phase.
pub trait Transport: Send + Sync {
    fn name(&self) -> &'static str;

    fn get<'a>(&'a self, url: &'a str) -> TransportFuture<'a>;
}

/// Plain GET over a pooled reqwest client. No custom headers, no retries.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    fn get<'a>(&'a self, url: &'a str) -> TransportFuture<'a> {
        Box::pin(fetch(&self.client, url))
    }
}

async fn fetch(client: &reqwest::Client, url: &str) -> Result<TransportResponse, TransportError> {
    let start = Instant::now();
    let response = client.get(url).send().await?;
    let time_to_headers = start.elapsed();

    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let body = response
        .text()
        .await
        .map_err(|e| {
            TransportError::after_headers(status, error_chain(&e), time_to_headers)
        })?;

    Ok(TransportResponse {
        status,
        content_type,
        body,
        time_to_headers: Some(time_to_headers),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::slow_body_server;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_http_transport_reads_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/prod/test"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "ok"})),
            )
            .mount(&server)
            .await;

        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
        let url = format!("{}/prod/test", server.uri());
        let response = transport.get(&url).await.unwrap();

        assert_eq!(response.status, 200);
        assert!(response
            .content_type
            .as_deref()
            .unwrap()
            .starts_with("application/json"));
        assert!(response.body.contains("\"message\""));
        assert!(response.time_to_headers.is_some());
    }

    #[tokio::test]
    async fn test_time_to_headers_excludes_slow_body() {
        let addr = slow_body_server(Duration::from_millis(800));
        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();

        let start = Instant::now();
        let response = transport.get(&format!("http://{addr}/test")).await.unwrap();
        let total = start.elapsed();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "{}");
        assert!(total >= Duration::from_millis(800));
        assert!(response.time_to_headers.unwrap() < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_http_transport_passes_error_statuses_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
        let response = transport.get(&server.uri()).await.unwrap();

        assert_eq!(response.status, 429);
        assert_eq!(response.body, "Too Many Requests");
    }

    #[tokio::test]
    async fn test_http_transport_connection_refused() {
        // Bind then drop to get a port with nothing listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
        let err = transport
            .get(&format!("http://{addr}/test"))
            .await
            .unwrap_err();

        assert_eq!(err.status, None);
        assert!(!err.message.is_empty());
    }

    #[tokio::test]
    async fn test_http_transport_timeout_has_no_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(Duration::from_millis(50)).unwrap();
        let err = transport.get(&server.uri()).await.unwrap_err();

        assert_eq!(err.status, None);
    }
}
