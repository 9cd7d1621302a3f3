//! HTTP client for the todoapi service.

pub mod health;
pub mod todos;

use std::time::Instant;

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use todoapi_core::timing::{TimingInfo, TIMING_JSON_HEADER};

use crate::error::{ClientError, Result};

/// Default server URL when neither `--base-url` nor `TODOAPI_URL` is set.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// A response value with client and server timings.
#[derive(Debug, Clone, Serialize)]
pub struct Timed<T> {
    pub value: T,
    /// Wall time from sending the request to decoding the body.
    pub client_ms: f64,
    /// Breakdown reported by the server in `X-Timing-JSON`.
    pub server: Option<TimingInfo>,
}

impl<T> Timed<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Timed<U> {
        Timed {
            value: f(self.value),
            client_ms: self.client_ms,
            server: self.server,
        }
    }

    /// Client time not accounted for by the server.
    pub fn network_ms(&self) -> Option<f64> {
        self.server
            .map(|server| (self.client_ms - server.total_ms).max(0.0))
    }
}

/// HTTP client for the todoapi service.
#[derive(Debug, Clone)]
pub struct TodoClient {
    client: reqwest::Client,
    base_url: String,
}

impl TodoClient {
    /// Create a new client with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create from environment (TODOAPI_URL or default).
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("TODOAPI_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a URL for an endpoint.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends `request` and decodes a JSON body, timing the round trip.
    async fn send_timed<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Timed<T>> {
        let started = Instant::now();
        let response = request.send().await?;
        let server = parse_server_timing(response.headers());

        let response = check_status(response).await?;
        let value = response.json().await?;

        Ok(Timed {
            value,
            client_ms: elapsed_ms(started),
            server,
        })
    }

    /// Like [`send_timed`](Self::send_timed) for responses without a body.
    async fn send_timed_empty(&self, request: reqwest::RequestBuilder) -> Result<Timed<()>> {
        let started = Instant::now();
        let response = request.send().await?;
        let server = parse_server_timing(response.headers());

        check_status(response).await?;

        Ok(Timed {
            value: (),
            client_ms: elapsed_ms(started),
            server,
        })
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

/// Parses the `X-Timing-JSON` header. Missing or malformed headers give `None`.
pub fn parse_server_timing(headers: &HeaderMap) -> Option<TimingInfo> {
    let value = headers.get(TIMING_JSON_HEADER)?.to_str().ok()?;
    serde_json::from_str(value).ok()
}

/// Turns non-success responses into errors, using the `detail` field of the
/// body when present.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    let message = detail_message(&body);

    if status.as_u16() == 404 {
        Err(ClientError::NotFound { message })
    } else {
        Err(ClientError::ServerError {
            status: status.as_u16(),
            message,
        })
    }
}

fn detail_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
