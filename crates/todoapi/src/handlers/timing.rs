//! Request timing and the response headers that report it.

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};
use serde::Serialize;

use todoapi_core::timing::{
    Stopwatch, TimingComponent, TimingInfo, SERVER_TIMING_HEADER, TIMING_HEADER,
    TIMING_JSON_HEADER,
};

use super::error::ApiError;

/// Times one request from handler entry to the encoded response.
#[derive(Debug)]
pub struct RequestTimer {
    started: Stopwatch,
    /// Passed to the repository, which records its own components.
    pub info: TimingInfo,
}

impl RequestTimer {
    pub fn start() -> Self {
        Self {
            started: Stopwatch::start(),
            info: TimingInfo::new(),
        }
    }

    /// Timing so far, with `total_ms` set to now.
    pub fn snapshot(&self) -> TimingInfo {
        let mut info = self.info;
        info.finish(self.started.elapsed_ms());
        info
    }

    /// Converts `err` into an [`ApiError`] carrying the timing so far.
    pub fn fail(&self, err: impl Into<ApiError>) -> ApiError {
        err.into().with_timing(self.snapshot())
    }

    /// Encodes `body` as JSON and returns it with the timing headers.
    pub fn json<T: Serialize>(mut self, status: StatusCode, body: &T) -> Result<Response, ApiError> {
        let serialize = Stopwatch::start();
        let bytes = serde_json::to_vec(body)
            .map_err(|e| self.fail(ApiError::internal(format!("Failed to encode response: {e}"))))?;
        self.info
            .record(TimingComponent::ResponseSerialization, serialize);

        let mut response = self.respond(status, Body::from(bytes));
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Ok(response)
    }

    /// An empty response with the timing headers.
    pub fn empty(self, status: StatusCode) -> Response {
        self.respond(status, Body::empty())
    }

    fn respond(self, status: StatusCode, body: Body) -> Response {
        let info = self.snapshot();
        tracing::debug!(status = %status, timing = %info.to_header_string(), "Request timing");

        let mut response = Response::new(body);
        *response.status_mut() = status;
        insert_timing_headers(response.headers_mut(), &info);
        response
    }
}

/// Adds `X-Timing-JSON`, `X-Timing` and `Server-Timing`.
pub fn insert_timing_headers(headers: &mut HeaderMap, info: &TimingInfo) {
    let json = serde_json::Value::Object(info.to_json_map()).to_string();
    let values = [
        (TIMING_JSON_HEADER, json),
        (TIMING_HEADER, info.to_header_string()),
        (SERVER_TIMING_HEADER, info.to_server_timing()),
    ];

    for (name, value) in values {
        match HeaderValue::from_str(&value) {
            Ok(value) => {
                headers.insert(name, value);
            }
            Err(e) => tracing::warn!(header = name, error = %e, "Invalid timing header value"),
        }
    }
}
