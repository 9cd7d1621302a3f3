//! Per-request latency breakdown.
//!
//! A [`TimingInfo`] travels from the handler through the repository. Each layer
//! records the components it owns and the handler renders the result into
//! response headers.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Header carrying the full breakdown as a JSON object.
pub const TIMING_JSON_HEADER: &str = "x-timing-json";
/// Header carrying the compact `key=value` breakdown.
pub const TIMING_HEADER: &str = "x-timing";
/// W3C Server-Timing header.
pub const SERVER_TIMING_HEADER: &str = "server-timing";

/// A measured part of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingComponent {
    ConnectionAcquisition,
    QueryExecution,
    DataTransformation,
    RepositoryTotal,
    EndpointProcessing,
    ResponseSerialization,
    Total,
}

impl TimingComponent {
    /// Short name used in `X-Timing` and `Server-Timing`.
    pub fn short_name(self) -> &'static str {
        match self {
            TimingComponent::ConnectionAcquisition => "conn",
            TimingComponent::QueryExecution => "query",
            TimingComponent::DataTransformation => "transform",
            TimingComponent::RepositoryTotal => "repo",
            TimingComponent::EndpointProcessing => "endpoint",
            TimingComponent::ResponseSerialization => "serialize",
            TimingComponent::Total => "total",
        }
    }
}

/// A started clock that reports elapsed milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch(Instant);

impl Stopwatch {
    pub fn start() -> Self {
        Self(Instant::now())
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.0.elapsed().as_secs_f64() * 1000.0
    }
}

/// Millisecond timings for one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingInfo {
    #[serde(default)]
    pub connection_acquisition_ms: f64,
    #[serde(default)]
    pub query_execution_ms: f64,
    #[serde(default)]
    pub data_transformation_ms: f64,
    #[serde(default)]
    pub repository_total_ms: f64,
    #[serde(default)]
    pub endpoint_processing_ms: f64,
    #[serde(default)]
    pub response_serialization_ms: f64,
    #[serde(default)]
    pub total_ms: f64,
}

impl TimingInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the elapsed time of `stopwatch` under `component`.
    pub fn record(&mut self, component: TimingComponent, stopwatch: Stopwatch) {
        self.set(component, stopwatch.elapsed_ms());
    }

    pub fn set(&mut self, component: TimingComponent, ms: f64) {
        *self.slot(component) = ms;
    }

    pub fn get(&self, component: TimingComponent) -> f64 {
        match component {
            TimingComponent::ConnectionAcquisition => self.connection_acquisition_ms,
            TimingComponent::QueryExecution => self.query_execution_ms,
            TimingComponent::DataTransformation => self.data_transformation_ms,
            TimingComponent::RepositoryTotal => self.repository_total_ms,
            TimingComponent::EndpointProcessing => self.endpoint_processing_ms,
            TimingComponent::ResponseSerialization => self.response_serialization_ms,
            TimingComponent::Total => self.total_ms,
        }
    }

    fn slot(&mut self, component: TimingComponent) -> &mut f64 {
        match component {
            TimingComponent::ConnectionAcquisition => &mut self.connection_acquisition_ms,
            TimingComponent::QueryExecution => &mut self.query_execution_ms,
            TimingComponent::DataTransformation => &mut self.data_transformation_ms,
            TimingComponent::RepositoryTotal => &mut self.repository_total_ms,
            TimingComponent::EndpointProcessing => &mut self.endpoint_processing_ms,
            TimingComponent::ResponseSerialization => &mut self.response_serialization_ms,
            TimingComponent::Total => &mut self.total_ms,
        }
    }

    /// Sets `total_ms` and derives `endpoint_processing_ms` as the time spent
    /// outside the repository.
    pub fn finish(&mut self, total_ms: f64) {
        self.total_ms = total_ms;
        self.endpoint_processing_ms = (total_ms - self.repository_total_ms).max(0.0);
    }

    /// All seven fields rounded to two decimals.
    pub fn to_json_map(&self) -> Map<String, Value> {
        let fields = [
            ("connection_acquisition_ms", self.connection_acquisition_ms),
            ("query_execution_ms", self.query_execution_ms),
            ("data_transformation_ms", self.data_transformation_ms),
            ("repository_total_ms", self.repository_total_ms),
            ("endpoint_processing_ms", self.endpoint_processing_ms),
            ("response_serialization_ms", self.response_serialization_ms),
            ("total_ms", self.total_ms),
        ];

        fields
            .into_iter()
            .map(|(key, ms)| (key.to_string(), Value::from(round2(ms))))
            .collect()
    }

    /// Compact form for the `X-Timing` header, e.g. `query=1.20,repo=1.90,total=3.40`.
    pub fn to_header_string(&self) -> String {
        self.present_components()
            .map(|(name, ms)| format!("{name}={ms:.2}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// W3C `Server-Timing` form, e.g. `conn;dur=0.12, total;dur=3.40`.
    pub fn to_server_timing(&self) -> String {
        self.present_components()
            .map(|(name, ms)| format!("{name};dur={ms:.2}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Non-zero components in header order, followed by the total.
    fn present_components(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        const ORDER: [TimingComponent; 6] = [
            TimingComponent::ConnectionAcquisition,
            TimingComponent::QueryExecution,
            TimingComponent::DataTransformation,
            TimingComponent::RepositoryTotal,
            TimingComponent::EndpointProcessing,
            TimingComponent::ResponseSerialization,
        ];

        ORDER
            .into_iter()
            .filter(|c| self.get(*c) > 0.0)
            .chain(std::iter::once(TimingComponent::Total))
            .map(|c| (c.short_name(), self.get(c)))
    }
}

fn round2(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}
