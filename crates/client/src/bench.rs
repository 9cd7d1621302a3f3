//! CRUD latency benchmark.
//!
//! Each worker repeats create, read, update, list and delete against the
//! server. Client wall time and the server's timing breakdown are collected
//! per operation and summarized.

use std::collections::BTreeMap;
use std::time::Instant;

use futures_util::future::join_all;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::Serialize;

use todoapi_core::timing::{TimingComponent, TimingInfo};
use todoapi_core::todo::{CreateTodoRequest, Payload, Priority, TodoFilter, UpdateTodoRequest};

use crate::client::{Timed, TodoClient};
use crate::error::{ClientError, Result};

/// Server components reported in the breakdown, in header order.
const COMPONENTS: [TimingComponent; 7] = [
    TimingComponent::ConnectionAcquisition,
    TimingComponent::QueryExecution,
    TimingComponent::DataTransformation,
    TimingComponent::RepositoryTotal,
    TimingComponent::EndpointProcessing,
    TimingComponent::ResponseSerialization,
    TimingComponent::Total,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    List,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Create,
        Operation::Read,
        Operation::Update,
        Operation::List,
        Operation::Delete,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::List => "list",
            Operation::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BenchConfig {
    /// CRUD cycles per worker.
    pub iterations: usize,
    /// Concurrent workers.
    pub concurrency: usize,
    /// Minimum payload size in KiB. Zero sends no payload.
    pub payload_kb: usize,
}

impl BenchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(ClientError::InvalidInput(
                "iterations must be at least 1".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(ClientError::InvalidInput(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// One timed request.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub operation: Operation,
    pub client_ms: f64,
    pub server: Option<TimingInfo>,
}

impl Sample {
    fn from_timed<T>(operation: Operation, timed: &Timed<T>) -> Self {
        Self {
            operation,
            client_ms: timed.client_ms,
            server: timed.server,
        }
    }
}

/// Summary statistics in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub p95: f64,
    pub min: f64,
    pub max: f64,
}

impl Stats {
    /// Returns `None` for an empty slice.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let median = if count % 2 == 0 {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        } else {
            sorted[count / 2]
        };

        Some(Self {
            count,
            mean,
            median,
            p95: percentile(&sorted, 95.0),
            min: sorted[0],
            max: sorted[count - 1],
        })
    }
}

/// Nearest-rank percentile of sorted values.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    let rank = ((pct / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationReport {
    pub operation: Operation,
    pub client: Stats,
    /// Server-side stats keyed by component short name.
    pub server: BTreeMap<&'static str, Stats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    pub config: BenchConfig,
    pub wall_ms: f64,
    pub operations: Vec<OperationReport>,
}

impl BenchReport {
    pub fn total_requests(&self) -> usize {
        self.operations.iter().map(|op| op.client.count).sum()
    }
}

/// Summarizes samples per operation.
pub fn summarize(config: BenchConfig, wall_ms: f64, samples: &[Sample]) -> BenchReport {
    let operations = Operation::ALL
        .into_iter()
        .filter_map(|operation| {
            let of_op: Vec<&Sample> = samples.iter().filter(|s| s.operation == operation).collect();
            let client_values: Vec<f64> = of_op.iter().map(|s| s.client_ms).collect();
            let client = Stats::from_values(&client_values)?;

            let server = COMPONENTS
                .into_iter()
                .filter_map(|component| {
                    let values: Vec<f64> = of_op
                        .iter()
                        .filter_map(|s| s.server.map(|t| t.get(component)))
                        .collect();
                    Stats::from_values(&values).map(|stats| (component.short_name(), stats))
                })
                .collect();

            Some(OperationReport {
                operation,
                client,
                server,
            })
        })
        .collect();

    BenchReport {
        config,
        wall_ms,
        operations,
    }
}

/// A JSON object whose serialized size is at least `kb` KiB.
pub fn generate_payload(kb: usize) -> Payload {
    let data: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(kb * 1024)
        .map(char::from)
        .collect();

    let mut payload = Payload::new();
    payload.insert("kind".to_string(), "bench".into());
    payload.insert("size_kb".to_string(), kb.into());
    payload.insert("data".to_string(), data.into());
    payload
}

/// Runs the benchmark and returns the summarized report.
pub async fn run(client: &TodoClient, config: BenchConfig) -> Result<BenchReport> {
    config.validate()?;

    let payload = (config.payload_kb > 0).then(|| generate_payload(config.payload_kb));

    let started = Instant::now();
    let workers = (0..config.concurrency)
        .map(|worker| run_worker(client, worker, config.iterations, payload.as_ref()));
    let results = join_all(workers).await;
    let wall_ms = started.elapsed().as_secs_f64() * 1000.0;

    let mut samples = Vec::with_capacity(config.concurrency * config.iterations * 5);
    for result in results {
        samples.extend(result?);
    }

    Ok(summarize(config, wall_ms, &samples))
}

async fn run_worker(
    client: &TodoClient,
    worker: usize,
    iterations: usize,
    payload: Option<&Payload>,
) -> Result<Vec<Sample>> {
    let mut samples = Vec::with_capacity(iterations * 5);

    for i in 0..iterations {
        let mut request = CreateTodoRequest::new(format!("Latency test {worker}-{i}"))
            .with_priority(Priority::High);
        if let Some(payload) = payload {
            request = request.with_payload(payload.clone());
        }

        let created = client.create_todo_timed(&request).await?;
        samples.push(Sample::from_timed(Operation::Create, &created));
        let id = created.value.id;

        let read = client.get_todo_timed(id).await?;
        samples.push(Sample::from_timed(Operation::Read, &read));

        let update = UpdateTodoRequest {
            title: Some(format!("Updated {worker}-{i}")),
            priority: Some(Priority::ALL[i % Priority::ALL.len()]),
            ..Default::default()
        };
        let updated = client.update_todo_timed(id, &update).await?;
        samples.push(Sample::from_timed(Operation::Update, &updated));

        let listed = client.list_todos_timed(&TodoFilter::default()).await?;
        samples.push(Sample::from_timed(Operation::List, &listed));

        let deleted = client.delete_todo_timed(id).await?;
        samples.push(Sample::from_timed(Operation::Delete, &deleted));
    }

    Ok(samples)
}
