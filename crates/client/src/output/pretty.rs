//! Pretty output formatting.

use todoapi_core::timing::TimingInfo;
use todoapi_core::todo::Todo;

use crate::bench::{BenchReport, Stats};
use crate::client::health::HealthStatus;
use crate::client::Timed;

/// Format a TODO for display.
pub fn format_todo(todo: &Todo) -> String {
    let check = if todo.completed { "x" } else { " " };
    let mut output = format!(
        "[{}] {}\n  ID: {}\n  Priority: {}",
        check, todo.title, todo.id, todo.priority
    );
    if let Some(desc) = &todo.description {
        output.push_str(&format!("\n  Description: {}", desc));
    }
    if let Some(due) = &todo.due_date {
        output.push_str(&format!("\n  Due: {}", due.to_rfc3339()));
    }
    if let Some(payload) = &todo.payload {
        output.push_str(&format!("\n  Payload: {} keys", payload.len()));
    }
    output.push_str(&format!(
        "\n  Created: {}\n  Updated: {}",
        todo.created_at.to_rfc3339(),
        todo.updated_at.to_rfc3339()
    ));
    output
}

/// Format TODOs for display.
pub fn format_todos(todos: &[Todo]) -> String {
    if todos.is_empty() {
        return "No TODOs found.".to_string();
    }
    let mut output = format!("TODOS ({})\n", todos.len());
    output.push_str(&"-".repeat(40));
    for todo in todos {
        output.push_str(&format!("\n{}", format_todo(todo)));
        output.push('\n');
    }
    output
}

/// Format the client time and the server breakdown of a request.
pub fn format_timing<T>(timed: &Timed<T>) -> String {
    let mut output = format!("Client: {:.2}ms", timed.client_ms);
    match &timed.server {
        Some(server) => {
            output.push_str(&format!("\nServer: {}", server.to_header_string()));
            if let Some(network) = timed.network_ms() {
                output.push_str(&format!("\nNetwork/overhead: {:.2}ms", network));
            }
        }
        None => output.push_str("\nServer: (no timing headers)"),
    }
    output
}

/// Format a `SELECT 1` result.
pub fn format_select_one(result: i64, timing: &TimingInfo) -> String {
    format!(
        "SELECT 1 -> {}\n  Connection: {:.2}ms\n  Query: {:.2}ms\n  Repository: {:.2}ms\n  Total: {:.2}ms",
        result,
        timing.connection_acquisition_ms,
        timing.query_execution_ms,
        timing.repository_total_ms,
        timing.total_ms
    )
}

pub fn format_health(health: &HealthStatus) -> String {
    let mut output = format!(
        "Status: {}\n  Backend: {}\n  Database: {}",
        health.status, health.backend, health.database
    );
    if let Some(detail) = &health.detail {
        output.push_str(&format!("\n  Detail: {}", detail));
    }
    output
}

fn stats_row(label: &str, stats: &Stats) -> String {
    format!(
        "  {:<10} {:>6} {:>9.2} {:>9.2} {:>9.2} {:>9.2} {:>9.2}",
        label, stats.count, stats.mean, stats.median, stats.p95, stats.min, stats.max
    )
}

/// Format a benchmark report as tables.
pub fn format_bench(report: &BenchReport) -> String {
    let header = format!(
        "  {:<10} {:>6} {:>9} {:>9} {:>9} {:>9} {:>9}",
        "", "count", "mean", "median", "p95", "min", "max"
    );

    let mut output = format!(
        "BENCHMARK ({} workers x {} iterations, payload {} KiB)\n",
        report.config.concurrency, report.config.iterations, report.config.payload_kb
    );
    output.push_str(&"=".repeat(72));

    for op in &report.operations {
        output.push_str(&format!("\n{} (ms)\n{}\n", op.operation.name().to_uppercase(), header));
        output.push_str(&stats_row("client", &op.client));
        for (component, stats) in &op.server {
            output.push('\n');
            output.push_str(&stats_row(component, stats));
        }
        output.push('\n');
    }

    output.push_str(&"=".repeat(72));
    let requests = report.total_requests();
    output.push_str(&format!(
        "\nRequests: {}\nWall time: {:.3}s",
        requests,
        report.wall_ms / 1000.0
    ));
    if report.wall_ms > 0.0 {
        output.push_str(&format!(
            "\nThroughput: {:.1} req/s",
            requests as f64 / (report.wall_ms / 1000.0)
        ));
    }
    output
}
