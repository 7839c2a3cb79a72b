use lorax_bench_lib::{BenchConfig, BenchmarkResult};

use super::{Reporter, as_millis_f64, mode_name};

#[derive(Debug, Default)]
pub struct JsonlReporter;

impl JsonlReporter {
    pub fn new() -> Self {
        Self
    }

    pub(super) fn render(config: &BenchConfig, result: &BenchmarkResult) -> Vec<serde_json::Value> {
        let mut lines = Vec::with_capacity(1 + result.per_target.len() + result.failures.len());

        lines.push(serde_json::json!({
            "type": "final",
            "mode": mode_name(config),
            "targets": config.num_targets(),
            "workers": config.num_workers,
            "budget": config.total_requests,
            "total_time_ms": as_millis_f64(result.total_time),
            "throughput": result.throughput,
            "total": {
                "total": result.total_requests,
                "ok": result.succeeded,
                "failed": result.failed,
            },
            "latency_ms": {
                "mean": as_millis_f64(result.mean_latency),
                "min": result.min_latency.map(as_millis_f64),
                "p50": result.p50_latency.map(as_millis_f64),
                "p90": result.p90_latency.map(as_millis_f64),
                "p99": result.p99_latency.map(as_millis_f64),
                "max": result.max_latency.map(as_millis_f64),
            },
            "per_worker": result.per_worker,
        }));

        for target in &result.per_target {
            lines.push(serde_json::json!({
                "type": "target",
                "target": target.target.as_str(),
                "requests": target.requests,
                "failed": target.failed,
                "mean_latency_ms": as_millis_f64(target.mean_latency),
            }));
        }

        for failure in &result.failures {
            lines.push(serde_json::json!({
                "type": "failure",
                "worker": failure.worker,
                "target": failure.target.as_str(),
                "error": failure.error,
            }));
        }

        lines
    }
}

impl Reporter for JsonlReporter {
    fn report(&mut self, config: &BenchConfig, result: &BenchmarkResult) {
        for line in Self::render(config, result) {
            println!("{line}");
        }
    }
}
