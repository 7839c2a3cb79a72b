use lorax_bench_lib::{BenchConfig, BenchmarkResult};

use super::{Reporter, mode_name};

#[derive(Debug, Default)]
pub struct HumanReporter;

impl HumanReporter {
    pub fn new() -> Self {
        Self
    }

    pub(super) fn render(config: &BenchConfig, result: &BenchmarkResult) -> Vec<String> {
        let mut lines = Vec::with_capacity(4 + result.per_target.len() + result.failures.len());

        lines.push(format!(
            "mode={} targets={} workers={} budget={} total={} ok={} failed={}",
            mode_name(config),
            config.num_targets(),
            config.num_workers,
            config.total_requests,
            result.total_requests,
            result.succeeded,
            result.failed,
        ));
        lines.push(format!(
            "total_time={:.2?} throughput={:.2} req/s error_rate={:.2}%",
            result.total_time,
            result.throughput,
            result.error_rate() * 100.,
        ));

        let fmt_opt = |d: Option<std::time::Duration>| match d {
            Some(d) => format!("{d:.2?}"),
            None => "-".to_owned(),
        };
        lines.push(format!(
            "latency mean={:.2?} min={} p50={} p90={} p99={} max={}",
            result.mean_latency,
            fmt_opt(result.min_latency),
            fmt_opt(result.p50_latency),
            fmt_opt(result.p90_latency),
            fmt_opt(result.p99_latency),
            fmt_opt(result.max_latency),
        ));

        for target in &result.per_target {
            lines.push(format!(
                "  target={} requests={} failed={} mean={:.2?}",
                target.target, target.requests, target.failed, target.mean_latency,
            ));
        }

        for failure in &result.failures {
            lines.push(format!(
                "  failure worker={} target={} error={}",
                failure.worker, failure.target, failure.error,
            ));
        }

        lines
    }
}

impl Reporter for HumanReporter {
    fn report(&mut self, config: &BenchConfig, result: &BenchmarkResult) {
        for line in Self::render(config, result) {
            println!("{line}");
        }
    }
}
