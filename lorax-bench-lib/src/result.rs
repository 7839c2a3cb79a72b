use std::{collections::BTreeMap, time::Duration};

use crate::{LatencyRecord, Outcome, TargetId};

/// Upper bound on the amount of failures kept (with their error) in a result.
pub const MAX_RECORDED_FAILURES: usize = 32;

/// Aggregated outcome of a benchmark run.
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    /// Wall clock time of the entire run, measured by the orchestrator.
    pub total_time: Duration,
    /// All completed attempts, failures included.
    pub total_requests: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Mean latency over all attempts, failures included.
    pub mean_latency: Duration,
    /// Completed attempts per second of wall clock time.
    pub throughput: f64,
    pub min_latency: Option<Duration>,
    pub max_latency: Option<Duration>,
    pub p50_latency: Option<Duration>,
    pub p90_latency: Option<Duration>,
    pub p99_latency: Option<Duration>,
    /// Sorted by target id.
    pub per_target: Vec<TargetSummary>,
    /// Completed attempts, indexed by worker.
    pub per_worker: Vec<usize>,
    pub failures: Vec<FailureRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetSummary {
    pub target: TargetId,
    pub requests: usize,
    pub failed: usize,
    pub mean_latency: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub worker: usize,
    pub target: TargetId,
    pub error: String,
}

impl BenchmarkResult {
    /// Fold the per-worker records, joined by the orchestrator, into a result.
    pub fn from_records(records: &[LatencyRecord], total_time: Duration) -> Self {
        let total_requests: usize = records.iter().map(LatencyRecord::len).sum();

        let mut latencies = Vec::with_capacity(total_requests);
        let mut succeeded = 0;
        let mut failures = Vec::new();
        let mut per_target: BTreeMap<&TargetId, (usize, usize, Duration)> = BTreeMap::new();

        let mut per_worker = vec![0; records.iter().map(|r| r.worker() + 1).max().unwrap_or(0)];

        for record in records {
            per_worker[record.worker()] += record.len();

            for sample in record.samples() {
                latencies.push(sample.latency);

                let (requests, failed, latency_sum) = per_target.entry(&sample.target).or_default();
                *requests += 1;
                *latency_sum += sample.latency;

                match &sample.outcome {
                    Outcome::Success => succeeded += 1,
                    Outcome::Failure { error } => {
                        *failed += 1;
                        if failures.len() < MAX_RECORDED_FAILURES {
                            failures.push(FailureRecord {
                                worker: record.worker(),
                                target: sample.target.clone(),
                                error: error.clone(),
                            });
                        }
                    }
                }
            }
        }

        let latency_sum: Duration = latencies.iter().sum();
        let mean_latency = mean(latency_sum, total_requests);

        let secs = total_time.as_secs_f64();
        let throughput = if secs > 0. {
            total_requests as f64 / secs
        } else {
            0.
        };

        latencies.sort_unstable();

        Self {
            total_time,
            total_requests,
            succeeded,
            failed: total_requests - succeeded,
            mean_latency,
            throughput,
            min_latency: latencies.first().copied(),
            max_latency: latencies.last().copied(),
            p50_latency: percentile(&latencies, 0.50),
            p90_latency: percentile(&latencies, 0.90),
            p99_latency: percentile(&latencies, 0.99),
            per_target: per_target
                .into_iter()
                .map(|(target, (requests, failed, latency_sum))| TargetSummary {
                    target: target.clone(),
                    requests,
                    failed,
                    mean_latency: mean(latency_sum, requests),
                })
                .collect(),
            per_worker,
            failures,
        }
    }

    /// Ratio of failed attempts, 0 if nothing ran.
    pub fn error_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.
        } else {
            self.failed as f64 / self.total_requests as f64
        }
    }
}

fn mean(sum: Duration, count: usize) -> Duration {
    if count == 0 {
        return Duration::ZERO;
    }
    let nanos = sum.as_nanos() / count as u128;
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// Nearest-rank percentile of the already sorted latencies.
fn percentile(sorted: &[Duration], p: f64) -> Option<Duration> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (p * sorted.len() as f64).ceil() as usize;
    sorted.get(rank.clamp(1, sorted.len()) - 1).copied()
}
