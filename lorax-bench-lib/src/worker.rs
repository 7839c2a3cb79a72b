use std::time::{Duration, Instant};

use rama::telemetry::tracing;

use crate::{Invoke, TargetId, WorkPool};

/// Outcome of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure { error: String },
}

impl Outcome {
    #[inline(always)]
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// One completed attempt, successful or not.
#[derive(Debug, Clone)]
pub struct Sample {
    pub target: TargetId,
    pub latency: Duration,
    pub outcome: Outcome,
}

/// Samples recorded by a single worker, in completion order.
#[derive(Debug, Clone)]
pub struct LatencyRecord {
    worker: usize,
    samples: Vec<Sample>,
}

impl LatencyRecord {
    pub fn new(worker: usize) -> Self {
        Self {
            worker,
            samples: Vec::new(),
        }
    }

    #[inline(always)]
    pub fn worker(&self) -> usize {
        self.worker
    }

    #[inline(always)]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }
}

/// Drain the pool until it is exhausted.
///
/// The pool lock is only held while claiming,
/// never while the request is in flight.
pub(crate) fn run_worker<I>(worker: usize, pool: &WorkPool, invoker: &I) -> LatencyRecord
where
    I: Invoke + ?Sized,
{
    let mut record = LatencyRecord::new(worker);
    tracing::trace!(worker, "bench worker started");

    while let Some(target) = pool.claim_next() {
        let start = Instant::now();
        let result = invoker.invoke(&target);
        let latency = start.elapsed();

        let outcome = match result {
            Ok(()) => Outcome::Success,
            Err(err) => {
                tracing::debug!(
                    worker,
                    %target,
                    ?latency,
                    "request failed (counted as completed attempt): {err}"
                );
                Outcome::Failure {
                    error: err.to_string(),
                }
            }
        };

        record.push(Sample {
            target,
            latency,
            outcome,
        });
    }

    tracing::trace!(
        worker,
        completed = record.len(),
        "bench worker finished: pool exhausted"
    );
    record
}

#[cfg(test)]
mod tests {
    use rama::error::BoxError;

    use super::*;
    use crate::BenchConfig;

    #[test]
    fn test_worker_records_every_attempt() {
        let pool = WorkPool::new(&BenchConfig::single(4, 1, TargetId::from("a")));
        let calls = std::sync::atomic::AtomicUsize::new(0);

        let invoker = |_: &TargetId| -> Result<(), BoxError> {
            let n = calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if n % 2 == 1 {
                Err(BoxError::from("boom"))
            } else {
                Ok(())
            }
        };

        let record = run_worker(3, &pool, &invoker);
        assert_eq!(record.worker(), 3);
        assert_eq!(record.len(), 4);

        let outcomes: Vec<_> = record
            .samples()
            .iter()
            .map(|sample| sample.outcome.is_success())
            .collect();
        assert_eq!(outcomes, vec![true, false, true, false]);
        assert_eq!(
            record.samples()[1].outcome,
            Outcome::Failure {
                error: "boom".to_owned()
            }
        );
        assert!(pool.is_exhausted());
    }

    #[test]
    fn test_worker_stops_once_pool_is_closed() {
        let pool = WorkPool::new(&BenchConfig::multi(50, 1, TargetId::numbered("t", 5)));

        let invoker = |_: &TargetId| -> Result<(), BoxError> {
            pool.close();
            Ok(())
        };

        let record = run_worker(0, &pool, &invoker);
        assert_eq!(record.len(), 1);
        assert!(pool.is_exhausted());
    }

    #[test]
    fn test_worker_on_exhausted_pool() {
        let pool = WorkPool::new(&BenchConfig::single(0, 1, TargetId::from("a")));
        let invoker = |_: &TargetId| -> Result<(), BoxError> { panic!("must not be called") };

        let record = run_worker(0, &pool, &invoker);
        assert!(record.is_empty());
    }
}
